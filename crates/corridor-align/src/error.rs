// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for alignment and placement processing

use corridor_model::ModelError;
use thiserror::Error;

/// Alignment processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Alignment processing errors
///
/// A projection that finds no segment is not an error here; it is the soft
/// `Projection::Miss` outcome, logged and skipped by callers.
#[derive(Error, Debug)]
pub enum Error {
    /// Alignment segment geometry other than a straight line
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Polylines do not chain into one continuous path
    #[error("Discontinuous curve: {0}")]
    DiscontinuousCurve(String),

    /// Placement store failure
    #[error("Placement error: {0}")]
    Placement(String),

    /// Underlying model error
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl Error {
    /// Create an unsupported geometry error
    pub fn unsupported_geometry(msg: impl Into<String>) -> Self {
        Error::UnsupportedGeometry(msg.into())
    }

    /// Create a discontinuous curve error
    pub fn discontinuous_curve(msg: impl Into<String>) -> Self {
        Error::DiscontinuousCurve(msg.into())
    }

    /// Create a placement error
    pub fn placement(msg: impl Into<String>) -> Self {
        Error::Placement(msg.into())
    }
}
