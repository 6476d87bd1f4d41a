// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for copy, substitution and reclassification

use corridor_model::ModelError;
use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the graph substitution subsystem
///
/// Per-property incompatibilities during substitution are recovered (logged
/// and left unset), so they never appear here; these variants are fatal to
/// the one operation that raised them.
#[derive(Error, Debug)]
pub enum Error {
    /// Types share no common ancestor, or a copied collection element does
    /// not fit a recognized category
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Replacement across model boundaries
    #[error("Cross-model operation: {0}")]
    CrossModel(String),

    /// Underlying model error
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl Error {
    /// Create a schema mismatch error
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Error::SchemaMismatch(msg.into())
    }

    /// Create a cross-model error
    pub fn cross_model(msg: impl Into<String>) -> Self {
        Error::CrossModel(msg.into())
    }
}
