// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model and schema operations

use crate::EntityId;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by the schema registry and the model store
#[derive(Error, Debug)]
pub enum ModelError {
    /// Entity not present in this model
    #[error("Entity {0} not found in this model")]
    EntityNotFound(EntityId),

    /// Named type is not declared in the schema
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Named property is not declared on the type or its ancestors
    #[error("Unknown property {property} on type {type_name}")]
    UnknownProperty { type_name: String, property: String },

    /// Attempt to write a derived or inverse property slot
    #[error("Property {property} on type {type_name} is derived or inverse and cannot be set")]
    NotSettable { type_name: String, property: String },
}

impl ModelError {
    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        ModelError::UnknownType(name.into())
    }

    /// Create an unknown property error
    pub fn unknown_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        ModelError::UnknownProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }
}
