// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core identifier and value types shared across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe entity identifier
///
/// Identifies one entity within a model. Ids are model-scoped and never
/// reused after deletion.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Type-safe schema type identifier
///
/// Index into a [`SchemaRegistry`](crate::SchemaRegistry) type table.
/// Supertypes are always registered before their subtypes, so the ordering
/// of ids follows the inheritance tree top-down.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(id: u32) -> Self {
        TypeId(id)
    }
}

/// Runtime property value
///
/// Covers every category a property slot can hold: value types, entity
/// references, and collections. Collections preserve insertion order and
/// may nest one level deep (a list of lists).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Default)]
pub enum Value {
    /// Unset / optional-absent
    #[default]
    Null,
    /// Floating point number
    Number(f64),
    /// Integer number
    Integer(i64),
    /// Boolean
    Boolean(bool),
    /// Text
    Text(String),
    /// Enumeration literal
    Enum(String),
    /// Reference to another entity in the same model
    Ref(EntityId),
    /// Ordered collection of values
    List(Vec<Value>),
}

impl Value {
    /// Check whether the value is unset
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the referenced entity id, if this is a reference
    pub fn as_ref_id(&self) -> Option<EntityId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Get the numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get the text, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list elements, if this is a collection
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the list elements mutably, if this is a collection
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for value-category contents: anything that is neither an entity
    /// reference nor a collection.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, Value::Ref(_) | Value::List(_))
    }

    /// Short category name for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Text(_) => "text",
            Value::Enum(_) => "enum",
            Value::Ref(_) => "reference",
            Value::List(_) => "list",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Ref(id)
    }
}
