// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Corridor Model - Schema registry and entity model
//!
//! This crate provides the shared data layer for the corridor workspace: an
//! EXPRESS-style schema (a single-inheritance type tree with typed property
//! descriptors) and an in-memory model store of cross-referenced entities.
//!
//! # Architecture
//!
//! - [`SchemaRegistry`] / [`SchemaBuilder`] - immutable type hierarchy and
//!   per-type flattened property slots
//! - [`Model`] - entity store: create, delete, enumerate by type including
//!   subtypes
//! - [`Value`] - runtime property values (scalars, references, one-level
//!   nested collections)
//! - [`EntityDefaults`] - explicit default-attribute configuration applied
//!   by the entity factory
//!
//! The substitution engine (`corridor-graph`) and the placement tooling
//! (`corridor-align`) consume these types; this crate has no geometry or
//! traversal logic of its own.

pub mod error;
pub mod model;
pub mod schema;
pub mod types;

pub use error::{ModelError, Result};
pub use model::{Entity, EntityDefaults, Model};
pub use schema::{PropertyDef, PropertyKind, PropertySlot, SchemaBuilder, SchemaRegistry, TypeDef};
pub use types::{EntityId, TypeId, Value};
