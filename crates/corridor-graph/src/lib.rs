// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Corridor Graph - Schema-driven entity substitution
//!
//! Type reclassification over an arbitrarily large cross-referenced entity
//! graph, with the guarantee that no reference is left dangling. Built on
//! the schema and model store from `corridor-model`.
//!
//! ## Overview
//!
//! - **Reference index**: which types can reference a given target type,
//!   cached per exact type for the lifetime of the index
//! - **Shallow copy**: build an entity of a new type from a compatible
//!   entity, copying at the common-ancestor level
//! - **Substitution engine**: repoint every reference to replaced entities,
//!   one entity or a whole batch in a single scan
//! - **Reclassification driver**: copy + substitute + delete for a matched
//!   group and its shared type-definition objects
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corridor_graph::{shallow_copy, replace_one, ReferenceIndex};
//!
//! let index = ReferenceIndex::new(model.registry().clone());
//! let new = shallow_copy(&mut model, old, rail_element)?;
//! replace_one(&mut model, &index, old, Some(new))?;
//! model.delete(old);
//! ```

pub mod copy;
pub mod engine;
pub mod error;
pub mod index;
pub mod reclassify;

pub use copy::shallow_copy;
pub use engine::{apply_replacements, replace_many, replace_one};
pub use error::{Error, Result};
pub use index::{ReferenceIndex, ReferringType};
pub use reclassify::{reclassify, EntitySetup, ReclassOutcome, ReclassRule, TypeRelation};
