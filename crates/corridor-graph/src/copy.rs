// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shallow copy - build an entity of a new type from a compatible entity
//!
//! The copy is taken at the level of the common ancestor of the source type
//! and the requested target type: every settable slot the two types share is
//! carried over. Scalars and references are assigned as-is (a reference copy
//! is an id copy, never a deep clone); collections are copied element-wise,
//! one nested level deep. Exactly one new entity is allocated, through the
//! model factory so configured defaults apply; the source is never mutated.

use crate::{Error, Result};
use corridor_model::{EntityId, Model, TypeId, Value};

/// Insert a shallow copy of `source` as a new entity of `target` type
///
/// Fails with [`Error::SchemaMismatch`] if the two types share no common
/// ancestor, or if a collection element does not fit a recognized category
/// (value-like, entity reference, or a one-level nested list of those).
pub fn shallow_copy(model: &mut Model, source: EntityId, target: TypeId) -> Result<EntityId> {
    let registry = model.registry().clone();
    let entity = model.require_entity(source)?;
    let source_ty = entity.type_id();

    let ancestor = registry.common_ancestor(source_ty, target).ok_or_else(|| {
        Error::schema_mismatch(format!(
            "no common ancestor between {} and {}",
            registry.type_name(source_ty),
            registry.type_name(target),
        ))
    })?;

    // Shared slots are the flattened prefix up to the ancestor's slot count,
    // so iterating the ancestor's own slot list visits exactly them.
    let shared = registry.slots(ancestor).len();
    let mut copied: Vec<(usize, Value)> = Vec::with_capacity(shared);
    for (slot, meta) in registry.slots(ancestor).iter().enumerate() {
        if !meta.def.is_settable() {
            continue;
        }
        match entity.value(slot) {
            Value::Null => {}
            Value::List(items) => copied.push((slot, copy_collection(items)?)),
            other => copied.push((slot, other.clone())),
        }
    }

    let id = model.new_entity(target);
    let copy = model
        .entity_mut(id)
        .ok_or(corridor_model::ModelError::EntityNotFound(id))?;
    for (slot, value) in copied {
        copy.set_value(slot, value);
    }
    Ok(id)
}

fn copy_collection(items: &[Value]) -> Result<Value> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::List(inner) => {
                let mut nested = Vec::with_capacity(inner.len());
                for element in inner {
                    if element.is_value_type() || element.as_ref_id().is_some() {
                        nested.push(element.clone());
                    } else {
                        return Err(Error::schema_mismatch(format!(
                            "unexpected nested collection element category: {}",
                            element.category()
                        )));
                    }
                }
                out.push(Value::List(nested));
            }
            other => out.push(other.clone()),
        }
    }
    Ok(Value::List(out))
}
