// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model store - typed entities with slot-indexed property values
//!
//! The model owns its entities and exposes the store operations the graph
//! and alignment crates build on: create an entity of a type, delete an
//! entity, enumerate all entities of a declared type including subtypes.
//! Substitution mutates the model in place; deletion of replaced entities is
//! always the caller's responsibility.

use crate::{EntityId, ModelError, Result, SchemaRegistry, TypeId, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One typed, model-scoped entity
///
/// Property values are indexed by the flattened slot list of the entity's
/// type (see [`SchemaRegistry::slots`]).
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    type_id: TypeId,
    values: Vec<Value>,
}

impl Entity {
    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Concrete type of the entity
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Value at a slot index
    pub fn value(&self, slot: usize) -> &Value {
        &self.values[slot]
    }

    /// Mutable value at a slot index
    pub fn value_mut(&mut self, slot: usize) -> &mut Value {
        &mut self.values[slot]
    }

    /// Set the value at a slot index
    pub fn set_value(&mut self, slot: usize, value: Value) {
        self.values[slot] = value;
    }

    /// All slot values in slot order
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Default attribute values applied by the entity factory
///
/// An explicit replacement for hidden entity-created hooks: each named
/// property is set at construction on every new entity whose type declares
/// a settable slot with that name.
#[derive(Clone, Debug, Default)]
pub struct EntityDefaults {
    values: Vec<(String, Value)>,
}

impl EntityDefaults {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default value for a named property
    pub fn with(mut self, property: impl Into<String>, value: Value) -> Self {
        self.values.push((property.into(), value));
        self
    }

    /// Configured (property, value) pairs
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }
}

/// In-memory entity store bound to one schema registry
pub struct Model {
    registry: Arc<SchemaRegistry>,
    entities: BTreeMap<EntityId, Entity>,
    defaults: EntityDefaults,
    next_id: u32,
}

impl Model {
    /// Create an empty model over a schema
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_defaults(registry, EntityDefaults::default())
    }

    /// Create an empty model with a default-attributes configuration
    pub fn with_defaults(registry: Arc<SchemaRegistry>, defaults: EntityDefaults) -> Self {
        Self {
            registry,
            entities: BTreeMap::new(),
            defaults,
            next_id: 1,
        }
    }

    /// The schema this model is bound to
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Create a new entity of a type, applying configured defaults
    pub fn new_entity(&mut self, ty: TypeId) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let slots = self.registry.slots(ty);
        let mut values = vec![Value::Null; slots.len()];
        for (name, value) in self.defaults.values() {
            if let Some(i) = slots
                .iter()
                .position(|s| s.def.is_settable() && s.def.name == *name)
            {
                values[i] = value.clone();
            }
        }

        self.entities.insert(
            id,
            Entity {
                id,
                type_id: ty,
                values,
            },
        );
        id
    }

    /// Delete an entity, returning it if it existed
    ///
    /// Deleting does not touch references held elsewhere; run substitution
    /// first to keep the graph free of dangling references.
    pub fn delete(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Check whether an entity belongs to this model
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Get an entity or fail with `EntityNotFound`
    pub fn require_entity(&self, id: EntityId) -> Result<&Entity> {
        self.entity(id).ok_or(ModelError::EntityNotFound(id))
    }

    /// Concrete type of an entity
    pub fn type_of(&self, id: EntityId) -> Option<TypeId> {
        self.entities.get(&id).map(|e| e.type_id)
    }

    /// Ids of all entities of a declared type, including subtypes
    ///
    /// Collected into a vector so callers can mutate entities while
    /// iterating the result.
    pub fn entities_of_kind(&self, ty: TypeId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| self.registry.is_assignable(ty, e.type_id))
            .map(|e| e.id)
            .collect()
    }

    /// All entity ids in ascending order
    pub fn all_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Total entity count
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read a property by name
    pub fn value_by_name(&self, id: EntityId, property: &str) -> Result<&Value> {
        let entity = self.require_entity(id)?;
        let slot = self.registry.require_slot(entity.type_id, property)?;
        Ok(entity.value(slot))
    }

    /// Write a settable property by name
    pub fn set_by_name(&mut self, id: EntityId, property: &str, value: Value) -> Result<()> {
        let ty = self
            .type_of(id)
            .ok_or(ModelError::EntityNotFound(id))?;
        let slot = self.registry.require_slot(ty, property)?;
        if !self.registry.slots(ty)[slot].def.is_settable() {
            return Err(ModelError::NotSettable {
                type_name: self.registry.type_name(ty).to_string(),
                property: property.to_string(),
            });
        }
        if let Some(entity) = self.entity_mut(id) {
            entity.set_value(slot, value);
        }
        Ok(())
    }
}
