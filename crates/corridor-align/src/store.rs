// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model-backed placement store
//!
//! Binds the [`PlacementStore`] seam to an entity [`Model`]. The placement
//! vocabulary is resolved once from the schema by name: an `Element` carries
//! an `ObjectPlacement` reference, a `Placement` chains to its parent via
//! `PlacementRelTo`, a `LocalPlacement` carries a `RelativeTransform` as a
//! list of 16 column-major numbers, and a `LinearPlacement` carries the
//! curve-relative attributes.

use crate::placement::{LinearPlacement, PlacementKind, PlacementStore};
use crate::{Error, Result};
use corridor_model::{EntityId, Model, SchemaRegistry, TypeId, Value};
use nalgebra::{Matrix4, Vector3};

/// Resolved type ids and slot indices of the placement vocabulary
#[derive(Clone, Copy, Debug)]
pub struct PlacementSchema {
    /// Base type of placeable elements
    pub element: TypeId,
    /// Base type of all placements
    pub placement: TypeId,
    /// Local (transform-chained) placement type
    pub local: TypeId,
    /// Curve-relative placement type
    pub linear: TypeId,
    object_placement: usize,
    placement_rel_to: usize,
    relative_transform: usize,
    alignment: usize,
    distance_along: usize,
    offset_lateral: usize,
    offset_vertical: usize,
    vertical_axis: usize,
    lateral_axis: usize,
}

impl PlacementSchema {
    /// Resolve the vocabulary against a schema registry
    pub fn resolve(registry: &SchemaRegistry) -> Result<Self> {
        let element = registry.require_type("Element")?;
        let placement = registry.require_type("Placement")?;
        let local = registry.require_type("LocalPlacement")?;
        let linear = registry.require_type("LinearPlacement")?;
        Ok(Self {
            element,
            placement,
            local,
            linear,
            object_placement: registry.require_slot(element, "ObjectPlacement")?,
            placement_rel_to: registry.require_slot(placement, "PlacementRelTo")?,
            relative_transform: registry.require_slot(local, "RelativeTransform")?,
            alignment: registry.require_slot(linear, "Alignment")?,
            distance_along: registry.require_slot(linear, "DistanceAlong")?,
            offset_lateral: registry.require_slot(linear, "OffsetLateral")?,
            offset_vertical: registry.require_slot(linear, "OffsetVertical")?,
            vertical_axis: registry.require_slot(linear, "VerticalAxis")?,
            lateral_axis: registry.require_slot(linear, "LateralAxis")?,
        })
    }
}

/// Encode a transform as a list of 16 column-major numbers
pub fn matrix_to_value(matrix: &Matrix4<f64>) -> Value {
    Value::List(matrix.as_slice().iter().map(|&n| Value::Number(n)).collect())
}

/// Decode a transform from a list of 16 column-major numbers
///
/// `Null` decodes as identity; anything else of the wrong shape fails.
pub fn matrix_from_value(value: &Value) -> Result<Matrix4<f64>> {
    if value.is_null() {
        return Ok(Matrix4::identity());
    }
    let items = value
        .as_list()
        .ok_or_else(|| Error::placement("transform is not a list"))?;
    if items.len() != 16 {
        return Err(Error::placement(format!(
            "transform has {} components, expected 16",
            items.len()
        )));
    }
    let mut numbers = [0.0; 16];
    for (slot, item) in numbers.iter_mut().zip(items) {
        *slot = item
            .as_number()
            .ok_or_else(|| Error::placement("transform component is not a number"))?;
    }
    Ok(Matrix4::from_column_slice(&numbers))
}

/// Encode a direction as a list of 3 numbers
pub fn vector_to_value(vector: &Vector3<f64>) -> Value {
    Value::List(vec![
        Value::Number(vector.x),
        Value::Number(vector.y),
        Value::Number(vector.z),
    ])
}

/// Placement store over an entity model
///
/// `anchor` is the placement chains resolve up to; placements above it are
/// left out of the accumulated transform, matching a site-level anchor whose
/// own transform already positions everything it contains.
pub struct ModelPlacementStore<'a> {
    model: &'a mut Model,
    schema: PlacementSchema,
    anchor: Option<EntityId>,
}

impl<'a> ModelPlacementStore<'a> {
    /// Bind to a model, resolving the placement vocabulary from its schema
    pub fn new(model: &'a mut Model, anchor: Option<EntityId>) -> Result<Self> {
        let schema = PlacementSchema::resolve(model.registry())?;
        Ok(Self {
            model,
            schema,
            anchor,
        })
    }

    /// The resolved vocabulary
    pub fn schema(&self) -> &PlacementSchema {
        &self.schema
    }

    fn ref_slot(&self, entity: EntityId, slot: usize) -> Option<EntityId> {
        self.model.entity(entity)?.value(slot).as_ref_id()
    }
}

impl PlacementStore for ModelPlacementStore<'_> {
    fn placement_of(&self, element: EntityId) -> Option<EntityId> {
        let ty = self.model.type_of(element)?;
        if !self.model.registry().is_assignable(self.schema.element, ty) {
            return None;
        }
        self.ref_slot(element, self.schema.object_placement)
    }

    fn kind(&self, placement: EntityId) -> PlacementKind {
        let Some(ty) = self.model.type_of(placement) else {
            return PlacementKind::Other;
        };
        let registry = self.model.registry();
        if registry.is_assignable(self.schema.local, ty) {
            PlacementKind::Local
        } else if registry.is_assignable(self.schema.linear, ty) {
            PlacementKind::Linear
        } else {
            PlacementKind::Other
        }
    }

    fn parent_of(&self, placement: EntityId) -> Option<EntityId> {
        self.ref_slot(placement, self.schema.placement_rel_to)
    }

    fn relative_transform(&self, placement: EntityId) -> crate::Result<Matrix4<f64>> {
        let entity = self.model.require_entity(placement)?;
        matrix_from_value(entity.value(self.schema.relative_transform))
    }

    fn anchor(&self) -> Option<EntityId> {
        self.anchor
    }

    fn write_linear_placement(
        &mut self,
        element: EntityId,
        placement: LinearPlacement,
    ) -> crate::Result<EntityId> {
        let id = self.model.new_entity(self.schema.linear);
        let entity = self
            .model
            .entity_mut(id)
            .ok_or(corridor_model::ModelError::EntityNotFound(id))?;
        entity.set_value(self.schema.alignment, Value::Ref(placement.alignment));
        entity.set_value(
            self.schema.distance_along,
            Value::Number(placement.distance_along),
        );
        entity.set_value(
            self.schema.offset_lateral,
            Value::Number(placement.offset_lateral),
        );
        entity.set_value(
            self.schema.offset_vertical,
            Value::Number(placement.offset_vertical),
        );
        entity.set_value(
            self.schema.vertical_axis,
            vector_to_value(&placement.vertical_axis),
        );
        entity.set_value(
            self.schema.lateral_axis,
            vector_to_value(&placement.lateral_axis),
        );
        if let Some(anchor) = self.anchor {
            entity.set_value(self.schema.placement_rel_to, Value::Ref(anchor));
        }

        let element = self
            .model
            .entity_mut(element)
            .ok_or(corridor_model::ModelError::EntityNotFound(element))?;
        element.set_value(self.schema.object_placement, Value::Ref(id));
        Ok(id)
    }

    fn remove_placements(&mut self, placements: &[EntityId]) -> crate::Result<()> {
        for &placement in placements {
            self.model.delete(placement);
        }
        Ok(())
    }
}
