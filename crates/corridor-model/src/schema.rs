// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema registry - type hierarchy and property metadata
//!
//! Types form a single-inheritance tree. Every type declares a list of
//! properties; the registry flattens ancestors-first slot lists per type, so
//! a property inherited from type `A` occupies the same slot index in every
//! subtype of `A`. Substitution and copy logic is generic over this static
//! slot metadata instead of runtime type inspection.
//!
//! The registry is immutable once built; construct it through
//! [`SchemaBuilder`] and share it behind an `Arc`.

use crate::{ModelError, Result, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value kind of a property slot
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Value-category contents (numbers, text, enums, scalar collections)
    Scalar,
    /// Single reference to an entity of the declared target type
    Reference {
        /// Declared target type; subtypes are assignable
        target: TypeId,
    },
    /// Ordered collection of references to entities of the declared target type
    ReferenceList {
        /// Declared element target type; subtypes are assignable
        target: TypeId,
    },
}

/// Declared property of an entity type
///
/// `order > 0` marks a settable forward attribute; `order <= 0` marks a
/// derived or inverse property which is never written by copy or
/// substitution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name, unique within the owning type chain
    pub name: String,
    /// Value kind
    pub kind: PropertyKind,
    /// Forward-attribute order indicator
    pub order: i32,
}

impl PropertyDef {
    /// True for forward attributes that may be written
    pub fn is_settable(&self) -> bool {
        self.order > 0
    }
}

/// Declared entity type
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name, unique within the schema
    pub name: String,
    /// Single optional supertype (tree, not DAG)
    pub supertype: Option<TypeId>,
    /// Properties declared directly on this type
    pub properties: Vec<PropertyDef>,
}

/// One flattened property slot of a concrete type
///
/// `owner` is the type in the ancestor chain that declared the property.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertySlot {
    /// Declaring type
    pub owner: TypeId,
    /// Property metadata
    pub def: PropertyDef,
}

/// Immutable schema: type tree plus per-type flattened slot lists
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaRegistry {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
    /// Flattened slots per type, ancestors first
    slots: Vec<Vec<PropertySlot>>,
}

impl SchemaRegistry {
    /// Number of declared types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Iterate over all declared type ids
    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// Get a type definition
    pub fn type_def(&self, ty: TypeId) -> &TypeDef {
        &self.types[ty.0 as usize]
    }

    /// Get a type name
    pub fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.0 as usize].name
    }

    /// Look up a type by name
    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Look up a type by name, or fail with `UnknownType`
    pub fn require_type(&self, name: &str) -> Result<TypeId> {
        self.type_by_name(name)
            .ok_or_else(|| ModelError::unknown_type(name))
    }

    /// Single supertype, if any
    pub fn supertype(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.0 as usize].supertype
    }

    /// Flattened property slots of a type, ancestors first
    pub fn slots(&self, ty: TypeId) -> &[PropertySlot] {
        &self.slots[ty.0 as usize]
    }

    /// Find the slot index of a named property on a type or its ancestors
    pub fn slot_index(&self, ty: TypeId, property: &str) -> Option<usize> {
        self.slots(ty).iter().position(|s| s.def.name == property)
    }

    /// Find the slot index of a named property, or fail with `UnknownProperty`
    pub fn require_slot(&self, ty: TypeId, property: &str) -> Result<usize> {
        self.slot_index(ty, property)
            .ok_or_else(|| ModelError::unknown_property(self.type_name(ty), property))
    }

    /// Check whether `derived` is `base` or one of its subtypes
    pub fn is_assignable(&self, base: TypeId, derived: TypeId) -> bool {
        let mut current = Some(derived);
        while let Some(ty) = current {
            if ty == base {
                return true;
            }
            current = self.supertype(ty);
        }
        false
    }

    /// Nearest shared supertype of two types
    ///
    /// Walks `a`'s chain from most-specific to least-specific; for each step,
    /// walks `b`'s chain the same way and returns the first type that appears
    /// in both walks. The first-match order is part of the contract: callers
    /// depend on it as the tie-break wherever more than one shared ancestor
    /// exists, so do not replace it with a most-specific resolution.
    pub fn common_ancestor(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        let mut outer = Some(a);
        while let Some(candidate) = outer {
            let mut inner = Some(b);
            while let Some(other) = inner {
                if other == candidate {
                    return Some(candidate);
                }
                inner = self.supertype(other);
            }
            outer = self.supertype(candidate);
        }
        None
    }
}

/// Builder for [`SchemaRegistry`]
///
/// Types must be declared supertype-first; the returned [`TypeId`]s are then
/// usable as supertype and reference-target arguments. `finish` flattens the
/// per-type slot lists.
#[derive(Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDef>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entity type
    pub fn entity_type(&mut self, name: impl Into<String>, supertype: Option<TypeId>) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.into(),
            supertype,
            properties: Vec::new(),
        });
        id
    }

    /// Declare a scalar property
    pub fn scalar(&mut self, owner: TypeId, name: impl Into<String>, order: i32) -> &mut Self {
        self.property(owner, name, PropertyKind::Scalar, order)
    }

    /// Declare a single-reference property
    pub fn reference(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        target: TypeId,
        order: i32,
    ) -> &mut Self {
        self.property(owner, name, PropertyKind::Reference { target }, order)
    }

    /// Declare a collection-reference property
    pub fn reference_list(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        target: TypeId,
        order: i32,
    ) -> &mut Self {
        self.property(owner, name, PropertyKind::ReferenceList { target }, order)
    }

    /// Declare an inverse reference (order -1, never written)
    pub fn inverse(&mut self, owner: TypeId, name: impl Into<String>, target: TypeId) -> &mut Self {
        self.property(owner, name, PropertyKind::Reference { target }, -1)
    }

    fn property(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        kind: PropertyKind,
        order: i32,
    ) -> &mut Self {
        self.types[owner.0 as usize].properties.push(PropertyDef {
            name: name.into(),
            kind,
            order,
        });
        self
    }

    /// Finalize the schema
    pub fn finish(self) -> SchemaRegistry {
        let mut by_name = HashMap::with_capacity(self.types.len());
        for (i, ty) in self.types.iter().enumerate() {
            by_name.insert(ty.name.clone(), TypeId(i as u32));
        }

        // Supertypes are declared first, so their slots are already flattened
        // when a subtype is reached.
        let mut slots: Vec<Vec<PropertySlot>> = Vec::with_capacity(self.types.len());
        for (i, ty) in self.types.iter().enumerate() {
            let mut flat = match ty.supertype {
                Some(sup) => slots[sup.0 as usize].clone(),
                None => Vec::new(),
            };
            flat.extend(ty.properties.iter().map(|def| PropertySlot {
                owner: TypeId(i as u32),
                def: def.clone(),
            }));
            slots.push(flat);
        }

        SchemaRegistry {
            types: self.types,
            by_name,
            slots,
        }
    }
}
