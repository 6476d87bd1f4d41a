// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reclassification driver - retype groups of entities and their shared
//! type-definition objects
//!
//! Thin orchestration over [`shallow_copy`] and [`replace_many`]: collect
//! the group, copy each member to the new type, substitute references in one
//! batch, delete the originals, then apply the same recipe to the group's
//! shared type-definition objects found through a one-to-many
//! type-relationship. Failures are per-operation; there is no whole-group
//! rollback.

use crate::{copy::shallow_copy, engine::replace_many, Error, ReferenceIndex, Result};
use corridor_model::{Entity, EntityId, Model, SchemaRegistry, TypeId};
use rustc_hash::FxHashSet;

/// Field-setter callback applied to a fresh copy before substitution
pub type EntitySetup = Box<dyn Fn(&mut Entity)>;

/// One classification rule
///
/// Selects entities of `source` (including subtypes) matching the predicate
/// and retypes them to `target`. When `type_target` is set, the shared
/// type-definition objects of the group are retyped as well.
pub struct ReclassRule {
    /// Type whose instances are examined
    pub source: TypeId,
    /// Optional predicate over candidate entities
    pub matches: Option<Box<dyn Fn(&Entity) -> bool>>,
    /// New type for matched entities
    pub target: TypeId,
    /// Applied to each copied entity (e.g. a discriminant enumeration)
    pub set_up: Option<EntitySetup>,
    /// New type for the group's type-definition objects
    pub type_target: Option<TypeId>,
    /// Applied to each copied type-definition object
    pub type_set_up: Option<EntitySetup>,
}

impl ReclassRule {
    /// Rule matching every instance of `source`
    pub fn new(source: TypeId, target: TypeId) -> Self {
        Self {
            source,
            matches: None,
            target,
            set_up: None,
            type_target: None,
            type_set_up: None,
        }
    }

    /// Restrict the rule with a predicate
    pub fn matching(mut self, predicate: impl Fn(&Entity) -> bool + 'static) -> Self {
        self.matches = Some(Box::new(predicate));
        self
    }

    /// Apply a field setter to every copied entity
    pub fn with_set_up(mut self, set_up: impl Fn(&mut Entity) + 'static) -> Self {
        self.set_up = Some(Box::new(set_up));
        self
    }

    /// Retype the group's type-definition objects as well
    pub fn with_type_target(mut self, target: TypeId) -> Self {
        self.type_target = Some(target);
        self
    }

    /// Apply a field setter to every copied type-definition object
    pub fn with_type_set_up(mut self, set_up: impl Fn(&mut Entity) + 'static) -> Self {
        self.type_set_up = Some(Box::new(set_up));
        self
    }
}

/// Resolved shape of the one-to-many type-relationship
///
/// The relationship entity points at one type-definition object through
/// `relating_slot` and at the typed instances through `related_slot`.
#[derive(Clone, Copy, Debug)]
pub struct TypeRelation {
    /// Relationship entity type
    pub relation: TypeId,
    /// Single-reference slot holding the type-definition object
    pub relating_slot: usize,
    /// Collection-reference slot holding the typed instances
    pub related_slot: usize,
}

impl TypeRelation {
    /// Resolve the relationship shape from schema names
    pub fn resolve(
        registry: &SchemaRegistry,
        relation: &str,
        relating_property: &str,
        related_property: &str,
    ) -> Result<Self> {
        let relation = registry.require_type(relation)?;
        Ok(Self {
            relation,
            relating_slot: registry.require_slot(relation, relating_property)?,
            related_slot: registry.require_slot(relation, related_property)?,
        })
    }
}

/// Old-to-new id correspondence produced by one reclassification run
#[derive(Clone, Debug, Default)]
pub struct ReclassOutcome {
    /// Replaced group members
    pub elements: Vec<(EntityId, EntityId)>,
    /// Replaced type-definition objects
    pub type_objects: Vec<(EntityId, EntityId)>,
}

/// Run one classification rule against the model
///
/// Copy, substitute in bulk, delete originals; then the same for the shared
/// type-definition objects when `relation` and `rule.type_target` are given.
pub fn reclassify(
    model: &mut Model,
    index: &ReferenceIndex,
    rule: &ReclassRule,
    relation: Option<&TypeRelation>,
) -> Result<ReclassOutcome> {
    let mut outcome = ReclassOutcome::default();

    let members: Vec<EntityId> = model
        .entities_of_kind(rule.source)
        .into_iter()
        .filter(|&id| match (&rule.matches, model.entity(id)) {
            (Some(predicate), Some(entity)) => predicate(entity),
            (None, Some(_)) => true,
            _ => false,
        })
        .collect();
    if members.is_empty() {
        return Ok(outcome);
    }

    for &old in &members {
        let new = shallow_copy(model, old, rule.target)?;
        if let (Some(set_up), Some(entity)) = (&rule.set_up, model.entity_mut(new)) {
            set_up(entity);
        }
        outcome.elements.push((old, new));
    }

    let pairs: Vec<_> = outcome
        .elements
        .iter()
        .map(|&(old, new)| (old, Some(new)))
        .collect();
    replace_many(model, index, &pairs)?;
    for &(old, _) in &outcome.elements {
        model.delete(old);
    }

    if let (Some(relation), Some(type_target)) = (relation, rule.type_target) {
        outcome.type_objects =
            reclassify_type_objects(model, index, rule, relation, type_target, &outcome.elements)?;
    }

    Ok(outcome)
}

fn reclassify_type_objects(
    model: &mut Model,
    index: &ReferenceIndex,
    rule: &ReclassRule,
    relation: &TypeRelation,
    type_target: TypeId,
    elements: &[(EntityId, EntityId)],
) -> Result<Vec<(EntityId, EntityId)>> {
    let registry = model.registry().clone();
    // substitution has already run, so the relationship rows point at the
    // new member ids
    let members: FxHashSet<EntityId> = elements.iter().map(|&(_, new)| new).collect();

    let mut seen: FxHashSet<EntityId> = FxHashSet::default();
    let mut type_pairs: Vec<(EntityId, EntityId)> = Vec::new();
    for rel_id in model.entities_of_kind(relation.relation) {
        let Some(rel) = model.entity(rel_id) else {
            continue;
        };
        let points_at_group = rel
            .value(relation.related_slot)
            .as_list()
            .is_some_and(|items| {
                items
                    .iter()
                    .any(|v| v.as_ref_id().is_some_and(|id| members.contains(&id)))
            });
        if !points_at_group {
            continue;
        }
        let Some(type_obj) = rel.value(relation.relating_slot).as_ref_id() else {
            continue;
        };
        if !seen.insert(type_obj) {
            continue;
        }
        // skip type objects already of the target type
        let Some(obj_ty) = model.type_of(type_obj) else {
            return Err(Error::Model(corridor_model::ModelError::EntityNotFound(
                type_obj,
            )));
        };
        if registry.is_assignable(type_target, obj_ty) {
            continue;
        }

        let new = shallow_copy(model, type_obj, type_target)?;
        if let (Some(set_up), Some(entity)) = (&rule.type_set_up, model.entity_mut(new)) {
            set_up(entity);
        }
        type_pairs.push((type_obj, new));
    }

    let pairs: Vec<_> = type_pairs.iter().map(|&(old, new)| (old, Some(new))).collect();
    replace_many(model, index, &pairs)?;
    for &(old, _) in &type_pairs {
        model.delete(old);
    }
    Ok(type_pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_model::{SchemaBuilder, Value};
    use std::sync::Arc;

    struct Fixture {
        model: Model,
        index: ReferenceIndex,
        proxy: TypeId,
        cable: TypeId,
        cable_type: TypeId,
        proxy_type: TypeId,
        rel_defines: TypeId,
        rel_contained: TypeId,
    }

    fn fixture() -> Fixture {
        let mut b = SchemaBuilder::new();
        let root = b.entity_type("Root", None);
        b.scalar(root, "Name", 1);
        let element = b.entity_type("Element", Some(root));
        let proxy = b.entity_type("Proxy", Some(element));
        let cable = b.entity_type("CableSegment", Some(element));
        b.scalar(cable, "PredefinedType", 2);
        let element_type = b.entity_type("ElementType", Some(root));
        let proxy_type = b.entity_type("ProxyType", Some(element_type));
        let cable_type = b.entity_type("CableSegmentType", Some(element_type));
        b.scalar(cable_type, "PredefinedType", 2);
        let rel_defines = b.entity_type("RelDefinesByType", None);
        b.reference(rel_defines, "RelatingType", element_type, 1);
        b.reference_list(rel_defines, "RelatedObjects", element, 2);
        let rel_contained = b.entity_type("RelContained", None);
        b.reference_list(rel_contained, "RelatedElements", element, 1);

        let registry = Arc::new(b.finish());
        Fixture {
            model: Model::new(registry.clone()),
            index: ReferenceIndex::new(registry),
            proxy,
            cable,
            cable_type,
            proxy_type,
            rel_defines,
            rel_contained,
        }
    }

    fn named(model: &mut Model, ty: TypeId, name: &str) -> EntityId {
        let id = model.new_entity(ty);
        model.set_by_name(id, "Name", name.into()).unwrap();
        id
    }

    #[test]
    fn test_full_recipe_with_type_objects() {
        let mut f = fixture();
        let carrier_a = named(&mut f.model, f.proxy, "Kabelkanal 1");
        let carrier_b = named(&mut f.model, f.proxy, "Kabelkanal 2");
        let wall = named(&mut f.model, f.proxy, "Wand 1");
        let shared_type = named(&mut f.model, f.proxy_type, "Kabelkanal Typ");

        let rel_type = f.model.new_entity(f.rel_defines);
        f.model
            .set_by_name(rel_type, "RelatingType", Value::Ref(shared_type))
            .unwrap();
        f.model
            .set_by_name(
                rel_type,
                "RelatedObjects",
                Value::List(vec![Value::Ref(carrier_a), Value::Ref(carrier_b)]),
            )
            .unwrap();
        let rel_contained = f.model.new_entity(f.rel_contained);
        f.model
            .set_by_name(
                rel_contained,
                "RelatedElements",
                Value::List(vec![
                    Value::Ref(carrier_a),
                    Value::Ref(wall),
                    Value::Ref(carrier_b),
                ]),
            )
            .unwrap();

        let registry = f.model.registry().clone();
        let cable = f.cable;
        let cable_type = f.cable_type;
        let discriminant = move |registry: Arc<corridor_model::SchemaRegistry>, ty: TypeId| {
            let slot = registry.slot_index(ty, "PredefinedType").unwrap();
            move |entity: &mut Entity| entity.set_value(slot, Value::Enum("CABLETRAY".into()))
        };
        let rule = ReclassRule::new(f.proxy, cable)
            .matching(|e| {
                matches!(e.value(0).as_text(), Some(name) if name.starts_with("Kabelkanal"))
            })
            .with_set_up(discriminant(registry.clone(), cable))
            .with_type_target(cable_type)
            .with_type_set_up(discriminant(registry.clone(), cable_type));
        let relation =
            TypeRelation::resolve(&registry, "RelDefinesByType", "RelatingType", "RelatedObjects")
                .unwrap();

        let outcome = reclassify(&mut f.model, &f.index, &rule, Some(&relation)).unwrap();

        // bijective correspondence, originals gone
        assert_eq!(outcome.elements.len(), 2);
        for &(old, new) in &outcome.elements {
            assert!(!f.model.contains(old));
            assert_eq!(f.model.type_of(new), Some(cable));
            assert_eq!(
                f.model.value_by_name(new, "PredefinedType").unwrap(),
                &Value::Enum("CABLETRAY".into())
            );
        }
        // the unmatched entity is untouched
        assert!(f.model.contains(wall));

        // containment list repointed in place
        let contained = f
            .model
            .value_by_name(rel_contained, "RelatedElements")
            .unwrap()
            .as_list()
            .unwrap();
        assert_eq!(contained[0].as_ref_id(), Some(outcome.elements[0].1));
        assert_eq!(contained[1].as_ref_id(), Some(wall));
        assert_eq!(contained[2].as_ref_id(), Some(outcome.elements[1].1));

        // shared type object replaced once
        assert_eq!(outcome.type_objects.len(), 1);
        let (old_type, new_type) = outcome.type_objects[0];
        assert_eq!(old_type, shared_type);
        assert!(!f.model.contains(old_type));
        assert_eq!(f.model.type_of(new_type), Some(cable_type));
        assert_eq!(
            f.model
                .value_by_name(rel_type, "RelatingType")
                .unwrap()
                .as_ref_id(),
            Some(new_type)
        );

        // graph-wide: nothing references a deleted entity
        for id in f.model.all_ids() {
            for value in f.model.require_entity(id).unwrap().values() {
                if let Some(target) = value.as_ref_id() {
                    assert!(f.model.contains(target));
                }
                if let Some(items) = value.as_list() {
                    for item in items {
                        if let Some(target) = item.as_ref_id() {
                            assert!(f.model.contains(target));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_type_object_already_of_target_is_skipped() {
        let mut f = fixture();
        let carrier = named(&mut f.model, f.proxy, "Kabelkanal 1");
        let typed = named(&mut f.model, f.cable_type, "Schon richtig");
        let rel_type = f.model.new_entity(f.rel_defines);
        f.model
            .set_by_name(rel_type, "RelatingType", Value::Ref(typed))
            .unwrap();
        f.model
            .set_by_name(rel_type, "RelatedObjects", Value::List(vec![Value::Ref(carrier)]))
            .unwrap();

        let registry = f.model.registry().clone();
        let rule = ReclassRule::new(f.proxy, f.cable).with_type_target(f.cable_type);
        let relation =
            TypeRelation::resolve(&registry, "RelDefinesByType", "RelatingType", "RelatedObjects")
                .unwrap();

        let outcome = reclassify(&mut f.model, &f.index, &rule, Some(&relation)).unwrap();
        assert_eq!(outcome.elements.len(), 1);
        assert!(outcome.type_objects.is_empty());
        assert!(f.model.contains(typed));
    }

    #[test]
    fn test_empty_group_is_a_no_op() {
        let mut f = fixture();
        let rule = ReclassRule::new(f.proxy, f.cable).matching(|_| false);
        let before = f.model.entity_count();
        let outcome = reclassify(&mut f.model, &f.index, &rule, None).unwrap();
        assert!(outcome.elements.is_empty());
        assert_eq!(f.model.entity_count(), before);
    }
}
