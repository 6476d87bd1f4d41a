// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph substitution engine - rewrite every reference to replaced entities
//!
//! [`replace_one`] repoints all references to one entity; [`replace_many`]
//! batches an arbitrary number of replacements into a single pass over the
//! model, resolving each encountered reference through a lookup table. The
//! batch form is behaviorally identical to iterating the single form but
//! costs one scan over entities and properties instead of one per
//! replacement.
//!
//! The engine never deletes entities. Deleting the replaced originals is the
//! caller's step, taken only after substitution completes.

use crate::{Error, ReferenceIndex, ReferringType, Result};
use corridor_model::{EntityId, Model, PropertyKind, SchemaRegistry, TypeId, Value};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Replace every reference to `old` with `new` across the model
///
/// `new` of `None` removes the references instead: single-valued slots are
/// set to null and collection elements are dropped. Both entities must
/// belong to `model`; [`Error::CrossModel`] otherwise. The referring-type
/// list is fetched for the common ancestor of the two types, so slots whose
/// declared target is strictly narrower than that ancestor are outside the
/// pass.
pub fn replace_one(
    model: &mut Model,
    index: &ReferenceIndex,
    old: EntityId,
    new: Option<EntityId>,
) -> Result<()> {
    replace_many(model, index, &[(old, new)])
}

/// Replace many entities in one scan
///
/// Shares one common-ancestor computation (folded over every old and new
/// type in the batch) and one referring-type fetch, then resolves each
/// reference encountered during a single pass through the lookup table.
pub fn replace_many(
    model: &mut Model,
    index: &ReferenceIndex,
    pairs: &[(EntityId, Option<EntityId>)],
) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }

    let registry = model.registry().clone();
    let mut ancestor: Option<TypeId> = None;
    let mut lookup: FxHashMap<EntityId, Option<EntityId>> = FxHashMap::default();

    for &(old, new) in pairs {
        let old_ty = model.type_of(old).ok_or_else(|| {
            Error::cross_model(format!(
                "entity {old} does not belong to this model; insert a copy first"
            ))
        })?;
        ancestor = Some(fold_ancestor(&registry, ancestor, old_ty)?);

        if let Some(new) = new {
            let new_ty = model.type_of(new).ok_or_else(|| {
                Error::cross_model(format!(
                    "replacement {new} does not belong to this model; insert a copy first"
                ))
            })?;
            ancestor = Some(fold_ancestor(&registry, ancestor, new_ty)?);
        }
        lookup.insert(old, new);
    }

    let ancestor = ancestor.ok_or_else(|| Error::schema_mismatch("empty replacement batch"))?;
    let referring = index.referring_types(ancestor);
    apply_replacements(model, &referring, &lookup);
    Ok(())
}

fn fold_ancestor(registry: &SchemaRegistry, acc: Option<TypeId>, ty: TypeId) -> Result<TypeId> {
    match acc {
        None => Ok(ty),
        Some(acc) => registry.common_ancestor(acc, ty).ok_or_else(|| {
            Error::schema_mismatch(format!(
                "no common ancestor between {} and {}",
                registry.type_name(acc),
                registry.type_name(ty),
            ))
        }),
    }
}

/// Run one substitution pass with a caller-supplied referring-type list
///
/// This is the scan both entry points share. A slot-level incompatibility
/// between the declared target and a replacement's type is logged and
/// treated as leave-unset (single slots) or leave-removed (collections); it
/// never aborts the pass.
pub fn apply_replacements(
    model: &mut Model,
    referring: &[ReferringType],
    lookup: &FxHashMap<EntityId, Option<EntityId>>,
) {
    let registry = model.registry().clone();

    // Replacement types, resolved once for the compatibility checks.
    let new_types: FxHashMap<EntityId, TypeId> = lookup
        .values()
        .filter_map(|new| *new)
        .filter_map(|new| model.type_of(new).map(|ty| (new, ty)))
        .collect();

    for rt in referring {
        let slots = registry.slots(rt.type_id);
        let single_targets: Vec<(usize, TypeId)> = rt
            .single_refs
            .iter()
            .filter_map(|&slot| match slots[slot].def.kind {
                PropertyKind::Reference { target } => Some((slot, target)),
                _ => None,
            })
            .collect();
        let list_targets: Vec<(usize, TypeId)> = rt
            .list_refs
            .iter()
            .filter_map(|&slot| match slots[slot].def.kind {
                PropertyKind::ReferenceList { target } => Some((slot, target)),
                _ => None,
            })
            .collect();

        for id in model.entities_of_kind(rt.type_id) {
            let Some(entity_ty) = model.type_of(id) else {
                continue;
            };
            let Some(entity) = model.entity_mut(id) else {
                continue;
            };

            for &(slot, declared) in &single_targets {
                let Some(current) = entity.value(slot).as_ref_id() else {
                    continue;
                };
                let Some(&replacement) = lookup.get(&current) else {
                    continue;
                };
                match replacement {
                    None => entity.set_value(slot, Value::Null),
                    Some(new) => {
                        if new_types
                            .get(&new)
                            .is_some_and(|&ty| registry.is_assignable(declared, ty))
                        {
                            entity.set_value(slot, Value::Ref(new));
                        } else {
                            warn!(
                                entity_type = registry.type_name(entity_ty),
                                property = slots[slot].def.name.as_str(),
                                expected = registry.type_name(declared),
                                actual = new_types
                                    .get(&new)
                                    .map(|&ty| registry.type_name(ty))
                                    .unwrap_or("<missing>"),
                                "incompatible replacement, reference left unset"
                            );
                            entity.set_value(slot, Value::Null);
                        }
                    }
                }
            }

            for &(slot, declared) in &list_targets {
                let Some(items) = entity.value_mut(slot).as_list_mut() else {
                    continue;
                };
                let mut i = 0;
                while i < items.len() {
                    let Some(current) = items[i].as_ref_id() else {
                        i += 1;
                        continue;
                    };
                    let Some(&replacement) = lookup.get(&current) else {
                        i += 1;
                        continue;
                    };
                    items.remove(i);
                    if let Some(new) = replacement {
                        if new_types
                            .get(&new)
                            .is_some_and(|&ty| registry.is_assignable(declared, ty))
                        {
                            // reinsert at the position the old element held
                            items.insert(i, Value::Ref(new));
                            i += 1;
                        } else {
                            warn!(
                                entity_type = registry.type_name(entity_ty),
                                property = slots[slot].def.name.as_str(),
                                expected = registry.type_name(declared),
                                actual = new_types
                                    .get(&new)
                                    .map(|&ty| registry.type_name(ty))
                                    .unwrap_or("<missing>"),
                                "incompatible replacement, element left removed"
                            );
                        }
                    }
                }
            }
        }
    }
}
