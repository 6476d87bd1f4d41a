// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference index - which types can reference a given target type
//!
//! The substitution engine needs to know, for a target type, every type with
//! at least one settable property able to reference it. That answer depends
//! only on the schema, so it is cached per exact target type for the
//! lifetime of the index. Entries are never evicted; the index is scoped to
//! one schema registry rather than process-wide, which bounds the growth to
//! one schema's type count.

use corridor_model::{PropertyKind, SchemaRegistry, TypeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One cache entry: a type able to reference the target type
///
/// Slot indices are valid for the candidate type and, because inherited
/// slots keep their index, for all of its subtypes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferringType {
    /// The candidate referring type
    pub type_id: TypeId,
    /// Single-valued reference slots targeting the queried type
    pub single_refs: Vec<usize>,
    /// Collection-valued reference slots targeting the queried type
    pub list_refs: Vec<usize>,
}

/// Cached per-target-type lookup of referring types
///
/// Lookups for a subtype never reuse a supertype's entry: the referring set
/// of `RailElement` and of its supertype `Element` genuinely differ, and the
/// exact-type keying keeps each answer precise at the cost of one extra scan
/// per distinct target type.
pub struct ReferenceIndex {
    registry: Arc<SchemaRegistry>,
    cache: RwLock<FxHashMap<TypeId, Arc<Vec<ReferringType>>>>,
}

impl ReferenceIndex {
    /// Create an index over one schema registry
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// The schema this index is scoped to
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// All types with at least one settable property able to reference
    /// `target`, with the qualifying slot indices
    ///
    /// Concurrent first-time builds for the same type converge on the first
    /// inserted result; a build that loses the race is discarded, never
    /// merged.
    pub fn referring_types(&self, target: TypeId) -> Arc<Vec<ReferringType>> {
        if let Some(hit) = self.cache.read().get(&target) {
            return hit.clone();
        }

        // Build outside the write lock; competing builders race to insert.
        let built = Arc::new(self.scan(target));
        let mut cache = self.cache.write();
        cache.entry(target).or_insert(built).clone()
    }

    /// Number of cached entries
    pub fn cached_targets(&self) -> usize {
        self.cache.read().len()
    }

    fn scan(&self, target: TypeId) -> Vec<ReferringType> {
        let mut referring = Vec::new();
        for candidate in self.registry.types() {
            let mut single_refs = Vec::new();
            let mut list_refs = Vec::new();
            for (slot, meta) in self.registry.slots(candidate).iter().enumerate() {
                if !meta.def.is_settable() {
                    continue;
                }
                match meta.def.kind {
                    PropertyKind::Reference { target: declared }
                        if self.registry.is_assignable(declared, target) =>
                    {
                        single_refs.push(slot);
                    }
                    PropertyKind::ReferenceList { target: declared }
                        if self.registry.is_assignable(declared, target) =>
                    {
                        list_refs.push(slot);
                    }
                    _ => {}
                }
            }
            if single_refs.is_empty() && list_refs.is_empty() {
                continue;
            }
            referring.push(ReferringType {
                type_id: candidate,
                single_refs,
                list_refs,
            });
        }
        referring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_model::SchemaBuilder;

    fn schema() -> (Arc<SchemaRegistry>, TypeId, TypeId, TypeId) {
        let mut b = SchemaBuilder::new();
        let element = b.entity_type("Element", None);
        let rail = b.entity_type("RailElement", Some(element));
        let rel = b.entity_type("RelContained", None);
        b.reference(rel, "RelatingElement", element, 1);
        b.reference_list(rel, "RelatedElements", element, 2);
        b.inverse(element, "ContainedIn", rel);
        let narrow = b.entity_type("RailOnly", None);
        b.reference(narrow, "Rail", rail, 1);
        (Arc::new(b.finish()), element, rail, rel)
    }

    #[test]
    fn test_collects_single_and_list_slots() {
        let (schema, element, _, rel) = schema();
        let index = ReferenceIndex::new(schema);
        let referring = index.referring_types(element);

        assert_eq!(referring.len(), 1);
        assert_eq!(referring[0].type_id, rel);
        assert_eq!(referring[0].single_refs, vec![0]);
        assert_eq!(referring[0].list_refs, vec![1]);
    }

    #[test]
    fn test_subtype_target_widens_the_answer() {
        // A property declared against the subtype qualifies for the subtype
        // query only; the supertype query must not see it.
        let (schema, element, rail, _) = schema();
        let index = ReferenceIndex::new(schema);

        let for_element = index.referring_types(element);
        let for_rail = index.referring_types(rail);
        assert_eq!(for_element.len(), 1);
        assert_eq!(for_rail.len(), 2);
        // distinct exact-type entries, no sharing
        assert_eq!(index.cached_targets(), 2);
    }

    #[test]
    fn test_inverse_properties_never_qualify() {
        let (schema, _, _, rel) = schema();
        let index = ReferenceIndex::new(schema);
        let referring = index.referring_types(rel);
        // Element.ContainedIn points at RelContained but has order -1
        assert!(referring.is_empty());
    }

    #[test]
    fn test_cache_hit_returns_same_entry() {
        let (schema, element, _, _) = schema();
        let index = ReferenceIndex::new(schema);
        let first = index.referring_types(element);
        let second = index.referring_types(element);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_builds_converge() {
        let (schema, element, _, _) = schema();
        let index = ReferenceIndex::new(schema);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| index.referring_types(element)))
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            // whichever result was inserted first is the one everyone observes
            for r in &results[1..] {
                assert!(Arc::ptr_eq(&results[0], r));
            }
        });
        assert_eq!(index.cached_targets(), 1);
    }
}
