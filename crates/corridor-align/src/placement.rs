// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement resolution and linear-placement rewriting
//!
//! [`PlacementStore`] abstracts how placements are stored; the rewriter only
//! needs to walk placement chains, read relative transforms and write the
//! results back. [`rewrite_placements`] converts each element's nested local
//! placement into a curve-relative placement on its alignment: chainage,
//! lateral offset, vertical offset and the local axis directions.

use crate::curve::AlignmentCurve;
use crate::project::Projection;
use crate::Result;
use corridor_model::EntityId;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use tracing::warn;

/// Classification of a placement entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementKind {
    /// Relative transform chained to a parent placement
    Local,
    /// Curve-relative placement
    Linear,
    /// Any other placement form, left untouched
    Other,
}

/// Curve-relative placement data to be written for an element
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearPlacement {
    /// The alignment entity the distance is measured along
    pub alignment: EntityId,
    /// Chainage along the alignment
    pub distance_along: f64,
    /// Signed lateral offset, positive left of travel direction
    pub offset_lateral: f64,
    /// Vertical offset above the alignment
    pub offset_vertical: f64,
    /// Vertical axis direction in the element's local frame
    pub vertical_axis: Vector3<f64>,
    /// Lateral axis direction in the element's local frame
    pub lateral_axis: Vector3<f64>,
}

/// Storage seam for placement chains
///
/// Implemented over an entity model by
/// [`ModelPlacementStore`](crate::store::ModelPlacementStore); tests
/// implement it over plain maps.
pub trait PlacementStore {
    /// The placement entity of an element, if it has one
    fn placement_of(&self, element: EntityId) -> Option<EntityId>;

    /// Classify a placement entity
    fn kind(&self, placement: EntityId) -> PlacementKind;

    /// The parent placement a local placement is relative to
    fn parent_of(&self, placement: EntityId) -> Option<EntityId>;

    /// The relative transform carried by a local placement
    fn relative_transform(&self, placement: EntityId) -> Result<Matrix4<f64>>;

    /// The placement chains are resolved up to, exclusive
    fn anchor(&self) -> Option<EntityId>;

    /// Replace the element's placement with a linear placement, returning
    /// the new placement entity
    fn write_linear_placement(
        &mut self,
        element: EntityId,
        placement: LinearPlacement,
    ) -> Result<EntityId>;

    /// Remove placement entities that are no longer referenced
    fn remove_placements(&mut self, placements: &[EntityId]) -> Result<()>;
}

/// One alignment with the elements positioned along it
#[derive(Debug)]
pub struct AlignmentRecord {
    /// The alignment entity
    pub alignment: EntityId,
    /// Its horizontal curve
    pub curve: AlignmentCurve,
    /// Elements matched to this alignment
    pub elements: Vec<EntityId>,
}

/// Counters reported by [`rewrite_placements`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Elements whose placement was converted
    pub rewritten: usize,
    /// Elements skipped because projection or inversion failed
    pub skipped: usize,
}

/// Accumulate the element's transform up to the anchor placement
///
/// Starts from the element's own relative transform and composes parent
/// transforms child-first while the parent is a local placement other than
/// the anchor. Elements without a local placement resolve to identity.
pub fn resolve_to_anchor<S: PlacementStore>(store: &S, element: EntityId) -> Result<Matrix4<f64>> {
    let Some(placement) = store.placement_of(element) else {
        return Ok(Matrix4::identity());
    };
    if store.kind(placement) != PlacementKind::Local {
        return Ok(Matrix4::identity());
    }

    let mut matrix = store.relative_transform(placement)?;
    let mut current = placement;
    while let Some(parent) = store.parent_of(current) {
        if store.anchor() == Some(parent) || store.kind(parent) != PlacementKind::Local {
            break;
        }
        matrix = store.relative_transform(parent)? * matrix;
        current = parent;
    }
    Ok(matrix)
}

/// Rewrite local placements as linear placements along their alignments
///
/// For every element of every record: resolve the transform to the anchor,
/// project the transform origin onto the alignment curve (extending the
/// curve backwards once if needed), and write a linear placement carrying
/// the chainage, the signed lateral offset, the world-frame height as
/// vertical offset, and the inverse-transformed unit axes. Elements whose
/// point misses the curve or whose transform is singular are skipped with a
/// warning. Old placements are removed in one batch at the end.
pub fn rewrite_placements<S: PlacementStore>(
    store: &mut S,
    records: &mut [AlignmentRecord],
) -> Result<RewriteStats> {
    let mut stats = RewriteStats::default();
    let mut to_remove = Vec::new();

    for record in records.iter_mut() {
        for index in 0..record.elements.len() {
            let element = record.elements[index];

            // only local placements are rewritten
            let Some(old_placement) = store.placement_of(element) else {
                continue;
            };
            if store.kind(old_placement) != PlacementKind::Local {
                continue;
            }

            let matrix = resolve_to_anchor(store, element)?;
            let position = matrix.transform_point(&Point3::origin());

            let intersection =
                match record.curve.project_extending(&Point2::new(position.x, position.y)) {
                    Projection::Hit(intersection) => intersection,
                    Projection::ExtendBack { .. } | Projection::Miss => {
                        warn!(element = %element, "no intersection with the alignment curve, placement kept");
                        stats.skipped += 1;
                        continue;
                    }
                };

            let Some(inverse) = matrix.try_inverse() else {
                warn!(element = %element, "placement transform is singular, placement kept");
                stats.skipped += 1;
                continue;
            };
            let vertical_axis = inverse.transform_vector(&Vector3::z()).normalize();
            let lateral_axis = inverse.transform_vector(&Vector3::x()).normalize();

            store.write_linear_placement(
                element,
                LinearPlacement {
                    alignment: record.alignment,
                    distance_along: intersection.distance_along,
                    offset_lateral: intersection.offset_lateral,
                    offset_vertical: position.z,
                    vertical_axis,
                    lateral_axis,
                },
            )?;
            to_remove.push(old_placement);
            stats.rewritten += 1;
        }
    }

    if !to_remove.is_empty() {
        store.remove_placements(&to_remove)?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct MapStore {
        placements: FxHashMap<EntityId, EntityId>,
        kinds: FxHashMap<EntityId, PlacementKind>,
        parents: FxHashMap<EntityId, EntityId>,
        transforms: FxHashMap<EntityId, Matrix4<f64>>,
        anchor: Option<EntityId>,
        written: Vec<(EntityId, LinearPlacement)>,
        removed: Vec<EntityId>,
        next_id: u32,
    }

    impl MapStore {
        fn add_local(
            &mut self,
            element: EntityId,
            transform: Matrix4<f64>,
            parent: Option<EntityId>,
        ) -> EntityId {
            self.next_id += 1;
            let placement = EntityId(1000 + self.next_id);
            self.placements.insert(element, placement);
            self.kinds.insert(placement, PlacementKind::Local);
            self.transforms.insert(placement, transform);
            if let Some(parent) = parent {
                self.parents.insert(placement, parent);
            }
            placement
        }
    }

    impl PlacementStore for MapStore {
        fn placement_of(&self, element: EntityId) -> Option<EntityId> {
            self.placements.get(&element).copied()
        }

        fn kind(&self, placement: EntityId) -> PlacementKind {
            self.kinds
                .get(&placement)
                .copied()
                .unwrap_or(PlacementKind::Other)
        }

        fn parent_of(&self, placement: EntityId) -> Option<EntityId> {
            self.parents.get(&placement).copied()
        }

        fn relative_transform(&self, placement: EntityId) -> Result<Matrix4<f64>> {
            Ok(self.transforms[&placement])
        }

        fn anchor(&self) -> Option<EntityId> {
            self.anchor
        }

        fn write_linear_placement(
            &mut self,
            element: EntityId,
            placement: LinearPlacement,
        ) -> Result<EntityId> {
            self.written.push((element, placement));
            self.next_id += 1;
            let id = EntityId(2000 + self.next_id);
            self.placements.insert(element, id);
            self.kinds.insert(id, PlacementKind::Linear);
            Ok(id)
        }

        fn remove_placements(&mut self, placements: &[EntityId]) -> Result<()> {
            self.removed.extend_from_slice(placements);
            Ok(())
        }
    }

    fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    fn east_curve() -> AlignmentCurve {
        AlignmentCurve::build(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(100.0, 0.0, 0.0)],
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_resolve_composes_child_then_parent_up_to_anchor() {
        let mut store = MapStore::default();
        let element = EntityId(1);

        let anchor_transform = translation(1000.0, 0.0, 0.0);
        store.next_id += 1;
        let anchor = EntityId(1000 + store.next_id);
        store.kinds.insert(anchor, PlacementKind::Local);
        store.transforms.insert(anchor, anchor_transform);
        store.anchor = Some(anchor);

        let parent = {
            store.next_id += 1;
            let id = EntityId(1000 + store.next_id);
            store.kinds.insert(id, PlacementKind::Local);
            store.transforms.insert(id, translation(10.0, 0.0, 0.0));
            store.parents.insert(id, anchor);
            id
        };
        store.add_local(element, translation(0.0, 5.0, 2.0), Some(parent));

        let matrix = resolve_to_anchor(&store, element).unwrap();
        let position = matrix.transform_point(&Point3::origin());

        // anchor transform is excluded
        assert_relative_eq!(position.x, 10.0);
        assert_relative_eq!(position.y, 5.0);
        assert_relative_eq!(position.z, 2.0);
    }

    #[test]
    fn test_element_without_placement_resolves_to_identity() {
        let store = MapStore::default();
        let matrix = resolve_to_anchor(&store, EntityId(7)).unwrap();
        assert_eq!(matrix, Matrix4::identity());
    }

    #[test]
    fn test_rewrite_writes_linear_placement_and_batches_removal() {
        let mut store = MapStore::default();
        let near = EntityId(1);
        let far = EntityId(2);
        let old_near = store.add_local(near, translation(20.0, 3.0, 1.5), None);
        let old_far = store.add_local(far, translation(500.0, 500.0, 0.0), None);

        let mut records = [AlignmentRecord {
            alignment: EntityId(99),
            curve: east_curve(),
            elements: vec![near, far],
        }];
        let stats = rewrite_placements(&mut store, &mut records).unwrap();

        assert_eq!(stats, RewriteStats { rewritten: 1, skipped: 1 });
        assert_eq!(store.written.len(), 1);
        let (element, linear) = &store.written[0];
        assert_eq!(*element, near);
        assert_eq!(linear.alignment, EntityId(99));
        assert_relative_eq!(linear.distance_along, 20.0);
        assert_relative_eq!(linear.offset_lateral, 3.0);
        assert_relative_eq!(linear.offset_vertical, 1.5);
        assert_relative_eq!(linear.vertical_axis, Vector3::z());
        assert_relative_eq!(linear.lateral_axis, Vector3::x());

        assert_eq!(store.removed, vec![old_near]);
        assert!(store.placements[&far] == old_far);
    }

    #[test]
    fn test_rewrite_skips_non_local_placements() {
        let mut store = MapStore::default();
        let element = EntityId(1);
        let placement = store.add_local(element, translation(1.0, 0.0, 0.0), None);
        store.kinds.insert(placement, PlacementKind::Linear);

        let mut records = [AlignmentRecord {
            alignment: EntityId(99),
            curve: east_curve(),
            elements: vec![element],
        }];
        let stats = rewrite_placements(&mut store, &mut records).unwrap();
        assert_eq!(stats, RewriteStats::default());
        assert!(store.written.is_empty());
    }
}
