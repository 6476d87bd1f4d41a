// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-to-curve projection
//!
//! Maps a planar point onto an [`AlignmentCurve`], yielding the chainage of
//! the perpendicular foot and the signed lateral offset. A point slightly
//! before the curve start is recoverable: [`AlignmentCurve::project`] reports
//! the required backward extension instead of applying it, so the caller
//! decides whether to mutate the curve and retry.

use crate::curve::{bearing_of, normalize_bearing, AlignmentCurve};
use nalgebra::{Point2, Vector2};

/// Coincidence tolerance for segment endpoints and bearings, in degrees
/// respectively length units
const EPS: f64 = 1e-5;

/// How far before the curve start a point may fall and still qualify for
/// backward extension
const EXTEND_WINDOW: f64 = 0.1;

/// A successful projection onto the curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Chainage of the perpendicular foot
    pub distance_along: f64,
    /// Signed perpendicular distance, positive left of travel direction
    pub offset_lateral: f64,
}

/// Outcome of projecting a point onto a curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// The foot falls within the curve bounds
    Hit(Intersection),
    /// The point lies slightly before the curve start; extending the first
    /// segment backward by `distance` would make it project at the start
    ExtendBack { distance: f64 },
    /// The point does not project onto any segment
    Miss,
}

impl AlignmentCurve {
    /// Project a planar point onto the curve
    ///
    /// Segments are visited in chainage order. Per segment the perpendicular
    /// foot on the supporting line is computed parametrically, then:
    /// coincidence with either endpoint accepts immediately, a foot beyond
    /// the end skips to the next segment, and a foot before the start skips
    /// too - unless this is the first segment, the foot is within
    /// [`EXTEND_WINDOW`] of the start and exactly opposite the segment
    /// bearing, in which case [`Projection::ExtendBack`] is returned.
    pub fn project(&self, point: &Point2<f64>) -> Projection {
        for (index, segment) in self.segments().iter().enumerate() {
            let rad = segment.bearing.to_radians();
            let dir = Vector2::new(rad.cos(), rad.sin());

            let foot = segment.start + dir * (point - segment.start).dot(&dir);

            let diff = foot - segment.start;
            let length = diff.norm();
            let angle = bearing_of(diff.x, diff.y);
            let offset = point - foot;
            let offset_lateral = offset.norm() * lateral_sign(&offset, segment.bearing);

            // point is at the start or the end of the segment
            if length < EPS || (length - segment.length).abs() < EPS {
                return Projection::Hit(Intersection {
                    distance_along: segment.chainage + length,
                    offset_lateral,
                });
            }

            // foot is beyond the end
            if length > segment.length {
                continue;
            }

            // foot is before the start
            if (angle - segment.bearing).abs() > EPS {
                // a placement slightly before the curve start is recoverable
                // by growing the first segment backwards
                if index == 0 && length < EXTEND_WINDOW && is_opposite(angle, segment.bearing) {
                    return Projection::ExtendBack { distance: length };
                }
                continue;
            }

            return Projection::Hit(Intersection {
                distance_along: segment.chainage + length,
                offset_lateral,
            });
        }
        Projection::Miss
    }

    /// Grow the first segment backwards by `distance`
    ///
    /// The first segment's start point moves along the opposite bearing and
    /// its length grows; its chainage stays put, so every later segment's
    /// chainage shifts forward by `distance`.
    pub fn extend_back(&mut self, distance: f64) {
        let segments = self.segments_mut();
        let Some(first) = segments.first_mut() else {
            return;
        };
        let rad = (first.bearing + 180.0).to_radians();
        first.start.x += distance * rad.cos();
        first.start.y += distance * rad.sin();
        first.length += distance;
        for segment in &mut segments[1..] {
            segment.chainage += distance;
        }
    }

    /// Project, applying at most one backward extension
    ///
    /// Convenience over [`project`](Self::project) and
    /// [`extend_back`](Self::extend_back): if the first attempt proposes an
    /// extension it is applied and the projection retried once.
    pub fn project_extending(&mut self, point: &Point2<f64>) -> Projection {
        match self.project(point) {
            Projection::ExtendBack { distance } => {
                self.extend_back(distance);
                match self.project(point) {
                    // a second extension proposal will not converge
                    Projection::ExtendBack { .. } => Projection::Miss,
                    outcome => outcome,
                }
            }
            outcome => outcome,
        }
    }
}

/// Sign of the lateral offset: +1 left of the travel direction, -1 right
fn lateral_sign(offset: &Vector2<f64>, segment_bearing: f64) -> f64 {
    let bearing = bearing_of(offset.x, offset.y);
    let diff = normalize_bearing(bearing - segment_bearing);
    if diff > 0.0 && diff < 180.0 {
        1.0
    } else {
        -1.0
    }
}

/// True iff the two bearings point in exactly opposite directions
fn is_opposite(angle_a: f64, angle_b: f64) -> bool {
    let diff = (angle_a - angle_b).abs();
    (diff - 180.0).abs() < EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn east_curve() -> AlignmentCurve {
        AlignmentCurve::build(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
            0.0,
            1.0,
        )
    }

    fn hit(projection: Projection) -> Intersection {
        match projection {
            Projection::Hit(i) => i,
            other => panic!("expected a hit, got {other:?}"),
        }
    }

    #[test]
    fn test_lateral_offset_is_signed_left_positive() {
        let curve = east_curve();

        let left = hit(curve.project(&Point2::new(5.0, 3.0)));
        assert_relative_eq!(left.distance_along, 5.0);
        assert_relative_eq!(left.offset_lateral, 3.0);

        let right = hit(curve.project(&Point2::new(5.0, -3.0)));
        assert_relative_eq!(right.distance_along, 5.0);
        assert_relative_eq!(right.offset_lateral, -3.0);
    }

    #[test]
    fn test_sign_convention_holds_for_all_cardinal_bearings() {
        // segment end, a point one unit left of midpoint, one unit right
        let cases = [
            (
                Point3::new(10.0, 0.0, 0.0),
                Point2::new(5.0, 1.0),
                Point2::new(5.0, -1.0),
            ),
            (
                Point3::new(0.0, 10.0, 0.0),
                Point2::new(-1.0, 5.0),
                Point2::new(1.0, 5.0),
            ),
            (
                Point3::new(-10.0, 0.0, 0.0),
                Point2::new(-5.0, -1.0),
                Point2::new(-5.0, 1.0),
            ),
            (
                Point3::new(0.0, -10.0, 0.0),
                Point2::new(1.0, -5.0),
                Point2::new(-1.0, -5.0),
            ),
        ];
        for (end, left_point, right_point) in cases {
            let curve = AlignmentCurve::build(&[Point3::new(0.0, 0.0, 0.0), end], 0.0, 1.0);

            let left = hit(curve.project(&left_point));
            assert_relative_eq!(left.distance_along, 5.0, epsilon = 1e-9);
            assert_relative_eq!(left.offset_lateral, 1.0, epsilon = 1e-9);

            let right = hit(curve.project(&right_point));
            assert_relative_eq!(right.offset_lateral, -1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_projection_at_segment_start_matches_chainage() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 8.0, 0.0),
        ];
        let curve = AlignmentCurve::build(&points, 50.0, 1.0);

        let at_start = hit(curve.project(&Point2::new(0.0, 0.0)));
        assert_relative_eq!(at_start.distance_along, 50.0);
        assert_relative_eq!(at_start.offset_lateral, 0.0);

        // the joint belongs to both segments and both agree on chainage
        let at_joint = hit(curve.project(&Point2::new(10.0, 0.0)));
        assert_relative_eq!(at_joint.distance_along, 60.0);
    }

    #[test]
    fn test_vertical_bearing_is_not_singular() {
        let curve = AlignmentCurve::build(
            &[Point3::new(2.0, 0.0, 0.0), Point3::new(2.0, 10.0, 0.0)],
            0.0,
            1.0,
        );
        let i = hit(curve.project(&Point2::new(4.0, 6.0)));
        assert_relative_eq!(i.distance_along, 6.0);
        assert_relative_eq!(i.offset_lateral, -2.0);
    }

    #[test]
    fn test_point_before_start_proposes_extension() {
        let curve = east_curve();
        let outcome = curve.project(&Point2::new(-0.05, 0.0));
        match outcome {
            Projection::ExtendBack { distance } => assert_relative_eq!(distance, 0.05),
            other => panic!("expected an extension proposal, got {other:?}"),
        }
    }

    #[test]
    fn test_extend_back_then_retry_projects_near_start() {
        let mut curve = AlignmentCurve::build(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 0.0),
            ],
            0.0,
            1.0,
        );
        let point = Point2::new(-0.05, 0.0);
        let i = hit(curve.project_extending(&point));
        assert_relative_eq!(i.distance_along, 0.0, epsilon = 1e-9);

        // the first segment grew and later chainage shifted with it
        assert_relative_eq!(curve.segments()[0].length, 10.05);
        assert_relative_eq!(curve.segments()[0].chainage, 0.0);
        assert_relative_eq!(curve.segments()[1].chainage, 10.05);

        // a former mid-curve station is now 0.05 further along
        let mid = hit(curve.project(&Point2::new(10.0, 4.0)));
        assert_relative_eq!(mid.distance_along, 14.05);
    }

    #[test]
    fn test_point_far_before_start_misses() {
        let curve = east_curve();
        assert_eq!(curve.project(&Point2::new(-5.0, 0.0)), Projection::Miss);
    }

    #[test]
    fn test_point_beyond_end_misses() {
        let curve = east_curve();
        assert_eq!(curve.project(&Point2::new(15.0, 2.0)), Projection::Miss);
    }
}
