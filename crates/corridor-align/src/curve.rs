// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment curves - ordered line segments with bearing, length and chainage
//!
//! An alignment curve is built from an ordered polyline: one straight
//! segment per distinct consecutive point pair, each carrying its start
//! bearing, planar length and the cumulative chainage up to its start.
//! Curved segment geometry is not supported; only straight lines.

use crate::{Error, Result};
use nalgebra::{Point2, Point3};

/// Ordered run of 3D points from the geometry source
pub type Polyline = Vec<Point3<f64>>;

/// Tolerance for matching polyline endpoints, in length units
pub const CONNECT_TOLERANCE: f64 = 1e-3;

/// Slack for the on-curve distance test
const ON_CURVE_EPS: f64 = 1e-5;

/// Normalize an angle in degrees to the [0, 360) full-turn range
pub fn normalize_bearing(angle: f64) -> f64 {
    let mut angle = angle;
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle > 360.0 {
        angle -= 360.0;
    }
    angle
}

/// Planar bearing of a direction, in degrees normalized to [0, 360)
pub fn bearing_of(dx: f64, dy: f64) -> f64 {
    normalize_bearing(dy.atan2(dx).to_degrees())
}

/// One straight alignment segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Planar start point
    pub start: Point2<f64>,
    /// Start bearing in degrees, [0, 360)
    pub bearing: f64,
    /// Planar length
    pub length: f64,
    /// Cumulative chainage at the segment start
    pub chainage: f64,
}

impl Segment {
    /// Planar end point
    pub fn end(&self) -> Point2<f64> {
        let rad = self.bearing.to_radians();
        Point2::new(
            self.start.x + self.length * rad.cos(),
            self.start.y + self.length * rad.sin(),
        )
    }
}

/// Source geometry of one alignment segment
///
/// Only [`SegmentGeometry::Line`] can be turned into a curve; arcs exist in
/// authoring data but are out of scope.
#[derive(Clone, Copy, Debug)]
pub enum SegmentGeometry {
    /// Straight line segment
    Line {
        start: Point2<f64>,
        bearing: f64,
        length: f64,
    },
    /// Circular arc segment (unsupported)
    CircularArc {
        start: Point2<f64>,
        bearing: f64,
        radius: f64,
        length: f64,
    },
}

/// Ordered segment list with chainage semantics
#[derive(Clone, Debug)]
pub struct AlignmentCurve {
    segments: Vec<Segment>,
    start_chainage: f64,
}

impl AlignmentCurve {
    /// Build a curve from an ordered polyline
    ///
    /// Zero-length consecutive duplicates are skipped. Coordinates and
    /// lengths are scaled by `unit_scale`; the declared start chainage is
    /// `start_offset`.
    pub fn build(points: &[Point3<f64>], start_offset: f64, unit_scale: f64) -> Self {
        let mut segments = Vec::new();
        let mut chainage = start_offset;
        for pair in points.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);
            let dx = end.x - start.x;
            let dy = end.y - start.y;
            let length = (dx * dx + dy * dy).sqrt() * unit_scale;
            if length == 0.0 {
                continue;
            }
            segments.push(Segment {
                start: Point2::new(start.x * unit_scale, start.y * unit_scale),
                bearing: bearing_of(dx, dy),
                length,
                chainage,
            });
            chainage += length;
        }
        Self {
            segments,
            start_chainage: start_offset,
        }
    }

    /// Build a curve from typed segment geometry
    ///
    /// Fails with [`Error::UnsupportedGeometry`] for non-line segments and
    /// with [`Error::DiscontinuousCurve`] when consecutive segments do not
    /// join within [`CONNECT_TOLERANCE`].
    pub fn from_segments(geometry: &[SegmentGeometry], start_offset: f64) -> Result<Self> {
        let mut segments = Vec::with_capacity(geometry.len());
        let mut chainage = start_offset;
        for geom in geometry {
            let segment = match *geom {
                SegmentGeometry::Line {
                    start,
                    bearing,
                    length,
                } => Segment {
                    start,
                    bearing: normalize_bearing(bearing),
                    length,
                    chainage,
                },
                SegmentGeometry::CircularArc { .. } => {
                    return Err(Error::unsupported_geometry(
                        "only line segments are supported",
                    ))
                }
            };
            if let Some(previous) = segments.last() {
                let gap = nalgebra::distance(&Segment::end(previous), &segment.start);
                if gap > CONNECT_TOLERANCE {
                    return Err(Error::discontinuous_curve(format!(
                        "segment at chainage {chainage} starts {gap} away from the previous end"
                    )));
                }
            }
            chainage += segment.length;
            segments.push(segment);
        }
        Ok(Self {
            segments,
            start_chainage: start_offset,
        })
    }

    /// The ordered segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Declared chainage at the curve start
    pub fn start_chainage(&self) -> f64 {
        self.start_chainage
    }

    /// Total curve length
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }
}

/// Chain unordered polylines into one connected path
///
/// Seeds the path with the first polyline, then repeatedly prepends a
/// remaining polyline whose end matches the path start or appends one whose
/// start matches the path end, within [`CONNECT_TOLERANCE`]. Fails with
/// [`Error::DiscontinuousCurve`] if a polyline connects to neither end while
/// polylines remain.
pub fn order_connected_polylines(polylines: Vec<Polyline>) -> Result<Vec<Polyline>> {
    let mut remaining = polylines;
    if remaining.is_empty() {
        return Ok(Vec::new());
    }

    let mut ordered = vec![remaining.remove(0)];
    while !remaining.is_empty() {
        let start = *ordered[0]
            .first()
            .ok_or_else(|| Error::discontinuous_curve("empty polyline"))?;
        let end = *ordered[ordered.len() - 1]
            .last()
            .ok_or_else(|| Error::discontinuous_curve("empty polyline"))?;

        let before = remaining.iter().position(|p| {
            p.last()
                .is_some_and(|last| nalgebra::distance(last, &start) < CONNECT_TOLERANCE)
        });
        if let Some(before) = before {
            let p = remaining.remove(before);
            ordered.insert(0, p);
            continue;
        }

        let after = remaining.iter().position(|p| {
            p.first()
                .is_some_and(|first| nalgebra::distance(first, &end) < CONNECT_TOLERANCE)
        });
        if let Some(after) = after {
            let p = remaining.remove(after);
            ordered.push(p);
            continue;
        }

        return Err(Error::discontinuous_curve(
            "polylines don't form a continuous curve",
        ));
    }
    Ok(ordered)
}

/// Test whether a point lies on a polyline
///
/// True iff the point is collinear with some consecutive point pair (zero
/// cross product) and its projection falls within that pair's bounds.
pub fn is_point_on_polyline(polyline: &[Point3<f64>], point: &Point3<f64>) -> bool {
    for pair in polyline.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        let dir = end - start;
        let test = point - start;
        if test.cross(&dir).norm() > 1e-9 {
            continue;
        }
        let delta = (dir.norm() - test.norm() - (point - end).norm()).abs();
        if delta > ON_CURVE_EPS {
            continue;
        }
        return true;
    }
    false
}

/// Test whether every point lies on the polyline
pub fn are_points_on_polyline(polyline: &[Point3<f64>], points: &[Point3<f64>]) -> bool {
    points.iter().all(|p| is_point_on_polyline(polyline, p))
}
