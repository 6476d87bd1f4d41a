// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # corridor-align
//!
//! Alignment curves and curve-relative placements for corridor models.
//!
//! The crate turns raw polyline geometry into directed alignment curves,
//! projects 3D positions onto them, and rewrites nested local placements as
//! linear placements: chainage along an alignment plus lateral and vertical
//! offsets.
//!
//! ## Pipeline
//!
//! 1. [`order_connected_polylines`] chains unordered polylines into one path
//! 2. [`AlignmentCurve::build`] turns the path into chainage-aware segments
//! 3. [`AlignmentCurve::project`] maps points to chainage and lateral offset
//! 4. [`rewrite_placements`] converts element placements over a
//!    [`PlacementStore`]
//!
//! ```
//! use corridor_align::{AlignmentCurve, Projection};
//! use nalgebra::{Point2, Point3};
//!
//! let curve = AlignmentCurve::build(
//!     &[Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
//!     0.0,
//!     1.0,
//! );
//! match curve.project(&Point2::new(5.0, 3.0)) {
//!     Projection::Hit(i) => {
//!         assert_eq!(i.distance_along, 5.0);
//!         assert_eq!(i.offset_lateral, 3.0);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod curve;
pub mod error;
pub mod placement;
pub mod project;
pub mod store;

pub use curve::{
    are_points_on_polyline, is_point_on_polyline, order_connected_polylines, AlignmentCurve,
    Polyline, Segment, SegmentGeometry,
};
pub use error::{Error, Result};
pub use placement::{
    resolve_to_anchor, rewrite_placements, AlignmentRecord, LinearPlacement, PlacementKind,
    PlacementStore, RewriteStats,
};
pub use project::{Intersection, Projection};
pub use store::{matrix_from_value, matrix_to_value, vector_to_value, ModelPlacementStore, PlacementSchema};

// nalgebra geometry types used across the public API
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};
