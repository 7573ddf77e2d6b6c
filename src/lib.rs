//! # tessel
//!
//! 2D Delaunay triangulation via divide and conquer, conforming Delaunay triangulation of planar straight-line
//! graphs and sweep-line segment intersection, all built on a tolerant comparison layer.
//!
//! ```
//! use tessel::{conforming, Pslg, Triangulation, Vec2};
//!
//! let points = vec![
//!     Vec2::new(0.0, 0.0),
//!     Vec2::new(1.0, 0.0),
//!     Vec2::new(1.0, 1.0),
//!     Vec2::new(0.0, 1.0),
//!     Vec2::new(0.5, 0.4),
//! ];
//! let triangulation = Triangulation::new(&points).unwrap();
//! assert_eq!(triangulation.num_tris(), 4);
//!
//! let pslg = Pslg::from_segments(&[[Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]]).unwrap();
//! let (triangles, resolved) = conforming::triangulate(&pslg, &points[1..4], 1e-9).unwrap();
//! assert_eq!(triangles.len(), 2);
//! assert!(resolved.contains_edge(Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0)));
//! ```
#![forbid(unsafe_code)]
#![deny(clippy::incompatible_msrv)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

pub use conforming::{ConformingConfig, ConformingTriangulation};
pub use error::{GeometryError, Result, Stage};
pub use hull::{convex_hull, convex_hull_vertices};
pub use node::VertexNode;
pub use pslg::Pslg;
pub use sweep::{
    intersect, intersect_brute_force, intersect_detailed, intersect_full, EdgeIntersection,
    Intersection,
};
pub use triangulation::{triangulate, Triangle, Triangulation};
pub use utils::vec2::Vec2;

pub mod conforming;
pub mod error;
pub mod hull;
pub mod merge;
pub mod node;
pub mod pslg;
pub mod sweep;
pub mod triangulation;
pub mod trids;
pub mod utils;
