//! Geometry, bounding boxes and block grids for Flotsam simulations.
//!
//! # Contents
//!
//! - [`Shape`]: validated emission geometries (point, line segment,
//!   polygon, box, point set) with exact, boundary-inclusive containment.
//! - [`BoundingBox`]: axis-aligned boxes used as fast pre-filters and as
//!   block extents.
//! - [`BlockGrid`]: the regular decomposition of the domain into blocks,
//!   with O(1) point location and 8-connected neighbour queries.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bbox;
pub mod error;
pub mod geometry;
pub mod grid;

#[cfg(test)]
pub(crate) mod compliance;

pub use bbox::BoundingBox;
pub use error::SpaceError;
pub use geometry::{Geometry, Shape, ShapeKind};
pub use grid::{BlockGrid, GridResolution};
