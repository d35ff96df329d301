//! Ready-made configurations for common test scenarios.
//!
//! Every fixture panics on invalid input; they exist for tests only.

use flotsam_core::{Point, SourceId};
use flotsam_engine::{SimulationConfig, SourceConfig};
use flotsam_space::{BoundingBox, GridResolution, Shape};

/// The square domain `[0,0]..[size,size]`.
pub fn square_domain(size: f64) -> BoundingBox {
    BoundingBox::from_corners(Point::ZERO, Point::xy(size, size)).expect("valid square domain")
}

/// `[0,0]..[10,10]` split 2×2 with `dt = 1` and no sources.
pub fn two_by_two() -> SimulationConfig {
    SimulationConfig::new(
        square_domain(10.0),
        GridResolution::Cells { nx: 2, ny: 2 },
        1.0,
    )
}

/// [`two_by_two`] with one point source at (1,1) emitting one tracer per
/// step.
pub fn two_by_two_point_source() -> SimulationConfig {
    two_by_two().with_source(point_source(0, Point::xy(1.0, 1.0), 1.0))
}

/// `[0,0]..[n,n]` split into unit cells, `dt = 1`, no sources.
pub fn unit_grid(n: u32) -> SimulationConfig {
    SimulationConfig::new(
        square_domain(n as f64),
        GridResolution::Cells { nx: n, ny: n },
        1.0,
    )
}

/// A point source with the given rate.
pub fn point_source(id: u32, at: Point, rate: f64) -> SourceConfig {
    SourceConfig::new(SourceId(id), format!("point-{id}"), Shape::point(at).expect("finite point"), rate)
}

/// A rectangular area source between `min` and `max`.
pub fn area_source(id: u32, min: Point, max: Point, rate: f64) -> SourceConfig {
    SourceConfig::new(
        SourceId(id),
        format!("area-{id}"),
        Shape::rect(min, max).expect("finite rectangle"),
        rate,
    )
}
