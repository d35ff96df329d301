//! Benchmark profiles and utilities for the Flotsam tracer simulator.
//!
//! Provides pre-built [`SimulationConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 100x100 domain, 10x10 blocks, four sources
//! - [`stress_profile`]: same domain at 40x40 blocks and ten times the rate
//! - [`DoubleGyre`]: a smooth, time-periodic analytic flow
//! - [`scatter_points`]: deterministic probe positions via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::PI;

use flotsam_core::{Point, SamplerError, SourceId, VelocitySampler};
use flotsam_engine::{
    PaperParams, PlasticParams, Polymer, SimulationConfig, SourceConfig, StencilPolicy,
    TracerVariant,
};
use flotsam_space::{BoundingBox, GridResolution, Shape, SpaceError};

/// Side of the square benchmark domain.
pub const DOMAIN_SIZE: f64 = 100.0;

/// The double-gyre flow scaled to `[0, size] x [0, size/2]`, with the
/// dividing line oscillating over `period`.
#[derive(Clone, Copy, Debug)]
pub struct DoubleGyre {
    /// Peak speed.
    pub amplitude: f64,
    /// Oscillation amplitude of the dividing line.
    pub epsilon: f64,
    /// Oscillation period.
    pub period: f64,
    /// Horizontal length scale.
    pub size: f64,
}

impl Default for DoubleGyre {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            epsilon: 0.25,
            period: 10.0,
            size: DOMAIN_SIZE,
        }
    }
}

impl VelocitySampler for DoubleGyre {
    fn sample(&self, p: Point, time: f64) -> Result<Point, SamplerError> {
        let w = 2.0 * PI / self.period;
        let x = 2.0 * p.x / self.size;
        let y = 2.0 * p.y / self.size;
        let a = self.epsilon * (w * time).sin();
        let b = 1.0 - 2.0 * a;
        let f = a * x * x + b * x;
        let dfdx = 2.0 * a * x + b;
        let u = -PI * self.amplitude * (PI * f).sin() * (PI * y).cos();
        let v = PI * self.amplitude * (PI * f).cos() * (PI * y).sin() * dfdx;
        Ok(Point::xy(u, v))
    }
}

fn domain() -> Result<BoundingBox, SpaceError> {
    BoundingBox::new(Point::ZERO, Point::xy(DOMAIN_SIZE, DOMAIN_SIZE))
}

fn sources(scale: f64) -> Result<Vec<SourceConfig>, SpaceError> {
    let paper = TracerVariant::Paper(PaperParams {
        particulate: false,
        density: 800.0,
        radius: 0.1,
        degradation_rate: 1e-3,
    });
    let plastic = TracerVariant::Plastic(PlasticParams {
        particulate: true,
        density: 920.0,
        radius: 0.002,
        degradation_rate: 0.0,
        polymer: Polymer::Polyethylene,
    });
    Ok(vec![
        SourceConfig::new(
            SourceId(0),
            "river",
            Shape::point(Point::xy(5.0, 50.0))?,
            20.0 * scale,
        ),
        SourceConfig::new(
            SourceId(1),
            "beach",
            Shape::line(Point::xy(20.0, 2.0), Point::xy(80.0, 2.0))?,
            10.0 * scale,
        )
        .with_variant(paper),
        SourceConfig::new(
            SourceId(2),
            "harbour",
            Shape::polygon(vec![
                Point::xy(60.0, 60.0),
                Point::xy(75.0, 62.0),
                Point::xy(70.0, 80.0),
                Point::xy(58.0, 72.0),
            ])?,
            15.0 * scale,
        )
        .with_variant(plastic),
        SourceConfig::new(
            SourceId(3),
            "outfalls",
            Shape::rect(Point::xy(30.0, 30.0), Point::xy(40.0, 40.0))?,
            5.0 * scale,
        )
        .with_stencil(StencilPolicy::Fixed { points: 64 }),
    ])
}

/// Build a reference benchmark profile: 10x10 blocks, 50 tracers/step.
pub fn reference_profile(seed: u64) -> Result<SimulationConfig, SpaceError> {
    let mut config =
        SimulationConfig::new(domain()?, GridResolution::Cells { nx: 10, ny: 10 }, 1.0);
    config.sources = sources(1.0)?;
    config.seed = seed;
    config.tracer_lifetime = Some(400.0);
    Ok(config)
}

/// Build a stress benchmark profile: 40x40 blocks, 500 tracers/step.
pub fn stress_profile(seed: u64) -> Result<SimulationConfig, SpaceError> {
    let mut config =
        SimulationConfig::new(domain()?, GridResolution::Cells { nx: 40, ny: 40 }, 1.0);
    config.sources = sources(10.0)?;
    config.seed = seed;
    config.tracer_lifetime = Some(400.0);
    Ok(config)
}

/// Generate `n` deterministic positions inside the benchmark domain.
///
/// Uses a simple multiplicative hash of the seed, not a statistical RNG.
pub fn scatter_points(n: usize, seed: u64) -> Vec<Point> {
    let unit = |v: u64| (v >> 11) as f64 / (1u64 << 53) as f64;
    (0..n as u64)
        .map(|i| {
            let a = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            let b = a
                .wrapping_mul(2862933555777941757)
                .wrapping_add(3037000493);
            Point::xy(unit(a) * DOMAIN_SIZE, unit(b) * DOMAIN_SIZE)
        })
        .collect()
}
