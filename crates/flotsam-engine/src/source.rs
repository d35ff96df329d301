//! Emission sources.
//!
//! A [`Source`] turns its configured rate into an integer number of new
//! tracers per step, carrying the fractional remainder forward so that
//! the long-run count matches `rate * elapsed`. Positions are drawn from
//! the source geometry with a ChaCha8 stream seeded per source and step,
//! which keeps emission reproducible without storing RNG state.

use flotsam_core::{Point, SourceId, StepError, StepId};
use flotsam_space::{Geometry, Shape};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{SourceConfig, StencilPolicy};

/// Slack added before flooring the expected count, so that sums such as
/// `0.1 * 10` do not lose a tracer to rounding.
const COUNT_EPSILON: f64 = 1e-9;

/// Rejection-sampling attempts per polygon point before falling back to
/// the first vertex.
const MAX_REJECTION_ATTEMPTS: u32 = 64;

/// Salt separating the fixed-stencil stream from per-step streams.
const STENCIL_SALT: u64 = 0x5354_454E_4349_4C00;

/// Mutable emission bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourceStats {
    /// Tracers emitted since the start of the run.
    pub particles_emitted: u64,
    /// Fractional tracer carried into the next step, in `[0, 1)`.
    pub carry: f64,
    /// Next stencil position for [`StencilPolicy::Fixed`].
    pub stencil_cursor: u32,
}

/// One step's emission, planned but not yet applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Emission {
    /// Positions of the new tracers, in emission order.
    pub positions: Vec<Point>,
    /// The source's statistics once the emission is applied.
    pub stats: SourceStats,
}

impl Emission {
    fn idle(stats: SourceStats) -> Self {
        Self {
            positions: Vec::new(),
            stats,
        }
    }
}

/// A configured emitter plus its running statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    config: SourceConfig,
    stats: SourceStats,
    stencil: Vec<Point>,
}

impl Source {
    /// Build a source with zeroed statistics.
    ///
    /// A fixed stencil is sampled here, from a stream derived from `seed`
    /// and the source id.
    pub fn new(config: SourceConfig, seed: u64) -> Self {
        Self::with_stats(config, seed, SourceStats::default())
    }

    /// Build a source with restored statistics.
    pub fn with_stats(config: SourceConfig, seed: u64, stats: SourceStats) -> Self {
        let stencil = match config.stencil {
            StencilPolicy::Fixed { points } if !config.geometry.is_degenerate() => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed ^ STENCIL_SALT ^ id_bits(config.id));
                (0..points)
                    .map(|_| sample(&config.geometry, &mut rng))
                    .collect()
            }
            _ => Vec::new(),
        };
        Self {
            config,
            stats,
            stencil,
        }
    }

    /// Source id.
    pub fn id(&self) -> SourceId {
        self.config.id
    }

    /// Source name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Full configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Emission geometry.
    pub fn geometry(&self) -> &Shape {
        &self.config.geometry
    }

    /// Running statistics.
    pub fn stats(&self) -> &SourceStats {
        &self.stats
    }

    /// The pre-sampled stencil (empty under [`StencilPolicy::Resample`]).
    pub fn stencil(&self) -> &[Point] {
        &self.stencil
    }

    /// Work out the tracers this source emits for the step starting at
    /// `time`, without touching its statistics.
    ///
    /// Outside the active window nothing is emitted and the carry is kept.
    /// Degenerate area or line geometry emits nothing and drops the carry.
    /// A count above `limit`, or one whose positions cannot be allocated,
    /// fails with [`StepError::AllocationFailed`].
    pub fn plan_emission(
        &self,
        time: f64,
        dt: f64,
        step: StepId,
        seed: u64,
        limit: usize,
    ) -> Result<Emission, StepError> {
        let mut stats = self.stats;
        if !self.config.is_active_at(time) {
            return Ok(Emission::idle(stats));
        }
        if self.config.geometry.is_degenerate() {
            stats.carry = 0.0;
            return Ok(Emission::idle(stats));
        }

        let expected = self.config.rate * dt + stats.carry;
        let count = (expected + COUNT_EPSILON).floor();
        if count > limit as f64 {
            return Err(StepError::AllocationFailed {
                requested: count as usize,
                limit,
            });
        }
        stats.carry = (expected - count).max(0.0);
        let count = count as usize;
        let mut positions = Vec::new();
        positions
            .try_reserve_exact(count)
            .map_err(|_| StepError::AllocationFailed {
                requested: count,
                limit,
            })?;
        stats.particles_emitted += count as u64;

        match self.config.stencil {
            StencilPolicy::Fixed { .. } if !self.stencil.is_empty() => {
                let len = self.stencil.len() as u32;
                for _ in 0..count {
                    positions.push(self.stencil[(stats.stencil_cursor % len) as usize]);
                    stats.stencil_cursor = (stats.stencil_cursor + 1) % len;
                }
            }
            _ => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed ^ id_bits(self.config.id) ^ step.0);
                positions.extend((0..count).map(|_| sample(&self.config.geometry, &mut rng)));
            }
        }
        Ok(Emission { positions, stats })
    }

    /// Adopt the statistics of an applied [`Emission`].
    pub fn set_stats(&mut self, stats: SourceStats) {
        self.stats = stats;
    }

    /// Plan and immediately apply one step's emission.
    pub fn emit(
        &mut self,
        time: f64,
        dt: f64,
        step: StepId,
        seed: u64,
    ) -> Result<Vec<Point>, StepError> {
        let Emission { positions, stats } = self.plan_emission(time, dt, step, seed, usize::MAX)?;
        self.stats = stats;
        Ok(positions)
    }
}

fn id_bits(id: SourceId) -> u64 {
    u64::from(id.0) << 32
}

/// Draw one position uniformly from `shape`.
fn sample(shape: &Shape, rng: &mut ChaCha8Rng) -> Point {
    match shape.geometry() {
        Geometry::Point(p) => *p,
        Geometry::Line { start, end } => start.lerp(*end, rng.random::<f64>()),
        Geometry::Box(b) => uniform_in_box(b.min(), b.extent(), rng),
        Geometry::PointSet(points) => points[rng.random_range(0..points.len())],
        Geometry::Polygon(vertices) => {
            let bbox = shape.bounding_box();
            for _ in 0..MAX_REJECTION_ATTEMPTS {
                let candidate = uniform_in_box(bbox.min(), bbox.extent(), rng);
                if shape.contains(&candidate) {
                    return candidate;
                }
            }
            vertices[0]
        }
    }
}

fn uniform_in_box(min: Point, extent: Point, rng: &mut ChaCha8Rng) -> Point {
    Point::new(
        min.x + extent.x * rng.random::<f64>(),
        min.y + extent.y * rng.random::<f64>(),
        min.z + extent.z * rng.random::<f64>(),
    )
}
