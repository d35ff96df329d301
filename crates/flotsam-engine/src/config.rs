//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the builder input for a [`Simulation`](crate::Simulation).
//! [`validate()`](SimulationConfig::validate) checks every structural
//! invariant at startup; a configuration that fails it never produces a
//! running simulation. After construction the validated values live on in
//! an immutable [`Globals`].

use std::error::Error;
use std::fmt;

use flotsam_arena::ContainerConfig;
use flotsam_core::SourceId;
use flotsam_space::{BlockGrid, BoundingBox, GridResolution, Shape, SpaceError};
use indexmap::IndexSet;

use crate::tracer::TracerVariant;

// ── StencilPolicy ─────────────────────────────────────────────────

/// How a source chooses emission positions from its geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StencilPolicy {
    /// Draw fresh positions every step.
    #[default]
    Resample,
    /// Sample `points` positions once at construction and cycle through
    /// them.
    Fixed {
        /// Stencil size. Must be at least 1.
        points: u32,
    },
}

// ── SourceConfig ──────────────────────────────────────────────────

/// Configuration of one emission source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    /// Unique source id.
    pub id: SourceId,
    /// Human-readable name.
    pub name: String,
    /// Emission geometry.
    pub geometry: Shape,
    /// Tracers per unit time.
    pub rate: f64,
    /// Variant of every tracer this source emits.
    pub variant: TracerVariant,
    /// Start of the active window (inclusive).
    pub start: f64,
    /// End of the active window (exclusive). `None` = never stops.
    pub end: Option<f64>,
    /// Emission position policy.
    pub stencil: StencilPolicy,
}

impl SourceConfig {
    /// A generic, always-on source with a resampled stencil.
    pub fn new(id: SourceId, name: impl Into<String>, geometry: Shape, rate: f64) -> Self {
        Self {
            id,
            name: name.into(),
            geometry,
            rate,
            variant: TracerVariant::Generic,
            start: f64::NEG_INFINITY,
            end: None,
            stencil: StencilPolicy::Resample,
        }
    }

    /// Set the emitted variant.
    pub fn with_variant(mut self, variant: TracerVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Restrict emission to `[start, end)`.
    pub fn with_window(mut self, start: f64, end: Option<f64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set the stencil policy.
    pub fn with_stencil(mut self, stencil: StencilPolicy) -> Self {
        self.stencil = stencil;
        self
    }

    /// Whether `time` lies in the active window.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && self.end.is_none_or(|end| time < end)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(ConfigError::InvalidRate {
                source: self.id,
                value: self.rate,
            });
        }
        let window_ok = !self.start.is_nan()
            && self.start != f64::INFINITY
            && self
                .end
                .is_none_or(|end| end.is_finite() && end > self.start);
        if !window_ok {
            return Err(ConfigError::InvalidWindow {
                source: self.id,
                start: self.start,
                end: self.end,
            });
        }
        if let StencilPolicy::Fixed { points: 0 } = self.stencil {
            return Err(ConfigError::EmptyStencil { source: self.id });
        }
        self.variant
            .validate()
            .map_err(|reason| ConfigError::InvalidVariant {
                source: self.id,
                reason,
            })
    }
}

// ── PhysicalConstants ─────────────────────────────────────────────

/// Physical constants available to integrators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalConstants {
    /// Ambient water density in kg/m³. Default: 1025 (sea water).
    pub water_density: f64,
    /// Gravitational acceleration in m/s². Default: 9.81.
    pub gravity: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            water_density: 1025.0,
            gravity: 9.81,
        }
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`SimulationConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The domain, grid or a source geometry is malformed.
    Space(SpaceError),
    /// Container growth policy is invalid.
    Container {
        /// Description of the violated invariant.
        reason: String,
    },
    /// `dt` is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The invalid value.
        value: f64,
    },
    /// `start_time` is not finite.
    InvalidStartTime {
        /// The invalid value.
        value: f64,
    },
    /// `tracer_lifetime` is set but not finite and positive.
    InvalidLifetime {
        /// The invalid value.
        value: f64,
    },
    /// `max_cell_skip` is zero.
    ZeroCellSkip,
    /// `diagnostics_capacity` is zero.
    ZeroDiagnosticsCapacity,
    /// Two sources share an id.
    DuplicateSource {
        /// The repeated id.
        id: SourceId,
    },
    /// A source's emission rate is negative or not finite.
    InvalidRate {
        /// Offending source.
        source: SourceId,
        /// The invalid value.
        value: f64,
    },
    /// A source's active window is empty or not well formed.
    InvalidWindow {
        /// Offending source.
        source: SourceId,
        /// Window start.
        start: f64,
        /// Window end.
        end: Option<f64>,
    },
    /// A fixed stencil was configured with zero points.
    EmptyStencil {
        /// Offending source.
        source: SourceId,
    },
    /// A source's tracer variant has out-of-range parameters.
    InvalidVariant {
        /// Offending source.
        source: SourceId,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space(e) => write!(f, "space: {e}"),
            Self::Container { reason } => write!(f, "container config: {reason}"),
            Self::InvalidDt { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::InvalidStartTime { value } => {
                write!(f, "start_time must be finite, got {value}")
            }
            Self::InvalidLifetime { value } => {
                write!(f, "tracer_lifetime must be finite and positive, got {value}")
            }
            Self::ZeroCellSkip => write!(f, "max_cell_skip must be at least 1"),
            Self::ZeroDiagnosticsCapacity => {
                write!(f, "diagnostics_capacity must be at least 1")
            }
            Self::DuplicateSource { id } => write!(f, "duplicate source id {id}"),
            Self::InvalidRate { source, value } => {
                write!(
                    f,
                    "source {source}: rate must be finite and non-negative, got {value}"
                )
            }
            Self::InvalidWindow { source, start, end } => match end {
                Some(end) => write!(f, "source {source}: invalid window [{start}, {end})"),
                None => write!(f, "source {source}: invalid window start {start}"),
            },
            Self::EmptyStencil { source } => {
                write!(f, "source {source}: fixed stencil needs at least one point")
            }
            Self::InvalidVariant { source, reason } => {
                write!(f, "source {source}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

// ── SimulationConfig ──────────────────────────────────────────────

/// Complete configuration for constructing a simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Global domain box.
    pub domain: BoundingBox,
    /// Block decomposition.
    pub resolution: GridResolution,
    /// Time step.
    pub dt: f64,
    /// Simulation time at step 0. Default: 0.
    pub start_time: f64,
    /// Seed for all emission sampling. Default: 0.
    pub seed: u64,
    /// Tracers older than this are destroyed. Default: `None`.
    pub tracer_lifetime: Option<f64>,
    /// Largest per-step displacement, in cells, accepted without a
    /// large-displacement warning. Default: 1.
    pub max_cell_skip: u32,
    /// Growth policy for every block's containers.
    pub container: ContainerConfig,
    /// Physical constants passed to integrators.
    pub constants: PhysicalConstants,
    /// Number of recent diagnostic events retained. Default: 256.
    pub diagnostics_capacity: usize,
    /// Emission sources.
    pub sources: Vec<SourceConfig>,
}

impl SimulationConfig {
    /// A configuration with defaults for everything but the domain,
    /// resolution and time step. No sources.
    pub fn new(domain: BoundingBox, resolution: GridResolution, dt: f64) -> Self {
        Self {
            domain,
            resolution,
            dt,
            start_time: 0.0,
            seed: 0,
            tracer_lifetime: None,
            max_cell_skip: 1,
            container: ContainerConfig::default(),
            constants: PhysicalConstants::default(),
            diagnostics_capacity: 256,
            sources: Vec::new(),
        }
    }

    /// Add a source.
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_grid()?;
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { value: self.dt });
        }
        if !self.start_time.is_finite() {
            return Err(ConfigError::InvalidStartTime {
                value: self.start_time,
            });
        }
        if let Some(l) = self.tracer_lifetime {
            if !l.is_finite() || l <= 0.0 {
                return Err(ConfigError::InvalidLifetime { value: l });
            }
        }
        if self.max_cell_skip == 0 {
            return Err(ConfigError::ZeroCellSkip);
        }
        if self.diagnostics_capacity == 0 {
            return Err(ConfigError::ZeroDiagnosticsCapacity);
        }
        self.container
            .validate()
            .map_err(|reason| ConfigError::Container { reason })?;

        let mut seen = IndexSet::with_capacity(self.sources.len());
        for source in &self.sources {
            if !seen.insert(source.id) {
                return Err(ConfigError::DuplicateSource { id: source.id });
            }
            source.validate()?;
        }
        Ok(())
    }

    pub(crate) fn build_grid(&self) -> Result<BlockGrid, ConfigError> {
        Ok(BlockGrid::from_resolution(self.domain, self.resolution)?)
    }
}

// ── Globals ───────────────────────────────────────────────────────

/// Immutable context shared by every phase of a step.
///
/// Built once from a validated [`SimulationConfig`] and passed explicitly
/// to emission, integration and migration.
#[derive(Clone, Debug, PartialEq)]
pub struct Globals {
    /// The block grid (and through it, the domain).
    pub grid: BlockGrid,
    /// Time step.
    pub dt: f64,
    /// Emission seed.
    pub seed: u64,
    /// Maximum tracer age, if any.
    pub tracer_lifetime: Option<f64>,
    /// Large-displacement threshold in cells.
    pub max_cell_skip: u32,
    /// Physical constants.
    pub constants: PhysicalConstants,
}

impl Globals {
    /// Validate `config` and extract the immutable context.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: config.build_grid()?,
            dt: config.dt,
            seed: config.seed,
            tracer_lifetime: config.tracer_lifetime,
            max_cell_skip: config.max_cell_skip,
            constants: config.constants,
        })
    }
}
