//! Flotsam: a block-decomposed Lagrangian tracer simulator for marine
//! litter transport.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Flotsam sub-crates. For most users, adding `flotsam` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use flotsam::prelude::*;
//!
//! // A 10x10 domain split into 2x2 blocks, with one outfall emitting a
//! // tracer per step.
//! let domain = BoundingBox::new(Point::ZERO, Point::xy(10.0, 10.0)).unwrap();
//! let config = SimulationConfig::new(domain, GridResolution::Cells { nx: 2, ny: 2 }, 1.0)
//!     .with_source(SourceConfig::new(
//!         SourceId(0),
//!         "outfall",
//!         Shape::point(Point::xy(1.0, 1.0)).unwrap(),
//!         1.0,
//!     ));
//!
//! // A uniform current towards the north-east.
//! struct Current;
//! impl VelocitySampler for Current {
//!     fn sample(&self, _p: Point, _t: f64) -> Result<Point, SamplerError> {
//!         Ok(Point::xy(5.0, 5.0))
//!     }
//! }
//!
//! let mut sim = Simulation::new(config).unwrap();
//! let report = sim.step(&Current, &EulerIntegrator).unwrap();
//! assert_eq!(report.step, StepId(1));
//! assert_eq!(sim.tracer_count(), 1);
//!
//! // The tracer drifted from (1, 1) to (6, 6) and now lives in block 3.
//! let tracer = sim.tracers().next().unwrap();
//! assert_eq!(tracer.block, BlockId(3));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `flotsam-core` | Points, IDs, errors, the velocity sampler trait |
//! | [`arena`] | `flotsam-arena` | Generational container arrays |
//! | [`space`] | `flotsam-space` | Bounding boxes, source geometry, the block grid |
//! | [`engine`] | `flotsam-engine` | Tracers, sources, blocks and the stepping loop |
//! | [`checkpoint`] | `flotsam-checkpoint` | Binary save/restore and state hashing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`flotsam-core`).
///
/// Contains [`types::Point`], the identifier newtypes, and the
/// [`types::VelocitySampler`] trait through which flow fields plug in.
pub use flotsam_core as types;

/// Generational container arrays (`flotsam-arena`).
///
/// [`arena::ContainerArray`] holds each block's tracers and sources.
pub use flotsam_arena as arena;

/// Spatial types (`flotsam-space`).
///
/// [`space::BoundingBox`], [`space::Shape`] for source geometry, and
/// [`space::BlockGrid`] for the domain decomposition.
pub use flotsam_space as space;

/// The simulation engine (`flotsam-engine`).
pub use flotsam_engine as engine;

/// Checkpointing and determinism hashes (`flotsam-checkpoint`).
///
/// Save a running simulation with [`checkpoint::save`] and resume it with
/// [`checkpoint::restore`].
pub use flotsam_checkpoint as checkpoint;

/// Common imports for typical Flotsam usage.
///
/// ```rust
/// use flotsam::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use flotsam_core::{
        BlockId, Point, SamplerError, SourceId, StepError, StepId, TracerId, VelocitySampler,
    };

    // Space
    pub use flotsam_space::{BlockGrid, BoundingBox, GridResolution, Shape};

    // Engine
    pub use flotsam_engine::{
        ConfigError, EulerIntegrator, Integrator, Simulation, SimulationConfig, SourceConfig,
        StencilPolicy, StepMetrics, StepReport, TracerStatus, TracerVariant,
    };

    // Checkpoint
    pub use flotsam_checkpoint::CheckpointError;
}
