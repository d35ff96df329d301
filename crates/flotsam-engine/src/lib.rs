//! Block-decomposed tracer simulation engine.
//!
//! [`Simulation`] owns a regular grid of [`Block`]s, each holding the
//! tracers currently inside it and the sources anchored to it. A step
//! emits new tracers, integrates every active tracer against an external
//! [`VelocitySampler`](flotsam_core::VelocitySampler), and then migrates
//! tracers whose new position left their block.
//!
//! Migration is planned per block in parallel and applied serially. The
//! plan is returned as a [`PendingMigration`] so a caller can abort the
//! step before any cross-block mutation happens.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod config;
pub mod diagnostics;
pub mod integrator;
pub mod memory;
pub mod metrics;
pub mod migration;
pub mod source;
pub mod tracer;
pub mod world;

pub use block::{Block, StatusCounts};
pub use config::{
    ConfigError, Globals, PhysicalConstants, SimulationConfig, SourceConfig, StencilPolicy,
};
pub use diagnostics::{DiagnosticCounters, DiagnosticEvent, Diagnostics};
pub use integrator::{Advance, EulerIntegrator, IntegrationContext, Integrator};
pub use memory::{BlockMemory, MemoryReport};
pub use metrics::StepMetrics;
pub use migration::{Destination, MigrationPlan, Move};
pub use source::{Emission, Source, SourceStats};
pub use tracer::{
    IntegrationHint, PaperParams, PlasticParams, Polymer, Tracer, TracerState, TracerStatus,
    TracerVariant, VariantKind,
};
pub use world::{
    BlockState, PendingMigration, RestoreError, Simulation, SimulationState, StepReport,
    TracerRecord,
};
