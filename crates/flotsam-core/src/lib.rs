//! Core types and traits for the Flotsam tracer simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Flotsam workspace:
//! the [`Point`] value type, strongly-typed IDs, step-level error types,
//! and the [`VelocitySampler`] seam through which external forcing enters
//! the simulation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod point;
pub mod traits;

pub use error::{SamplerError, StepError};
pub use id::{BlockId, SourceId, StepId, TracerId};
pub use point::Point;
pub use traits::VelocitySampler;
