//! Error types shared across the Flotsam workspace.
//!
//! Step-level failures are fatal for the step they occur in and are
//! propagated to the caller. Recoverable conditions (large displacements,
//! forced removals) are reported through diagnostics instead.

use std::error::Error;
use std::fmt;

use crate::id::{BlockId, TracerId};

/// Errors from the simulation step loop.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The velocity sampler failed for a tracer.
    SamplerFailed {
        /// The tracer being integrated.
        tracer: TracerId,
        /// The underlying sampler error.
        reason: SamplerError,
    },
    /// A container could not grow to hold more elements.
    AllocationFailed {
        /// Slots requested by the growth step.
        requested: usize,
        /// Configured capacity limit.
        limit: usize,
    },
    /// A slot handle referred to a free or reused slot.
    ///
    /// Always a contract violation inside the core.
    StaleIndex {
        /// Block whose container was addressed.
        block: BlockId,
        /// Raw slot index of the handle.
        index: u32,
    },
    /// A container reported an inconsistent layout mid-step.
    ///
    /// Layout checks belong to checkpoint restore, so this is a contract
    /// violation inside the core, like [`StaleIndex`](Self::StaleIndex).
    CorruptContainer {
        /// Block whose container was addressed.
        block: BlockId,
        /// The container's description of the problem.
        detail: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamplerFailed { tracer, reason } => {
                write!(f, "velocity sampling failed for tracer {tracer}: {reason}")
            }
            Self::AllocationFailed { requested, limit } => {
                write!(
                    f,
                    "container allocation failed: requested {requested} slots, limit {limit}"
                )
            }
            Self::StaleIndex { block, index } => {
                write!(f, "stale slot index {index} in block {block}")
            }
            Self::CorruptContainer { block, detail } => {
                write!(f, "corrupt container in block {block}: {detail}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SamplerFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Errors reported by a [`VelocitySampler`](crate::VelocitySampler).
#[derive(Clone, Debug, PartialEq)]
pub enum SamplerError {
    /// The position lies outside the forcing field's coverage.
    OutOfCoverage {
        /// Human-readable description of the position.
        position: String,
    },
    /// No forcing data is available for the requested time.
    NoData {
        /// The requested simulation time.
        time: f64,
    },
    /// Any other sampler failure.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfCoverage { position } => {
                write!(f, "position {position} outside forcing coverage")
            }
            Self::NoData { time } => write!(f, "no forcing data at time {time}"),
            Self::Failed { reason } => write!(f, "sampler failed: {reason}"),
        }
    }
}

impl Error for SamplerError {}
