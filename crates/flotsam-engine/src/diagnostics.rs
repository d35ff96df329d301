//! Recoverable anomalies observed while stepping.
//!
//! Nothing recorded here stops the simulation. Each event is logged at
//! `warn` level, counted, and kept in a bounded ring of recent events.

use std::collections::VecDeque;
use std::fmt;

use flotsam_core::{BlockId, Point, SourceId, StepId, TracerId};

/// A recoverable anomaly.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticEvent {
    /// A tracer moved further than `max_cell_skip` cells in one step and
    /// was relocated by a full grid lookup.
    LargeDisplacement {
        /// Step in which it happened.
        step: StepId,
        /// The tracer.
        tracer: TracerId,
        /// Block it left.
        from: BlockId,
        /// Block it landed in.
        to: BlockId,
        /// Chebyshev distance in cells.
        cells: u32,
    },
    /// A tracer could not be relocated (non-finite position) and was
    /// destroyed.
    ForcedRemoval {
        /// Step in which it happened.
        step: StepId,
        /// The tracer.
        tracer: TracerId,
        /// Block that held it.
        block: BlockId,
        /// The offending position.
        position: Point,
    },
    /// A source produced a position outside the domain; no tracer was
    /// created for it.
    EmissionOutsideDomain {
        /// Step in which it happened.
        step: StepId,
        /// The source.
        source: SourceId,
        /// The rejected position.
        position: Point,
    },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeDisplacement {
                step,
                tracer,
                from,
                to,
                cells,
            } => write!(
                f,
                "step {step}: tracer {tracer} jumped {cells} cells from block {from} to {to}"
            ),
            Self::ForcedRemoval {
                step,
                tracer,
                block,
                position,
            } => write!(
                f,
                "step {step}: tracer {tracer} in block {block} removed at unplaceable position {position}"
            ),
            Self::EmissionOutsideDomain {
                step,
                source,
                position,
            } => write!(
                f,
                "step {step}: source {source} emitted outside the domain at {position}"
            ),
        }
    }
}

/// Cumulative event counts since the simulation started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticCounters {
    /// [`DiagnosticEvent::LargeDisplacement`] events.
    pub large_displacements: u64,
    /// [`DiagnosticEvent::ForcedRemoval`] events.
    pub forced_removals: u64,
    /// [`DiagnosticEvent::EmissionOutsideDomain`] events.
    pub emissions_outside_domain: u64,
}

/// Event counters plus a bounded ring of the most recent events.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    capacity: usize,
    recent: VecDeque<DiagnosticEvent>,
    counters: DiagnosticCounters,
}

impl Diagnostics {
    /// Keep at most `capacity` recent events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            recent: VecDeque::with_capacity(capacity),
            counters: DiagnosticCounters::default(),
        }
    }

    /// Log, count and retain an event, evicting the oldest if full.
    pub fn record(&mut self, event: DiagnosticEvent) {
        tracing::warn!("{event}");
        match event {
            DiagnosticEvent::LargeDisplacement { .. } => self.counters.large_displacements += 1,
            DiagnosticEvent::ForcedRemoval { .. } => self.counters.forced_removals += 1,
            DiagnosticEvent::EmissionOutsideDomain { .. } => {
                self.counters.emissions_outside_domain += 1
            }
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// Recent events, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &DiagnosticEvent> + '_ {
        self.recent.iter()
    }

    /// Cumulative counts.
    pub fn counters(&self) -> DiagnosticCounters {
        self.counters
    }

    /// Ring capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
