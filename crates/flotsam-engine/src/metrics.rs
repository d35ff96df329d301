//! Per-step performance metrics for the simulation engine.
//!
//! [`StepMetrics`] captures timing and event counts for a single step.

/// Timing and count metrics collected during a single step.
///
/// All durations are in microseconds. `advance()` fills the phase timings
/// up to migration planning; `commit()` adds the migration application
/// time and completes the total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent emitting and placing new tracers, in microseconds.
    pub emission_us: u64,
    /// Time spent integrating active tracers, in microseconds.
    pub integration_us: u64,
    /// Time spent planning migration, in microseconds.
    pub migration_plan_us: u64,
    /// Time spent applying migration and reclaiming tracers, in microseconds.
    pub migration_apply_us: u64,
    /// Tracers created this step.
    pub emitted: usize,
    /// Tracers moved between blocks.
    pub migrated: usize,
    /// Tracers that left the domain.
    pub exited: usize,
    /// Tracers destroyed for exceeding their lifetime.
    pub expired: usize,
    /// Tracers that beached this step.
    pub beached: usize,
    /// Tracers destroyed because they could not be relocated.
    pub forced_removals: usize,
    /// Tracers relocated after jumping more than `max_cell_skip` cells.
    pub large_displacements: usize,
    /// Live tracers after the step.
    pub live_tracers: usize,
    /// Heap bytes held by all containers after the step.
    pub memory_bytes: usize,
}
