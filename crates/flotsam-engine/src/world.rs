//! The simulation: blocks, sources and the step loop.
//!
//! [`Simulation`] owns every block and drives a step in five phases:
//!
//! 1. **Emission** (serial): each source plans its new tracers, and each
//!    tracer is staged for the block located from its position.
//! 2. **Integration** (parallel per block): spawned tracers are promoted,
//!    active tracers are advanced, all tracers age. Results are computed
//!    from read-only blocks, then applied together with the staged
//!    emission once every block has succeeded.
//! 3. **Planning** (parallel per block): [`MigrationPlan::build`].
//! 4. **Clock**: step counter and time advance.
//! 5. **Commit** (serial): moves are applied, exited and expired tracers
//!    are reclaimed, memory accounting is refreshed.
//!
//! Phases 1-4 run in [`Simulation::advance`], which returns a
//! [`PendingMigration`]. An error in phases 1-2 leaves the simulation as
//! it was, so the same step can be retried. Dropping the pending migration
//! (or calling [`abort`](PendingMigration::abort)) skips phase 5: no tracer
//! crosses a block boundary and every container stays consistent. The
//! next step re-plans from scratch.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use flotsam_arena::{ContainerArray, ContainerError, ContainerLayout, SlotIndex};
use flotsam_core::{BlockId, Point, SourceId, StepError, StepId, TracerId, VelocitySampler};
use flotsam_space::BlockGrid;
use indexmap::IndexMap;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::block::Block;
use crate::config::{ConfigError, Globals, SimulationConfig, SourceConfig};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::integrator::{IntegrationContext, Integrator};
use crate::memory::MemoryReport;
use crate::metrics::StepMetrics;
use crate::migration::{Destination, MigrationPlan};
use crate::source::{Emission, Source, SourceStats};
use crate::tracer::{Tracer, TracerStatus, TracerVariant};

// ── Output records ────────────────────────────────────────────────

/// One tracer as seen by an output writer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracerRecord {
    /// Tracer id.
    pub id: TracerId,
    /// Emitting source.
    pub source: SourceId,
    /// Block holding (or last holding) the tracer.
    pub block: BlockId,
    /// Position.
    pub position: Point,
    /// Velocity applied in the last integration.
    pub velocity: Point,
    /// Time since emission.
    pub age: f64,
    /// Lifecycle stage.
    pub status: TracerStatus,
    /// Physical variant.
    pub variant: TracerVariant,
}

impl TracerRecord {
    fn new(block: BlockId, tracer: &Tracer) -> Self {
        let state = tracer.state();
        Self {
            id: tracer.id(),
            source: tracer.source(),
            block,
            position: state.position,
            velocity: state.velocity,
            age: state.age,
            status: state.status,
            variant: *tracer.variant(),
        }
    }
}

/// Result of a committed step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// The step that was executed.
    pub step: StepId,
    /// Simulation time at the end of the step.
    pub time: f64,
    /// Tracers that left the domain, with their last position.
    pub exited: Vec<TracerRecord>,
    /// Tracers destroyed for reaching their lifetime.
    pub expired: Vec<TracerRecord>,
    /// Timings and counts.
    pub metrics: StepMetrics,
}

// ── Persisted state ───────────────────────────────────────────────

/// Everything needed to rebuild one block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockState {
    /// Tracer container layout.
    pub tracers: ContainerLayout,
    /// Tracers by raw slot index.
    pub tracer_slots: Vec<(u32, Tracer)>,
    /// Source container layout.
    pub sources: ContainerLayout,
    /// Source id and statistics by raw slot index.
    pub source_slots: Vec<(u32, SourceId, SourceStats)>,
}

/// The complete mutable state of a simulation.
///
/// Together with the [`SimulationConfig`] it was produced under, this
/// reconstructs a simulation that continues exactly as the original would.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Steps executed.
    pub step: StepId,
    /// Current simulation time.
    pub time: f64,
    /// Next tracer id to hand out.
    pub next_tracer_id: u64,
    /// Per-block state, in block id order.
    pub blocks: Vec<BlockState>,
}

/// Errors rebuilding a simulation from a [`SimulationState`].
#[derive(Debug, PartialEq)]
pub enum RestoreError {
    /// The configuration itself is invalid.
    Config(ConfigError),
    /// The state has a different number of blocks than the grid.
    BlockCount {
        /// Blocks in the configured grid.
        expected: usize,
        /// Blocks in the state.
        got: usize,
    },
    /// A container layout is inconsistent.
    Container {
        /// Block whose container failed.
        block: BlockId,
        /// The underlying error.
        error: ContainerError,
    },
    /// The state holds a source the configuration does not define.
    UnknownSource {
        /// The source.
        id: SourceId,
    },
    /// A configured source is absent from the state.
    MissingSource {
        /// The source.
        id: SourceId,
    },
    /// A source appears more than once in the state.
    DuplicateSource {
        /// The source.
        id: SourceId,
    },
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::BlockCount { expected, got } => {
                write!(f, "state has {got} blocks, grid has {expected}")
            }
            Self::Container { block, error } => write!(f, "block {block}: {error}"),
            Self::UnknownSource { id } => write!(f, "state holds unknown source {id}"),
            Self::MissingSource { id } => write!(f, "source {id} missing from state"),
            Self::DuplicateSource { id } => write!(f, "source {id} appears twice in state"),
        }
    }
}

impl Error for RestoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Container { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigError> for RestoreError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ── Simulation ────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct SourceLocation {
    block: BlockId,
    slot: SlotIndex,
    footprint: SmallVec<[BlockId; 4]>,
}

/// A running tracer simulation.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    globals: Globals,
    blocks: Vec<Block>,
    /// Source id to owning block and slot, in configuration order.
    source_index: IndexMap<SourceId, SourceLocation>,
    next_tracer_id: u64,
    step: StepId,
    time: f64,
    diagnostics: Diagnostics,
    memory: MemoryReport,
    last_metrics: StepMetrics,
}

impl Simulation {
    /// Validate `config` and build the grid, blocks and sources.
    ///
    /// Each source is owned by the block containing the centre of its
    /// bounding box (clamped into the domain).
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let globals = Globals::from_config(&config)?;
        let grid = &globals.grid;
        let mut blocks: Vec<Block> = grid
            .ids()
            .map(|id| Block::new(id, grid.block_box(id), &config.container))
            .collect();

        let mut source_index = IndexMap::with_capacity(config.sources.len());
        for sc in &config.sources {
            let (owner, footprint) = anchor(grid, sc);
            let slot = blocks[owner.index()]
                .put_source(Source::new(sc.clone(), config.seed))
                .map_err(|e| ConfigError::Container {
                    reason: e.to_string(),
                })?;
            source_index.insert(
                sc.id,
                SourceLocation {
                    block: owner,
                    slot,
                    footprint,
                },
            );
        }

        tracing::info!(
            blocks = blocks.len(),
            sources = source_index.len(),
            "simulation initialised on {}",
            grid
        );

        let memory = MemoryReport::collect(&blocks);
        Ok(Self {
            step: StepId(0),
            time: config.start_time,
            diagnostics: Diagnostics::new(config.diagnostics_capacity),
            config,
            globals,
            blocks,
            source_index,
            next_tracer_id: 0,
            memory,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Run emission, integration and migration planning for one step.
    ///
    /// On error nothing observable changes: no tracer is emitted, moved or
    /// aged, source statistics and the clock stay put, and retrying the
    /// step emits the same tracers. Containers may keep capacity reserved
    /// for the failed step.
    pub fn advance<S, I>(
        &mut self,
        sampler: &S,
        integrator: &I,
    ) -> Result<PendingMigration<'_>, StepError>
    where
        S: VelocitySampler + ?Sized,
        I: Integrator + ?Sized,
    {
        let started = Instant::now();
        let mut metrics = StepMetrics::default();

        let phase = Instant::now();
        let mut staged = self.stage_emission()?;
        metrics.emitted = staged.emitted;
        metrics.emission_us = phase.elapsed().as_micros() as u64;

        let phase = Instant::now();
        let domain = self.globals.grid.domain();
        let constants = self.globals.constants;
        let ctx = IntegrationContext {
            time: self.time,
            dt: self.globals.dt,
            domain: &domain,
            constants: &constants,
        };
        let integrated: Vec<BlockIntegration> = self
            .blocks
            .par_iter()
            .zip(staged.tracers.par_iter_mut())
            .map(|(block, fresh)| integrate_block(block, fresh, sampler, integrator, &ctx))
            .collect::<Result<_, StepError>>()?;
        for (block, fresh) in self.blocks.iter_mut().zip(&staged.tracers) {
            block
                .reserve_tracers(fresh.len())
                .map_err(|e| step_error(block.id(), e))?;
        }
        metrics.beached = integrated.iter().map(|b| b.beached).sum();
        self.apply_step(integrated, staged)?;
        metrics.integration_us = phase.elapsed().as_micros() as u64;

        let phase = Instant::now();
        let plan = MigrationPlan::build(
            &self.blocks,
            &self.globals.grid,
            self.globals.tracer_lifetime,
            self.globals.max_cell_skip,
        );
        metrics.migration_plan_us = phase.elapsed().as_micros() as u64;

        let step = self.step;
        self.step = StepId(step.0 + 1);
        self.time = self.config.start_time + self.step.0 as f64 * self.globals.dt;

        Ok(PendingMigration {
            sim: self,
            plan,
            step,
            metrics,
            started,
        })
    }

    /// [`advance`](Self::advance) followed by [`commit`](PendingMigration::commit).
    pub fn step<S, I>(&mut self, sampler: &S, integrator: &I) -> Result<StepReport, StepError>
    where
        S: VelocitySampler + ?Sized,
        I: Integrator + ?Sized,
    {
        self.advance(sampler, integrator)?.commit()
    }

    /// Plan every source's emission for the current step, in
    /// configuration order, without changing anything.
    fn stage_emission(&self) -> Result<StagedEmission, StepError> {
        let grid = &self.globals.grid;
        let max_capacity = self.config.container.max_capacity;
        let mut staged = StagedEmission {
            tracers: (0..self.blocks.len()).map(|_| Vec::new()).collect(),
            stats: Vec::with_capacity(self.source_index.len()),
            outside: Vec::new(),
            next_tracer_id: self.next_tracer_id,
            emitted: 0,
        };
        for (&id, loc) in &self.source_index {
            let source = self.blocks[loc.block.index()]
                .source(loc.slot)
                .map_err(|e| step_error(loc.block, e))?;
            // The footprint bounds where the positions can land.
            let limit = max_capacity.saturating_mul(loc.footprint.len().max(1));
            let Emission { positions, stats } = source.plan_emission(
                self.time,
                self.globals.dt,
                self.step,
                self.globals.seed,
                limit,
            )?;
            let variant = source.config().variant;
            for position in positions {
                let Some(target) = grid.locate(&position) else {
                    staged.outside.push(DiagnosticEvent::EmissionOutsideDomain {
                        step: self.step,
                        source: id,
                        position,
                    });
                    continue;
                };
                let tracer = Tracer::spawn(TracerId(staged.next_tracer_id), id, position, variant);
                staged.tracers[target.index()].push(tracer);
                staged.next_tracer_id += 1;
                staged.emitted += 1;
            }
            staged.stats.push((loc.block, loc.slot, stats));
        }
        Ok(staged)
    }

    /// Write back integrated tracers, insert the staged ones and adopt the
    /// new source statistics.
    fn apply_step(
        &mut self,
        integrated: Vec<BlockIntegration>,
        staged: StagedEmission,
    ) -> Result<(), StepError> {
        self.blocks
            .par_iter_mut()
            .zip(integrated)
            .zip(staged.tracers)
            .try_for_each(|((block, result), fresh)| {
                for ((_, tracer), updated) in block.tracers_mut().zip(result.tracers) {
                    *tracer = updated;
                }
                // Capacity was reserved, so these puts do not fail.
                for tracer in fresh {
                    block
                        .put_tracer(tracer)
                        .map_err(|e| step_error(block.id(), e))?;
                }
                Ok::<(), StepError>(())
            })?;
        for (block, slot, stats) in staged.stats {
            self.blocks[block.index()]
                .source_mut(slot)
                .map_err(|e| step_error(block, e))?
                .set_stats(stats);
        }
        for event in staged.outside {
            self.diagnostics.record(event);
        }
        self.next_tracer_id = staged.next_tracer_id;
        Ok(())
    }

    /// Every live tracer, block by block in slot order.
    pub fn tracers(&self) -> impl Iterator<Item = TracerRecord> + '_ {
        self.blocks.iter().flat_map(|block| {
            block
                .tracers()
                .map(move |(_, tracer)| TracerRecord::new(block.id(), tracer))
        })
    }

    /// Number of live tracers.
    pub fn tracer_count(&self) -> usize {
        self.blocks.iter().map(Block::tracer_count).sum()
    }

    /// Blocks overlapped by a source's bounding box.
    pub fn source_footprint(&self, id: SourceId) -> Option<&[BlockId]> {
        self.source_index.get(&id).map(|loc| loc.footprint.as_slice())
    }

    /// Block that owns a source.
    pub fn source_owner(&self, id: SourceId) -> Option<BlockId> {
        self.source_index.get(&id).map(|loc| loc.block)
    }

    /// Look up a source.
    pub fn source(&self, id: SourceId) -> Option<&Source> {
        let loc = self.source_index.get(&id)?;
        self.blocks[loc.block.index()].source(loc.slot).ok()
    }

    /// All sources in configuration order.
    pub fn sources(&self) -> impl Iterator<Item = &Source> + '_ {
        self.source_index
            .values()
            .filter_map(|loc| self.blocks[loc.block.index()].source(loc.slot).ok())
    }

    /// All blocks in id order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// A single block.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// The block grid.
    pub fn grid(&self) -> &BlockGrid {
        &self.globals.grid
    }

    /// The immutable step context.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// The configuration this simulation was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps executed so far.
    pub fn current_step(&self) -> StepId {
        self.step
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Id the next emitted tracer will get.
    pub fn next_tracer_id(&self) -> TracerId {
        TracerId(self.next_tracer_id)
    }

    /// Diagnostic counters and recent events.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Container footprints as of the last committed step.
    pub fn memory_report(&self) -> &MemoryReport {
        &self.memory
    }

    /// Metrics of the last committed step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Capture the full mutable state.
    pub fn state(&self) -> SimulationState {
        SimulationState {
            step: self.step,
            time: self.time,
            next_tracer_id: self.next_tracer_id,
            blocks: self
                .blocks
                .iter()
                .map(|b| BlockState {
                    tracers: b.tracer_container().layout(),
                    tracer_slots: b
                        .tracers()
                        .map(|(slot, t)| (slot.index(), t.clone()))
                        .collect(),
                    sources: b.source_container().layout(),
                    source_slots: b
                        .sources()
                        .map(|(slot, s)| (slot.index(), s.id(), *s.stats()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Rebuild a simulation from `config` and a captured state.
    ///
    /// Sources are rebuilt from their configuration with the saved
    /// statistics; fixed stencils are re-sampled from the seed, which
    /// reproduces them exactly.
    pub fn from_state(
        config: SimulationConfig,
        state: SimulationState,
    ) -> Result<Self, RestoreError> {
        let globals = Globals::from_config(&config)?;
        let grid = &globals.grid;
        if state.blocks.len() != grid.block_count() {
            return Err(RestoreError::BlockCount {
                expected: grid.block_count(),
                got: state.blocks.len(),
            });
        }
        let configs: IndexMap<SourceId, &SourceConfig> =
            config.sources.iter().map(|s| (s.id, s)).collect();

        let mut blocks = Vec::with_capacity(state.blocks.len());
        let mut placed: IndexMap<SourceId, (BlockId, SlotIndex)> = IndexMap::new();
        for (id, bs) in grid.ids().zip(state.blocks) {
            let container_err = |error| RestoreError::Container { block: id, error };
            let tracers =
                ContainerArray::from_layout(config.container.clone(), bs.tracers, bs.tracer_slots)
                    .map_err(container_err)?;
            let mut elements = Vec::with_capacity(bs.source_slots.len());
            for (slot, sid, stats) in bs.source_slots {
                let sc = configs
                    .get(&sid)
                    .ok_or(RestoreError::UnknownSource { id: sid })?;
                elements.push((slot, Source::with_stats((*sc).clone(), config.seed, stats)));
            }
            let sources = ContainerArray::from_layout(config.container.clone(), bs.sources, elements)
                .map_err(container_err)?;
            for (slot, source) in sources.iter() {
                if placed.insert(source.id(), (id, slot)).is_some() {
                    return Err(RestoreError::DuplicateSource { id: source.id() });
                }
            }
            blocks.push(Block::from_parts(id, grid.block_box(id), tracers, sources));
        }

        let mut source_index = IndexMap::with_capacity(config.sources.len());
        for sc in &config.sources {
            let &(block, slot) = placed
                .get(&sc.id)
                .ok_or(RestoreError::MissingSource { id: sc.id })?;
            let (_, footprint) = anchor(grid, sc);
            source_index.insert(
                sc.id,
                SourceLocation {
                    block,
                    slot,
                    footprint,
                },
            );
        }

        tracing::info!(
            step = state.step.0,
            blocks = blocks.len(),
            "simulation restored"
        );

        let memory = MemoryReport::collect(&blocks);
        Ok(Self {
            diagnostics: Diagnostics::new(config.diagnostics_capacity),
            config,
            globals,
            blocks,
            source_index,
            next_tracer_id: state.next_tracer_id,
            step: state.step,
            time: state.time,
            memory,
            last_metrics: StepMetrics::default(),
        })
    }
}

/// Owning block and footprint of a source.
fn anchor(grid: &BlockGrid, source: &SourceConfig) -> (BlockId, SmallVec<[BlockId; 4]>) {
    let bbox = source.geometry.bounding_box();
    let centre = grid.domain().clamp(bbox.center());
    // A clamped finite point always locates.
    let owner = grid.locate(&centre).unwrap_or(BlockId(0));
    (owner, grid.blocks_overlapping(&bbox))
}

/// Tracers emitted this step but not yet placed in their blocks.
struct StagedEmission {
    /// New tracers per block, in block id order.
    tracers: Vec<Vec<Tracer>>,
    /// Updated statistics per source location.
    stats: Vec<(BlockId, SlotIndex, SourceStats)>,
    /// Emissions that landed outside the domain.
    outside: Vec<DiagnosticEvent>,
    next_tracer_id: u64,
    emitted: usize,
}

/// A block's tracers after integration, in slot order.
struct BlockIntegration {
    tracers: Vec<Tracer>,
    beached: usize,
}

/// Integrate a block's resident tracers into copies, and its freshly
/// staged tracers in place.
fn integrate_block<S, I>(
    block: &Block,
    fresh: &mut [Tracer],
    sampler: &S,
    integrator: &I,
    ctx: &IntegrationContext<'_>,
) -> Result<BlockIntegration, StepError>
where
    S: VelocitySampler + ?Sized,
    I: Integrator + ?Sized,
{
    let mut beached = 0;
    let mut tracers = Vec::with_capacity(block.tracer_count());
    for (_, resident) in block.tracers() {
        let mut tracer = resident.clone();
        beached += integrate_tracer(&mut tracer, sampler, integrator, ctx)? as usize;
        tracers.push(tracer);
    }
    for tracer in fresh.iter_mut() {
        beached += integrate_tracer(tracer, sampler, integrator, ctx)? as usize;
    }
    Ok(BlockIntegration { tracers, beached })
}

/// Promote, advance and age one tracer. Returns whether it beached.
fn integrate_tracer<S, I>(
    tracer: &mut Tracer,
    sampler: &S,
    integrator: &I,
    ctx: &IntegrationContext<'_>,
) -> Result<bool, StepError>
where
    S: VelocitySampler + ?Sized,
    I: Integrator + ?Sized,
{
    let mut beached = false;
    tracer.activate();
    if tracer.is_active() {
        let velocity = sampler
            .sample(tracer.position(), ctx.time)
            .map_err(|reason| StepError::SamplerFailed {
                tracer: tracer.id(),
                reason,
            })?;
        let hint = tracer.variant().integration_hint();
        let advance = integrator.advance(tracer.state(), velocity, &hint, ctx);
        tracer.set_motion(advance.position, advance.velocity);
        if advance.beached {
            tracer.beach();
            beached = true;
        }
    }
    tracer.age_by(ctx.dt);
    Ok(beached)
}

fn step_error(block: BlockId, e: ContainerError) -> StepError {
    match e {
        ContainerError::CapacityExceeded { requested, limit } => {
            StepError::AllocationFailed { requested, limit }
        }
        ContainerError::StaleIndex { index, .. } => StepError::StaleIndex { block, index },
        ContainerError::InvalidLayout { reason } => StepError::CorruptContainer {
            block,
            detail: reason,
        },
    }
}

// ── PendingMigration ──────────────────────────────────────────────

/// A step whose migration has been planned but not applied.
///
/// Holds the simulation mutably, so nothing else can touch it until the
/// migration is committed or aborted.
#[derive(Debug)]
pub struct PendingMigration<'a> {
    sim: &'a mut Simulation,
    plan: MigrationPlan,
    step: StepId,
    metrics: StepMetrics,
    started: Instant,
}

impl PendingMigration<'_> {
    /// The planned moves.
    pub fn plan(&self) -> &MigrationPlan {
        &self.plan
    }

    /// The step being executed.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Apply every planned move and reclaim exited and expired tracers.
    pub fn commit(self) -> Result<StepReport, StepError> {
        let PendingMigration {
            sim,
            plan,
            step,
            mut metrics,
            started,
        } = self;

        let phase = Instant::now();
        let mut exited = Vec::new();
        let mut expired = Vec::new();
        for mv in plan.into_moves() {
            let from = mv.from;
            let mut tracer = sim.blocks[from.index()]
                .remove_tracer(mv.slot)
                .map_err(|e| step_error(from, e))?;
            match mv.destination {
                Destination::Block { to, cells, large } => {
                    if large {
                        metrics.large_displacements += 1;
                        sim.diagnostics.record(DiagnosticEvent::LargeDisplacement {
                            step,
                            tracer: tracer.id(),
                            from,
                            to,
                            cells,
                        });
                    }
                    sim.blocks[to.index()]
                        .put_tracer(tracer)
                        .map_err(|e| step_error(to, e))?;
                    metrics.migrated += 1;
                }
                Destination::Exited => {
                    tracer.exit();
                    exited.push(TracerRecord::new(from, &tracer));
                }
                Destination::Expired => expired.push(TracerRecord::new(from, &tracer)),
                Destination::Unplaceable => {
                    metrics.forced_removals += 1;
                    sim.diagnostics.record(DiagnosticEvent::ForcedRemoval {
                        step,
                        tracer: tracer.id(),
                        block: from,
                        position: mv.position,
                    });
                }
            }
        }
        metrics.exited = exited.len();
        metrics.expired = expired.len();
        metrics.migration_apply_us = phase.elapsed().as_micros() as u64;

        sim.memory = MemoryReport::collect(&sim.blocks);
        metrics.memory_bytes = sim.memory.total_bytes();
        metrics.live_tracers = sim.tracer_count();
        metrics.total_us = started.elapsed().as_micros() as u64;

        tracing::debug!(
            step = step.0,
            emitted = metrics.emitted,
            migrated = metrics.migrated,
            exited = metrics.exited,
            expired = metrics.expired,
            live = metrics.live_tracers,
            "step committed"
        );

        sim.last_metrics = metrics.clone();
        Ok(StepReport {
            step,
            time: sim.time,
            exited,
            expired,
            metrics,
        })
    }

    /// Discard the plan. Tracers stay in their current blocks.
    pub fn abort(self) {
        tracing::debug!(
            step = self.step.0,
            planned = self.plan.len(),
            "migration aborted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StencilPolicy;
    use crate::integrator::EulerIntegrator;
    use flotsam_core::SamplerError;
    use flotsam_space::{BoundingBox, GridResolution, Shape};

    fn still(_: Point, _: f64) -> Result<Point, SamplerError> {
        Ok(Point::ZERO)
    }

    fn diagonal(_: Point, _: f64) -> Result<Point, SamplerError> {
        Ok(Point::xy(5.0, 5.0))
    }

    fn config() -> SimulationConfig {
        let domain = BoundingBox::new(Point::ZERO, Point::xy(10.0, 10.0)).unwrap();
        SimulationConfig::new(domain, GridResolution::Cells { nx: 2, ny: 2 }, 1.0).with_source(
            SourceConfig::new(
                SourceId(0),
                "outfall",
                Shape::point(Point::xy(1.0, 1.0)).unwrap(),
                1.0,
            ),
        )
    }

    #[test]
    fn new_builds_blocks_and_anchors_sources() {
        let sim = Simulation::new(config()).unwrap();
        assert_eq!(sim.blocks().len(), 4);
        assert_eq!(sim.source_owner(SourceId(0)), Some(BlockId(0)));
        assert_eq!(sim.source_footprint(SourceId(0)), Some(&[BlockId(0)][..]));
        assert_eq!(sim.source(SourceId(0)).unwrap().name(), "outfall");
        assert_eq!(sim.tracer_count(), 0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut cfg = config();
        cfg.dt = 0.0;
        assert!(matches!(
            Simulation::new(cfg),
            Err(ConfigError::InvalidDt { .. })
        ));
    }

    #[test]
    fn still_tracer_stays_in_emitting_block() {
        let mut sim = Simulation::new(config()).unwrap();
        let report = sim.step(&still, &EulerIntegrator).unwrap();
        assert_eq!(report.step, StepId(0));
        assert_eq!(report.time, 1.0);
        assert_eq!(report.metrics.emitted, 1);
        let records: Vec<_> = sim.tracers().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].block, BlockId(0));
        assert_eq!(records[0].status, TracerStatus::Active);
        assert_eq!(records[0].age, 1.0);
    }

    #[test]
    fn abort_leaves_tracers_in_place_and_next_step_replans() {
        let mut sim = Simulation::new(config()).unwrap();
        let pending = sim.advance(&diagonal, &EulerIntegrator).unwrap();
        assert_eq!(pending.plan().len(), 1);
        pending.abort();
        let t = sim.tracers().next().unwrap();
        assert_eq!(t.block, BlockId(0));
        assert_eq!(t.position, Point::xy(6.0, 6.0));
        assert_eq!(sim.current_step(), StepId(1));

        // Next step: the first tracer moves to (11, 11) and exits; the new
        // one lands in block 3.
        let report = sim.step(&diagonal, &EulerIntegrator).unwrap();
        assert_eq!(report.exited.len(), 1);
        assert_eq!(report.exited[0].status, TracerStatus::Exited);
        assert_eq!(report.exited[0].position, Point::xy(11.0, 11.0));
        let blocks: Vec<_> = sim.tracers().map(|r| r.block).collect();
        assert_eq!(blocks, vec![BlockId(3)]);
    }

    #[test]
    fn sampler_failure_is_fatal_and_reported() {
        let mut sim = Simulation::new(config()).unwrap();
        let failing = |_: Point, t: f64| -> Result<Point, SamplerError> {
            Err(SamplerError::NoData { time: t })
        };
        let err = sim.step(&failing, &EulerIntegrator).unwrap_err();
        assert_eq!(
            err,
            StepError::SamplerFailed {
                tracer: TracerId(0),
                reason: SamplerError::NoData { time: 0.0 }
            }
        );
        assert_eq!(sim.current_step(), StepId(0));
    }

    #[test]
    fn state_round_trip_preserves_everything() {
        let mut cfg = config();
        cfg.sources[0].stencil = StencilPolicy::Fixed { points: 3 };
        let mut sim = Simulation::new(cfg.clone()).unwrap();
        for _ in 0..3 {
            sim.step(&diagonal, &EulerIntegrator).unwrap();
        }
        let state = sim.state();
        let restored = Simulation::from_state(cfg, state.clone()).unwrap();
        assert_eq!(restored.state(), state);
        assert_eq!(restored.next_tracer_id(), sim.next_tracer_id());
        assert_eq!(
            restored.source(SourceId(0)).unwrap().stencil(),
            sim.source(SourceId(0)).unwrap().stencil()
        );
    }

    #[test]
    fn restore_rejects_wrong_block_count() {
        let sim = Simulation::new(config()).unwrap();
        let mut state = sim.state();
        state.blocks.pop();
        assert_eq!(
            Simulation::from_state(config(), state).unwrap_err(),
            RestoreError::BlockCount {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn restore_rejects_unknown_source() {
        let sim = Simulation::new(config()).unwrap();
        let state = sim.state();
        let mut cfg = config();
        cfg.sources[0].id = SourceId(9);
        assert_eq!(
            Simulation::from_state(cfg, state).unwrap_err(),
            RestoreError::UnknownSource { id: SourceId(0) }
        );
    }

    #[test]
    fn layout_errors_map_to_corrupt_container() {
        let err = step_error(
            BlockId(3),
            ContainerError::InvalidLayout {
                reason: "slot 2 used twice".into(),
            },
        );
        assert_eq!(
            err,
            StepError::CorruptContainer {
                block: BlockId(3),
                detail: "slot 2 used twice".into(),
            }
        );
    }

    #[test]
    fn source_statistics_advance_only_on_success() {
        let mut sim = Simulation::new(config()).unwrap();
        let before = *sim.source(SourceId(0)).unwrap().stats();
        let failing = |_: Point, time: f64| -> Result<Point, SamplerError> {
            Err(SamplerError::NoData { time })
        };
        sim.step(&failing, &EulerIntegrator).unwrap_err();
        assert_eq!(*sim.source(SourceId(0)).unwrap().stats(), before);
        sim.step(&still, &EulerIntegrator).unwrap();
        assert_eq!(sim.source(SourceId(0)).unwrap().stats().particles_emitted, 1);
    }
}
