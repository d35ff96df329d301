//! A spatial block: one grid cell's box plus the tracers and sources in it.

use std::fmt;

use flotsam_arena::{ContainerArray, ContainerConfig, ContainerError, ContainerFootprint, SlotIndex};
use flotsam_core::{BlockId, Point};
use flotsam_space::BoundingBox;

use crate::source::Source;
use crate::tracer::{Tracer, TracerStatus};

/// Tracer counts per lifecycle stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Emitted this step.
    pub spawned: usize,
    /// Moving.
    pub active: usize,
    /// Beached.
    pub inactive: usize,
    /// Awaiting reclamation.
    pub exited: usize,
}

impl StatusCounts {
    /// Sum of all stages.
    pub fn total(&self) -> usize {
        self.spawned + self.active + self.inactive + self.exited
    }
}

/// One cell of the block grid.
///
/// Owns the tracers currently inside its box and the sources anchored to
/// it. Every active tracer lies inside `bbox` after each committed
/// migration.
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockId,
    bbox: BoundingBox,
    tracers: ContainerArray<Tracer>,
    sources: ContainerArray<Source>,
}

impl Block {
    /// An empty block.
    pub fn new(id: BlockId, bbox: BoundingBox, config: &ContainerConfig) -> Self {
        Self {
            id,
            bbox,
            tracers: ContainerArray::new(config.clone()),
            sources: ContainerArray::new(config.clone()),
        }
    }

    /// A block around existing containers.
    pub fn from_parts(
        id: BlockId,
        bbox: BoundingBox,
        tracers: ContainerArray<Tracer>,
        sources: ContainerArray<Source>,
    ) -> Self {
        Self {
            id,
            bbox,
            tracers,
            sources,
        }
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Closed extent.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether `p` lies inside the block's box.
    pub fn contains(&self, p: &Point) -> bool {
        self.bbox.contains(p)
    }

    /// Take ownership of a tracer.
    pub fn put_tracer(&mut self, tracer: Tracer) -> Result<SlotIndex, ContainerError> {
        self.tracers.put(tracer)
    }

    /// Make room for `additional` tracers so the next that many
    /// [`put_tracer`](Self::put_tracer) calls cannot fail.
    pub fn reserve_tracers(&mut self, additional: usize) -> Result<(), ContainerError> {
        self.tracers.reserve(additional)
    }

    /// Give up a tracer.
    pub fn remove_tracer(&mut self, index: SlotIndex) -> Result<Tracer, ContainerError> {
        self.tracers.remove(index)
    }

    /// Look up a tracer.
    pub fn tracer(&self, index: SlotIndex) -> Result<&Tracer, ContainerError> {
        self.tracers.get(index)
    }

    /// Take ownership of a source.
    pub fn put_source(&mut self, source: Source) -> Result<SlotIndex, ContainerError> {
        self.sources.put(source)
    }

    /// Look up a source.
    pub fn source(&self, index: SlotIndex) -> Result<&Source, ContainerError> {
        self.sources.get(index)
    }

    /// Look up a source for emission.
    pub fn source_mut(&mut self, index: SlotIndex) -> Result<&mut Source, ContainerError> {
        self.sources.get_mut(index)
    }

    /// Tracers in slot order.
    pub fn tracers(&self) -> impl Iterator<Item = (SlotIndex, &Tracer)> + '_ {
        self.tracers.iter()
    }

    /// Mutable tracers in slot order.
    pub fn tracers_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut Tracer)> + '_ {
        self.tracers.iter_mut()
    }

    /// Sources in slot order.
    pub fn sources(&self) -> impl Iterator<Item = (SlotIndex, &Source)> + '_ {
        self.sources.iter()
    }

    /// The tracer container itself.
    pub fn tracer_container(&self) -> &ContainerArray<Tracer> {
        &self.tracers
    }

    /// The source container itself.
    pub fn source_container(&self) -> &ContainerArray<Source> {
        &self.sources
    }

    /// Remove every tracer matching `pred`.
    pub fn remove_tracers_where(
        &mut self,
        pred: impl FnMut(&Tracer) -> bool,
    ) -> Vec<(SlotIndex, Tracer)> {
        self.tracers.remove_where(pred)
    }

    /// Number of tracers held.
    pub fn tracer_count(&self) -> usize {
        self.tracers.len()
    }

    /// Number of sources held.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Tracers per lifecycle stage.
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for t in self.tracers.values() {
            match t.status() {
                TracerStatus::Spawned => counts.spawned += 1,
                TracerStatus::Active => counts.active += 1,
                TracerStatus::Inactive => counts.inactive += 1,
                TracerStatus::Exited => counts.exited += 1,
            }
        }
        counts
    }

    /// Tracer and source container footprints.
    pub fn footprint(&self) -> (ContainerFootprint, ContainerFootprint) {
        (self.tracers.footprint(), self.sources.footprint())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.status_counts();
        write!(
            f,
            "block {} {}: {} tracers ({} active, {} inactive), {} sources",
            self.id,
            self.bbox,
            c.total(),
            c.active,
            c.inactive,
            self.sources.len()
        )
    }
}
