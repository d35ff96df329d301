//! Container memory accounting.

use std::fmt::{self, Write as _};

use flotsam_arena::ContainerFootprint;
use flotsam_core::BlockId;

use crate::block::Block;

/// Footprints of one block's containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockMemory {
    /// The block.
    pub block: BlockId,
    /// Tracer container.
    pub tracers: ContainerFootprint,
    /// Source container.
    pub sources: ContainerFootprint,
}

/// Per-block and total container footprints.
///
/// Passive bookkeeping, refreshed after every committed step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryReport {
    /// One row per block, in block id order.
    pub blocks: Vec<BlockMemory>,
    /// Sum of all tracer containers.
    pub tracers: ContainerFootprint,
    /// Sum of all source containers.
    pub sources: ContainerFootprint,
}

impl MemoryReport {
    /// Collect footprints from `blocks`.
    pub fn collect<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Self {
        let mut report = MemoryReport::default();
        for block in blocks {
            let (tracers, sources) = block.footprint();
            report.tracers.accumulate(&tracers);
            report.sources.accumulate(&sources);
            report.blocks.push(BlockMemory {
                block: block.id(),
                tracers,
                sources,
            });
        }
        report
    }

    /// Heap bytes held by every container.
    pub fn total_bytes(&self) -> usize {
        self.tracers.bytes + self.sources.bytes
    }

    /// A table with one row per block.
    pub fn detailed(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>6} {:>10} {:>10} {:>12} {:>8} {:>8}",
            "block", "tracers", "capacity", "bytes", "sources", "bytes"
        );
        for row in &self.blocks {
            let _ = writeln!(
                out,
                "{:>6} {:>10} {:>10} {:>12} {:>8} {:>8}",
                row.block.0,
                row.tracers.used,
                row.tracers.capacity,
                row.tracers.bytes,
                row.sources.used,
                row.sources.bytes
            );
        }
        let _ = write!(out, "{self}");
        out
    }
}

impl fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} blocks: tracers {}, sources {}, {} bytes total",
            self.blocks.len(),
            self.tracers,
            self.sources,
            self.total_bytes()
        )
    }
}
