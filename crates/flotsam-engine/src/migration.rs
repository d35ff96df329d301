//! Migration planning.
//!
//! After integration every block checks its own tracers, read-only, and
//! records where each one that left its box must go. Blocks are planned in
//! parallel; the resulting [`MigrationPlan`] is applied serially by
//! [`PendingMigration::commit`](crate::PendingMigration::commit), which is
//! the only place tracers cross block boundaries.

use flotsam_arena::SlotIndex;
use flotsam_core::{BlockId, Point, TracerId};
use flotsam_space::BlockGrid;
use rayon::prelude::*;

use crate::block::Block;

/// Where a planned tracer goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Into another block.
    Block {
        /// Target block.
        to: BlockId,
        /// Chebyshev distance travelled, in cells.
        cells: u32,
        /// Whether `cells` exceeded the configured skip threshold.
        large: bool,
    },
    /// Left the domain with a finite position.
    Exited,
    /// Reached the configured lifetime.
    Expired,
    /// Position is not finite; cannot be placed anywhere.
    Unplaceable,
}

/// One planned tracer move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Move {
    /// Block holding the tracer now.
    pub from: BlockId,
    /// The tracer's slot in `from`.
    pub slot: SlotIndex,
    /// The tracer.
    pub tracer: TracerId,
    /// Its position at planning time.
    pub position: Point,
    /// What to do with it.
    pub destination: Destination,
}

/// All moves for one step, in block order then slot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MigrationPlan {
    moves: Vec<Move>,
}

impl MigrationPlan {
    /// Plan every block in parallel.
    pub fn build(
        blocks: &[Block],
        grid: &BlockGrid,
        lifetime: Option<f64>,
        max_cell_skip: u32,
    ) -> Self {
        let per_block: Vec<Vec<Move>> = blocks
            .par_iter()
            .map(|block| plan_block(block, grid, lifetime, max_cell_skip))
            .collect();
        Self {
            moves: per_block.into_iter().flatten().collect(),
        }
    }

    /// The planned moves.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of planned moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether nothing needs to move.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub(crate) fn into_moves(self) -> Vec<Move> {
        self.moves
    }
}

/// Plan one block's moves without mutating it.
///
/// Expired tracers are removed wherever they are. Any other tracer outside
/// the block's box is relocated, whether it is still moving or beached.
pub fn plan_block(
    block: &Block,
    grid: &BlockGrid,
    lifetime: Option<f64>,
    max_cell_skip: u32,
) -> Vec<Move> {
    let mut moves = Vec::new();
    for (slot, tracer) in block.tracers() {
        let position = tracer.position();
        let destination = if tracer.is_expired(lifetime) {
            Destination::Expired
        } else if !block.contains(&position) {
            // Beached tracers can stop outside the box they started in.
            relocate(block.id(), &position, grid, max_cell_skip)
        } else {
            continue;
        };
        moves.push(Move {
            from: block.id(),
            slot,
            tracer: tracer.id(),
            position,
            destination,
        });
    }
    moves
}

/// Find the new owner of a position that left block `from`.
///
/// Neighbours are searched first. When several contain the point (it sits
/// on a shared edge) the highest id wins, matching [`BlockGrid::locate`].
fn relocate(from: BlockId, p: &Point, grid: &BlockGrid, max_cell_skip: u32) -> Destination {
    if !p.is_finite() {
        return Destination::Unplaceable;
    }
    let near = grid
        .neighbours(from)
        .into_iter()
        .filter(|&nb| grid.block_box(nb).contains(p))
        .max();
    let to = match near.or_else(|| grid.locate(p)) {
        Some(to) => to,
        None => return Destination::Exited,
    };
    let cells = grid.cell_distance(from, to);
    Destination::Block {
        to,
        cells,
        large: cells > max_cell_skip,
    }
}
