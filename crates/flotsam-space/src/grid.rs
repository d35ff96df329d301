//! Regular block decomposition of the simulation domain.

use std::fmt;

use flotsam_core::{BlockId, Point};
use smallvec::SmallVec;

use crate::bbox::BoundingBox;
use crate::error::SpaceError;

/// Moore neighbourhood offsets as `(dcol, drow)`: W, E, S, N, SW, NW, SE, NE.
const OFFSETS_8: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// How the domain is divided into blocks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridResolution {
    /// Exactly `nx` columns by `ny` rows.
    Cells {
        /// Columns along x.
        nx: u32,
        /// Rows along y.
        ny: u32,
    },
    /// The finest grid whose blocks are at least this wide in x and y.
    MinExtent(f64),
}

/// A domain split into `nx * ny` equal blocks.
///
/// Block ids are row-major: `id = row * nx + col`, with row 0 at the
/// domain's minimum y. Every block spans the full z extent of the domain.
/// Block boxes are closed, so neighbouring boxes share their common edge;
/// [`locate`](Self::locate) resolves such points to the higher cell.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockGrid {
    domain: BoundingBox,
    nx: u32,
    ny: u32,
    dx: f64,
    dy: f64,
}

impl BlockGrid {
    /// Split `domain` into `nx` columns and `ny` rows.
    pub fn new(domain: BoundingBox, nx: u32, ny: u32) -> Result<Self, SpaceError> {
        if nx == 0 || ny == 0 {
            return Err(SpaceError::EmptyGrid);
        }
        let extent = domain.extent();
        if extent.x <= 0.0 || extent.y <= 0.0 {
            return Err(SpaceError::DegenerateDomain);
        }
        let blocks = nx as u64 * ny as u64;
        if blocks > u32::MAX as u64 {
            return Err(SpaceError::DimensionTooLarge {
                name: "nx * ny",
                value: blocks,
                max: u32::MAX as u64,
            });
        }
        Ok(Self {
            domain,
            nx,
            ny,
            dx: extent.x / nx as f64,
            dy: extent.y / ny as f64,
        })
    }

    /// Build a grid from a [`GridResolution`].
    pub fn from_resolution(
        domain: BoundingBox,
        resolution: GridResolution,
    ) -> Result<Self, SpaceError> {
        match resolution {
            GridResolution::Cells { nx, ny } => Self::new(domain, nx, ny),
            GridResolution::MinExtent(e) => {
                if !e.is_finite() || e <= 0.0 {
                    return Err(SpaceError::InvalidExtent { value: e });
                }
                let extent = domain.extent();
                let nx = axis_count("nx", extent.x, e)?;
                let ny = axis_count("ny", extent.y, e)?;
                Self::new(domain, nx, ny)
            }
        }
    }

    /// The full domain box.
    pub fn domain(&self) -> BoundingBox {
        self.domain
    }

    /// `(nx, ny)`.
    pub fn dims(&self) -> (u32, u32) {
        (self.nx, self.ny)
    }

    /// Nominal block width and height.
    pub fn cell_extent(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.nx as usize * self.ny as usize
    }

    /// All block ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.nx * self.ny).map(BlockId)
    }

    /// `(col, row)` of a block.
    pub fn coords(&self, id: BlockId) -> (u32, u32) {
        (id.0 % self.nx, id.0 / self.nx)
    }

    /// Block at `(col, row)`, if in range.
    pub fn id_at(&self, col: u32, row: u32) -> Option<BlockId> {
        (col < self.nx && row < self.ny).then(|| BlockId(row * self.nx + col))
    }

    /// The block containing `p`, or `None` if `p` is outside the domain
    /// or not finite.
    pub fn locate(&self, p: &Point) -> Option<BlockId> {
        if !p.is_finite() || !self.domain.contains(p) {
            return None;
        }
        let min = self.domain.min();
        let col = self.snap(p.x, min.x, self.dx, self.nx, self.domain.max().x);
        let row = self.snap(p.y, min.y, self.dy, self.ny, self.domain.max().y);
        Some(BlockId(row * self.nx + col))
    }

    /// Closed box of block `id`.
    ///
    /// The last column and row end exactly at the domain max, so the
    /// union of all block boxes is the domain.
    pub fn block_box(&self, id: BlockId) -> BoundingBox {
        let (col, row) = self.coords(id);
        let min = self.domain.min();
        let max = self.domain.max();
        let lo = Point::new(
            edge(min.x, self.dx, col, self.nx, max.x),
            edge(min.y, self.dy, row, self.ny, max.y),
            min.z,
        );
        let hi = Point::new(
            edge(min.x, self.dx, col + 1, self.nx, max.x),
            edge(min.y, self.dy, row + 1, self.ny, max.y),
            max.z,
        );
        // Edges are monotone in their index, so lo <= hi holds.
        BoundingBox::new(lo, hi).unwrap_or(self.domain)
    }

    /// The up to eight blocks sharing an edge or corner with `id`.
    pub fn neighbours(&self, id: BlockId) -> SmallVec<[BlockId; 8]> {
        let (col, row) = self.coords(id);
        let mut out = SmallVec::new();
        for (dc, dr) in OFFSETS_8 {
            let c = col as i64 + dc;
            let r = row as i64 + dr;
            if c >= 0 && r >= 0 && c < self.nx as i64 && r < self.ny as i64 {
                out.push(BlockId(r as u32 * self.nx + c as u32));
            }
        }
        out
    }

    /// Chebyshev distance between two blocks, in cells.
    pub fn cell_distance(&self, a: BlockId, b: BlockId) -> u32 {
        let (ac, ar) = self.coords(a);
        let (bc, br) = self.coords(b);
        ac.abs_diff(bc).max(ar.abs_diff(br))
    }

    /// Blocks whose closed box overlaps `bbox`, ascending by id.
    pub fn blocks_overlapping(&self, bbox: &BoundingBox) -> SmallVec<[BlockId; 4]> {
        let mut out = SmallVec::new();
        let Some(clipped) = self.domain.intersection(bbox) else {
            return out;
        };
        let min = self.domain.min();
        let max = self.domain.max();
        let c0 = self.snap(clipped.min().x, min.x, self.dx, self.nx, max.x);
        let c1 = self.snap(clipped.max().x, min.x, self.dx, self.nx, max.x);
        let r0 = self.snap(clipped.min().y, min.y, self.dy, self.ny, max.y);
        let r1 = self.snap(clipped.max().y, min.y, self.dy, self.ny, max.y);
        // A box starting exactly on an edge also touches the lower cell.
        for row in r0.saturating_sub(1)..=r1 {
            for col in c0.saturating_sub(1)..=c1 {
                let id = BlockId(row * self.nx + col);
                if self.block_box(id).overlaps(bbox) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Index of the cell along one axis holding `v`, with edge points
    /// going to the higher cell and the domain max to the last cell.
    fn snap(&self, v: f64, origin: f64, step: f64, n: u32, end: f64) -> u32 {
        let guess = ((v - origin) / step).floor();
        let mut i = if guess < 0.0 {
            0
        } else {
            (guess as u64).min(n as u64 - 1) as u32
        };
        // Floating-point division can land one cell off near an edge.
        if i > 0 && v < edge(origin, step, i, n, end) {
            i -= 1;
        } else if i + 1 < n && v >= edge(origin, step, i + 1, n, end) {
            i += 1;
        }
        i
    }
}

impl fmt::Display for BlockGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} blocks of {}x{} over {}",
            self.nx, self.ny, self.dx, self.dy, self.domain
        )
    }
}

fn edge(origin: f64, step: f64, i: u32, n: u32, end: f64) -> f64 {
    if i >= n {
        end
    } else {
        origin + step * i as f64
    }
}

fn axis_count(name: &'static str, length: f64, min_extent: f64) -> Result<u32, SpaceError> {
    let n = (length / min_extent).floor().max(1.0);
    if n > u32::MAX as f64 {
        return Err(SpaceError::DimensionTooLarge {
            name,
            value: n as u64,
            max: u32::MAX as u64,
        });
    }
    Ok(n as u32)
}
