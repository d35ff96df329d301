//! Block grid invariant helpers shared by the grid test modules.

use flotsam_core::Point;
use indexmap::IndexSet;

use crate::grid::BlockGrid;

/// Assert that block boxes tile the domain: the union of all boxes is the
/// domain, total area matches, and no two interiors overlap.
pub fn assert_partition(grid: &BlockGrid) {
    let boxes: Vec<_> = grid.ids().map(|id| grid.block_box(id)).collect();
    let union = boxes
        .iter()
        .skip(1)
        .fold(boxes[0], |acc, b| acc.union(b));
    assert_eq!(union, grid.domain(), "union of block boxes is not the domain");

    let total: f64 = boxes.iter().map(|b| b.area_xy()).sum();
    let expected = grid.domain().area_xy();
    assert!(
        (total - expected).abs() <= 1e-9 * expected.max(1.0),
        "block areas sum to {total}, domain area is {expected}"
    );

    for (i, a) in boxes.iter().enumerate() {
        for (j, b) in boxes.iter().enumerate().skip(i + 1) {
            assert!(
                !a.overlaps_interior(b),
                "blocks {i} and {j} overlap: {a} vs {b}"
            );
        }
    }
}

/// Assert that `b in neighbours(a)` implies `a in neighbours(b)`, that
/// neighbour lists hold no duplicates, and that each neighbour is one cell
/// away.
pub fn assert_neighbours_symmetric(grid: &BlockGrid) {
    for id in grid.ids() {
        let nbs = grid.neighbours(id);
        let unique: IndexSet<_> = nbs.iter().copied().collect();
        assert_eq!(unique.len(), nbs.len(), "duplicate neighbours of {id}");
        for nb in nbs {
            assert_eq!(grid.cell_distance(id, nb), 1);
            assert!(
                grid.neighbours(nb).contains(&id),
                "neighbour symmetry violated: {nb} in N({id}) but {id} not in N({nb})"
            );
        }
    }
}

/// Assert that every block's corners and centre locate to a block whose
/// box contains them, and that the centre locates to the block itself.
pub fn assert_locate_consistent(grid: &BlockGrid) {
    for id in grid.ids() {
        let b = grid.block_box(id);
        assert_eq!(grid.locate(&b.center()), Some(id), "centre of {id}");
        let (lo, hi) = (b.min(), b.max());
        for corner in [
            lo,
            hi,
            Point::new(lo.x, hi.y, lo.z),
            Point::new(hi.x, lo.y, hi.z),
        ] {
            let found = grid
                .locate(&corner)
                .unwrap_or_else(|| panic!("corner {corner} of {id} not located"));
            assert!(grid.block_box(found).contains(&corner));
        }
    }
}
