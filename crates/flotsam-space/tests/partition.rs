use flotsam_core::{BlockId, Point};
use flotsam_space::{BlockGrid, BoundingBox, GridResolution, Shape};
use proptest::prelude::*;

fn grid(w: f64, h: f64, nx: u32, ny: u32) -> BlockGrid {
    let domain = BoundingBox::new(Point::ZERO, Point::xy(w, h)).unwrap();
    BlockGrid::new(domain, nx, ny).unwrap()
}

#[test]
fn footprint_of_polygon_spanning_all_four_blocks() {
    let g = grid(10.0, 10.0, 2, 2);
    let diamond = Shape::polygon(vec![
        Point::xy(5.0, 2.0),
        Point::xy(8.0, 5.0),
        Point::xy(5.0, 8.0),
        Point::xy(2.0, 5.0),
    ])
    .unwrap();
    let fp = g.blocks_overlapping(&diamond.bounding_box());
    assert_eq!(fp.len(), 4);
}

#[test]
fn min_extent_blocks_are_at_least_that_wide() {
    let domain = BoundingBox::new(Point::ZERO, Point::xy(100.0, 37.0)).unwrap();
    let g = BlockGrid::from_resolution(domain, GridResolution::MinExtent(12.0)).unwrap();
    let (dx, dy) = g.cell_extent();
    assert!(dx >= 12.0 && dy >= 12.0);
    assert_eq!(g.dims(), (8, 3));
}

proptest! {
    #[test]
    fn every_domain_point_locates_into_its_block(
        nx in 1u32..12,
        ny in 1u32..12,
        w in 0.5f64..1000.0,
        h in 0.5f64..1000.0,
        fx in 0.0f64..=1.0,
        fy in 0.0f64..=1.0,
    ) {
        let g = grid(w, h, nx, ny);
        let p = Point::xy(fx * w, fy * h);
        let id = g.locate(&p);
        prop_assert!(id.is_some());
        let id = id.unwrap();
        prop_assert!(g.block_box(id).contains(&p));
        prop_assert!(id.index() < g.block_count());
    }

    #[test]
    fn points_outside_domain_are_not_located(
        nx in 1u32..8,
        ny in 1u32..8,
        dx in 0.001f64..50.0,
        fy in 0.0f64..=1.0,
    ) {
        let g = grid(10.0, 10.0, nx, ny);
        prop_assert!(g.locate(&Point::xy(10.0 + dx, fy * 10.0)).is_none());
        prop_assert!(g.locate(&Point::xy(-dx, fy * 10.0)).is_none());
    }

    #[test]
    fn neighbours_are_exactly_the_blocks_one_cell_away(
        nx in 1u32..9,
        ny in 1u32..9,
        raw in 0u32..81,
    ) {
        let g = grid(1.0, 1.0, nx, ny);
        let id = BlockId(raw % (nx * ny));
        let nbs = g.neighbours(id);
        let expected: Vec<_> = g.ids().filter(|&o| g.cell_distance(id, o) == 1).collect();
        prop_assert_eq!(nbs.len(), expected.len());
        for e in expected {
            prop_assert!(nbs.contains(&e));
        }
    }
}
