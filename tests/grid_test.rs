//! Grid indexing tests
//!
//! Every coordinate handed to the indexer saturates to the grid instead of
//! failing, for integer and continuous positions alike.

use proptest::prelude::*;
use voxel_fluid::Grid;

fn expected(n: usize, x: isize, y: isize, z: isize) -> usize {
    let clamp = |v: isize| v.clamp(0, n as isize - 1) as usize;
    clamp(x) + clamp(y) * n + clamp(z) * n * n
}

proptest! {
    /// Property: integer coordinates clamp per axis
    #[test]
    fn test_idx_clamps_every_axis(
        n in 3usize..24,
        x in -64isize..64,
        y in -64isize..64,
        z in -64isize..64,
    ) {
        let grid = Grid::new(n);
        prop_assert_eq!(grid.idx(x, y, z), expected(n, x, y, z));
        prop_assert!(grid.idx(x, y, z) < grid.cell_count());
    }

    /// Property: continuous coordinates floor, then clamp
    #[test]
    fn test_idx_f_floors_then_clamps(
        n in 3usize..24,
        x in -40.0f32..40.0,
        y in -40.0f32..40.0,
        z in -40.0f32..40.0,
    ) {
        let grid = Grid::new(n);
        let floor = |v: f32| v.floor() as isize;
        prop_assert_eq!(grid.idx_f(x, y, z), expected(n, floor(x), floor(y), floor(z)));
    }
}

/// Test that non-finite positions still land inside the grid
#[test]
fn test_idx_f_survives_non_finite_input() {
    let grid = Grid::new(6);
    assert_eq!(grid.idx_f(f32::NAN, 2.0, 2.0), grid.idx(0, 2, 2));
    assert_eq!(grid.idx_f(f32::INFINITY, f32::NEG_INFINITY, 3.0), grid.idx(5, 0, 3));
}

/// Test that trilinear sampling outside the grid reads the nearest wall
#[test]
fn test_sample_saturates_at_walls() {
    let grid = Grid::new(4);
    let field: Vec<f32> = (0..grid.cell_count()).map(|c| c as f32).collect();

    let inside = grid.sample(&field, 3.0, 3.0, 3.0);
    let outside = grid.sample(&field, 9.5, 7.25, 12.0);
    assert_eq!(inside, outside, "sampling past the last cell should read the last cell");
}
