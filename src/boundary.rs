use crate::conditions::*;
use crate::grid::Grid;

/// Copy the first interior layer into each wall layer, damped per axis.
///
/// Top/bottom walls (y) take `scale`, left/right (x) `scale * 0.8`,
/// front/back (z) `scale * 0.9`. The pressure projector passes `scale = -1`.
pub fn apply_boundary(grid: &Grid, field: &mut [f32], scale: f32) {
    let n = grid.size() as isize;
    let last = n - 1;
    let top_bottom = scale * DAMPING_TOP_BOTTOM;
    let left_right = scale * DAMPING_LEFT_RIGHT;
    let front_back = scale * DAMPING_FRONT_BACK;

    for i in 0..n {
        for j in 0..n {
            // Bottom and top
            field[grid.idx(i, 0, j)] = field[grid.idx(i, 1, j)] * top_bottom;
            field[grid.idx(i, last, j)] = field[grid.idx(i, last - 1, j)] * top_bottom;

            // Left and right
            field[grid.idx(0, i, j)] = field[grid.idx(1, i, j)] * left_right;
            field[grid.idx(last, i, j)] = field[grid.idx(last - 1, i, j)] * left_right;

            // Front and back
            field[grid.idx(i, j, 0)] = field[grid.idx(i, j, 1)] * front_back;
            field[grid.idx(i, j, last)] = field[grid.idx(i, j, last - 1)] * front_back;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filled(grid: &Grid, value: f32) -> Vec<f32> {
        let mut field = vec![0.0; grid.cell_count()];
        for (i, j, k) in grid.interior() {
            field[grid.offset(i, j, k)] = value;
        }
        field
    }

    #[test]
    fn test_face_damping_per_axis() {
        let grid = Grid::new(6);
        let mut field = filled(&grid, 1.0);
        apply_boundary(&grid, &mut field, 1.0);

        assert_relative_eq!(field[grid.idx(2, 0, 3)], 1.0);
        assert_relative_eq!(field[grid.idx(2, 5, 3)], 1.0);
        assert_relative_eq!(field[grid.idx(0, 2, 3)], 0.8);
        assert_relative_eq!(field[grid.idx(5, 2, 3)], 0.8);
        assert_relative_eq!(field[grid.idx(2, 3, 0)], 0.9);
        assert_relative_eq!(field[grid.idx(2, 3, 5)], 0.9);
    }

    #[test]
    fn test_negative_scale_mirrors_sign() {
        let grid = Grid::new(5);
        let mut field = filled(&grid, 2.0);
        apply_boundary(&grid, &mut field, -1.0);

        assert_relative_eq!(field[grid.idx(2, 0, 2)], -2.0);
        assert_relative_eq!(field[grid.idx(4, 2, 2)], -1.6);
        assert_relative_eq!(field[grid.idx(2, 2, 0)], -1.8);
    }

    #[test]
    fn test_interior_untouched() {
        let grid = Grid::new(5);
        let mut field = filled(&grid, 3.0);
        apply_boundary(&grid, &mut field, 0.5);
        for (i, j, k) in grid.interior() {
            assert_eq!(field[grid.offset(i, j, k)], 3.0);
        }
    }

    #[test]
    fn test_zero_field_stays_zero() {
        let grid = Grid::new(4);
        let mut field = vec![0.0; grid.cell_count()];
        apply_boundary(&grid, &mut field, -1.0);
        assert!(field.iter().all(|&v| v == 0.0));
    }
}
