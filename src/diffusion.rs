use crate::boundary::apply_boundary;
use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::grid::Grid;
use crate::spatial::{SpatialIndex, is_live};

/// Implicit diffusion of `src` into `dst` by Gauss-Seidel relaxation.
///
/// Each round updates interior cells in place:
/// `dst = (src + a * tf * Σ6 dst) / (1 + 6a)` with `a = dt * rate * (N-2)²` and
/// `tf = 1 + temperature * 0.1`, so warm cells mix faster. Walls are refreshed
/// after every round. Cells in inactive regions keep the value of `src`.
pub fn diffuse(
    grid: &Grid,
    config: &SimulationConfig,
    dst: &mut [f32],
    src: &[f32],
    rate: f32,
    temperature: &[f32],
    gate: Option<&SpatialIndex>,
) {
    let inner = (grid.size() - 2) as f32;
    let a = config.time_step * rate * inner * inner;
    let inv_denom = 1.0 / (1.0 + 6.0 * a);

    dst.copy_from_slice(src);

    for _ in 0..config.iterations {
        for (i, j, k) in grid.interior() {
            if !is_live(gate, i, j, k) {
                continue;
            }
            let c = grid.offset(i, j, k);
            let temp_factor = 1.0 + temperature[c] * DIFFUSE_TEMP_FACTOR;
            dst[c] = (src[c] + a * temp_factor * grid.neighbor_sum(dst, c)) * inv_denom;
        }
        apply_boundary(grid, dst, 1.0);
    }
}
