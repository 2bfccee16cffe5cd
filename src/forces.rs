use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::grid::{FluidState, Grid, Vector3};
use crate::spatial::{SpatialIndex, is_live};
use rayon::prelude::*;

/// Thermal buoyancy and gravity on the vertical velocity, plus wave relaxation.
///
/// `vy += (T * temperature_coef - ρ * density_coef + gravity * ρ) * dt` and the
/// pressure field relaxes a tenth of the way toward the density every call.
#[allow(clippy::too_many_arguments)]
pub fn apply_buoyancy(
    grid: &Grid,
    config: &SimulationConfig,
    velocity_y: &mut [f32],
    temperature: &[f32],
    density: &[f32],
    pressure: &mut [f32],
    gate: Option<&SpatialIndex>,
) {
    let n = grid.size();
    let slab = grid.slab_len();
    let dt = config.time_step;

    velocity_y
        .par_chunks_mut(slab)
        .zip(pressure.par_chunks_mut(slab))
        .enumerate()
        .for_each(|(k, (plane_vy, plane_p))| {
            if k == 0 || k >= n - 1 {
                return;
            }
            for j in 1..n - 1 {
                for i in 1..n - 1 {
                    if !is_live(gate, i, j, k) {
                        continue;
                    }
                    let c = grid.offset(i, j, k);
                    let local = i + j * n;

                    let lift = temperature[c] * config.temperature - density[c] * config.density;
                    plane_vy[local] += (lift + config.gravity * density[c]) * dt;

                    // Wave dynamics
                    let height = plane_p[local];
                    plane_p[local] = height + (density[c] - height) * WAVE_RELAXATION;
                }
            }
        });
}

// Visit every in-grid cell within `radius` of the clamped centre with its falloff weight
fn splat<F>(grid: &Grid, x: f32, y: f32, z: f32, radius: f32, mut visit: F) -> usize
where
    F: FnMut(usize, f32),
{
    let centre = grid.idx_f(x, y, z);
    let (ci, cj, ck) = grid.decode(centre);
    let (ci, cj, ck) = (ci as isize, cj as isize, ck as isize);
    let reach = radius.ceil() as isize;

    for dz in -reach..=reach {
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let (i, j, k) = (ci + dx, cj + dy, ck + dz);
                if !grid.in_bounds(i, j, k) {
                    continue;
                }
                let d = ((dx * dx + dy * dy + dz * dz) as f32).sqrt();
                if d > radius {
                    continue;
                }
                visit(grid.idx(i, j, k), (-FALLOFF_SHARPNESS * d / radius).exp());
            }
        }
    }

    centre
}

/// Add density around `(x, y, z)` with a radial falloff; returns the centre cell.
///
/// The centre is floored and clamped into the grid. Every changed cell is
/// registered with the spatial index.
pub fn add_force(
    grid: &Grid,
    state: &mut FluidState,
    index: &mut SpatialIndex,
    x: f32,
    y: f32,
    z: f32,
    amount: f32,
) -> usize {
    splat(grid, x, y, z, FORCE_RADIUS, |c, weight| {
        state.density[c] += amount * weight;
        index.touch(c);
    })
}

/// Add a velocity impulse around `(x, y, z)`; returns the centre cell.
pub fn add_velocity(
    grid: &Grid,
    state: &mut FluidState,
    index: &mut SpatialIndex,
    x: f32,
    y: f32,
    z: f32,
    velocity: Vector3,
) -> usize {
    splat(grid, x, y, z, VELOCITY_RADIUS, |c, weight| {
        let impulse = velocity * weight;
        state.velocity_x[c] += impulse.x;
        state.velocity_y[c] += impulse.y;
        state.velocity_z[c] += impulse.z;
        index.touch(c);
    })
}

/// Add temperature around `(x, y, z)` with the density falloff; returns the centre cell.
pub fn add_heat(
    grid: &Grid,
    state: &mut FluidState,
    index: &mut SpatialIndex,
    x: f32,
    y: f32,
    z: f32,
    amount: f32,
) -> usize {
    splat(grid, x, y, z, FORCE_RADIUS, |c, weight| {
        state.temperature[c] += amount * weight;
        index.touch(c);
    })
}
