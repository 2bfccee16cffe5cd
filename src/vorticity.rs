use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::grid::{Grid, Vector3, VelocityRef};
use crate::spatial::{SpatialIndex, is_live};
use rayon::prelude::*;

/// Curl magnitude of the velocity field into `curl`, scaled by local turbulence.
///
/// Walls of `curl` are zero.
pub fn compute_curl(
    grid: &Grid,
    config: &SimulationConfig,
    velocity: VelocityRef<'_>,
    curl: &mut [f32],
    temperature: &[f32],
    gate: Option<&SpatialIndex>,
) {
    curl.fill(0.0);
    grid.par_update_interior(curl, |i, j, k, c, cell| {
        if !is_live(gate, i, j, k) {
            return;
        }
        let [xm, xp, ym, yp, zm, zp] = grid.neighbors6(c);
        let dvz_dy = (velocity.z[yp] - velocity.z[ym]) * 0.5;
        let dvy_dz = (velocity.y[zp] - velocity.y[zm]) * 0.5;
        let dvx_dz = (velocity.x[zp] - velocity.x[zm]) * 0.5;
        let dvz_dx = (velocity.z[xp] - velocity.z[xm]) * 0.5;
        let dvy_dx = (velocity.y[xp] - velocity.y[xm]) * 0.5;
        let dvx_dy = (velocity.x[yp] - velocity.x[ym]) * 0.5;

        let omega = Vector3::new(dvz_dy - dvy_dz, dvx_dz - dvz_dx, dvy_dx - dvx_dy);
        *cell = omega.magnitude() * (1.0 + config.turbulence_factor * temperature[c]);
    });
}

/// Vorticity confinement: push velocity along the normalized gradient of the curl magnitude.
///
/// The curl magnitude is left in `curl` for publishing.
#[allow(clippy::too_many_arguments)]
pub fn confine(
    grid: &Grid,
    config: &SimulationConfig,
    velocity_x: &mut [f32],
    velocity_y: &mut [f32],
    velocity_z: &mut [f32],
    curl: &mut [f32],
    temperature: &[f32],
    gate: Option<&SpatialIndex>,
) {
    let velocity = VelocityRef {
        x: velocity_x,
        y: velocity_y,
        z: velocity_z,
    };
    compute_curl(grid, config, velocity, curl, temperature, gate);

    if config.vorticity_strength == 0.0 {
        return;
    }

    let n = grid.size();
    let slab = grid.slab_len();
    let curl = &*curl;
    velocity_x
        .par_chunks_mut(slab)
        .zip(velocity_y.par_chunks_mut(slab))
        .zip(velocity_z.par_chunks_mut(slab))
        .enumerate()
        .for_each(|(k, ((plane_x, plane_y), plane_z))| {
            if k == 0 || k >= n - 1 {
                return;
            }
            for j in 1..n - 1 {
                for i in 1..n - 1 {
                    if !is_live(gate, i, j, k) {
                        continue;
                    }
                    let c = grid.offset(i, j, k);
                    let [xm, xp, ym, yp, zm, zp] = grid.neighbors6(c);
                    let gradient = Vector3::new(
                        (curl[xp] - curl[xm]) * 0.5,
                        (curl[yp] - curl[ym]) * 0.5,
                        (curl[zp] - curl[zm]) * 0.5,
                    );
                    let direction = gradient.normalize_eps(VORTICITY_EPSILON);
                    let temp_factor = 1.0 + temperature[c] * VORTICITY_TEMP_FACTOR;
                    let strength = config.vorticity_strength * curl[c] * config.time_step * temp_factor;

                    let local = i + j * n;
                    plane_x[local] += strength * direction.x;
                    plane_y[local] += strength * direction.y;
                    plane_z[local] += strength * direction.z;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    // Solid-body rotation around the z axis through the grid centre
    fn swirl(grid: &Grid) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let len = grid.cell_count();
        let centre = (grid.size() as f32 - 1.0) / 2.0;
        let mut vx = vec![0.0; len];
        let mut vy = vec![0.0; len];
        for c in 0..len {
            let (i, j, _) = grid.decode(c);
            vx[c] = -(j as f32 - centre) * 0.1;
            vy[c] = (i as f32 - centre) * 0.1;
        }
        (vx, vy, vec![0.0; len])
    }

    #[test]
    fn test_curl_of_rotation_is_uniform() {
        let grid = Grid::new(8);
        let config = SimulationConfig::quiet(8, 4, 0.1);
        let (vx, vy, vz) = swirl(&grid);
        let temperature = vec![0.0; grid.cell_count()];
        let mut curl = vec![0.0; grid.cell_count()];

        compute_curl(
            &grid,
            &config,
            VelocityRef { x: &vx, y: &vy, z: &vz },
            &mut curl,
            &temperature,
            None,
        );

        for (i, j, k) in grid.interior() {
            let value = curl[grid.offset(i, j, k)];
            assert!((value - 0.2).abs() < 1e-5, "curl at ({}, {}, {}) = {}", i, j, k, value);
        }
    }

    #[test]
    fn test_turbulence_scales_curl_with_temperature() {
        let grid = Grid::new(6);
        let mut config = SimulationConfig::quiet(6, 4, 0.1);
        config.turbulence_factor = 0.5;
        let (vx, vy, vz) = swirl(&grid);
        let temperature = vec![2.0; grid.cell_count()];
        let mut curl = vec![0.0; grid.cell_count()];

        compute_curl(
            &grid,
            &config,
            VelocityRef { x: &vx, y: &vy, z: &vz },
            &mut curl,
            &temperature,
            None,
        );

        let value = curl[grid.idx(2, 2, 2)];
        assert!((value - 0.4).abs() < 1e-5, "expected doubled curl, got {}", value);
    }

    #[test]
    fn test_uniform_curl_adds_no_force() {
        let grid = Grid::new(8);
        let mut config = SimulationConfig::quiet(8, 4, 0.1);
        config.vorticity_strength = 1.0;
        let (mut vx, mut vy, mut vz) = swirl(&grid);
        let (before_x, before_y) = (vx.clone(), vy.clone());
        let temperature = vec![0.0; grid.cell_count()];
        let mut curl = vec![0.0; grid.cell_count()];

        confine(&grid, &config, &mut vx, &mut vy, &mut vz, &mut curl, &temperature, None);

        // Deep interior: the curl gradient vanishes, so the force does too
        let c = grid.idx(3, 3, 3);
        assert!((vx[c] - before_x[c]).abs() < 1e-4);
        assert!((vy[c] - before_y[c]).abs() < 1e-4);
        assert!(vz[c].abs() < 1e-4);
    }

    #[test]
    fn test_confinement_pushes_toward_stronger_vorticity() {
        let grid = Grid::new(10);
        let mut config = SimulationConfig::quiet(10, 4, 0.1);
        config.vorticity_strength = 1.0;
        let len = grid.cell_count();
        let (mut vx, mut vy, mut vz) = (vec![0.0; len], vec![0.0; len], vec![0.0; len]);
        // A shear layer in vx along y, centred at x = 5
        for c in 0..len {
            let (i, j, _) = grid.decode(c);
            if i >= 5 {
                vx[c] = j as f32 * 0.1 * (i - 4) as f32;
            }
        }
        let temperature = vec![0.0; len];
        let mut curl = vec![0.0; len];
        let probe = grid.idx(5, 5, 5);
        let before = vx[probe];

        confine(&grid, &config, &mut vx, &mut vy, &mut vz, &mut curl, &temperature, None);

        assert!(curl[grid.idx(6, 5, 5)] > curl[grid.idx(4, 5, 5)]);
        assert!(vx[probe] > before, "force should point toward the stronger curl (+x)");
    }
}
