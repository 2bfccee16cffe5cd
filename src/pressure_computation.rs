use crate::boundary::apply_boundary;
use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::grid::{Grid, VelocityRef};
use crate::spatial::{SpatialIndex, is_live};

/// Outcome of one pressure solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionReport {
    /// SOR rounds actually run.
    pub iterations: usize,
    /// Largest per-cell pressure change in the last round.
    pub residual: f32,
    /// True when the solve stopped on the tolerance instead of the round cap.
    pub converged: bool,
}

// Temperature coupling used by both divergence and gradient
fn temp_factor(temperature: &[f32], c: usize) -> f32 {
    1.0 + temperature[c] * PROJECT_TEMP_FACTOR
}

/// Scaled negative divergence of the velocity field: `-0.5 * h * tf * ∇·v`.
///
/// Walls and inactive cells get zero.
pub fn compute_divergence(
    grid: &Grid,
    velocity: VelocityRef<'_>,
    temperature: &[f32],
    divergence: &mut [f32],
    gate: Option<&SpatialIndex>,
) {
    let h = 1.0 / grid.size() as f32;
    divergence.fill(0.0);
    grid.par_update_interior(divergence, |i, j, k, c, cell| {
        if !is_live(gate, i, j, k) {
            return;
        }
        let [xm, xp, ym, yp, zm, zp] = grid.neighbors6(c);
        *cell = -0.5
            * h
            * temp_factor(temperature, c)
            * (velocity.x[xp] - velocity.x[xm] + velocity.y[yp] - velocity.y[ym] + velocity.z[zp]
                - velocity.z[zm]);
    });
}

/// Remove the divergent part of the velocity field.
///
/// Solves the pressure Poisson equation by successive over-relaxation
/// (ω = 1.9) starting from zero pressure, stopping early once no cell changes
/// by more than `1e-4` in a round, then subtracts the pressure gradient from
/// each velocity component. Walls mirror the adjacent pressure with a negative
/// sign after every round.
#[allow(clippy::too_many_arguments)]
pub fn project(
    grid: &Grid,
    config: &SimulationConfig,
    velocity_x: &mut [f32],
    velocity_y: &mut [f32],
    velocity_z: &mut [f32],
    pressure: &mut [f32],
    divergence: &mut [f32],
    temperature: &[f32],
    gate: Option<&SpatialIndex>,
) -> ProjectionReport {
    let velocity = VelocityRef {
        x: velocity_x,
        y: velocity_y,
        z: velocity_z,
    };
    compute_divergence(grid, velocity, temperature, divergence, gate);
    pressure.fill(0.0);

    let report = solve_pressure(grid, config.iterations, pressure, divergence, gate);
    log::trace!(
        "pressure solve: {} rounds, residual {:.2e}, converged {}",
        report.iterations,
        report.residual,
        report.converged
    );

    let inv_h = grid.size() as f32;
    let n = grid.size();
    let n2 = grid.slab_len();
    let pressure = &*pressure;
    for (component, stride) in [(velocity_x, 1), (velocity_y, n), (velocity_z, n2)] {
        grid.par_update_interior(component, |i, j, k, c, cell| {
            if !is_live(gate, i, j, k) {
                return;
            }
            *cell -= 0.5 * temp_factor(temperature, c) * (pressure[c + stride] - pressure[c - stride]) * inv_h;
        });
    }

    report
}

// Neighbour sum and diagonal of the pressure stencil at an interior cell.
//
// A wall neighbour holds `PRESSURE_BOUNDARY_SCALE * damping * p[c]` once the
// boundary is applied, so it is folded into the diagonal instead of being read
// one round late. Reading it late makes over-relaxed sweeps diverge.
fn pressure_stencil(grid: &Grid, pressure: &[f32], i: usize, j: usize, k: usize, c: usize) -> (f32, f32) {
    let n = grid.size();
    let last = n - 2;
    let mut sum = 0.0;
    let mut diagonal = 6.0;
    for (coord, stride, damping) in [
        (i, 1, DAMPING_LEFT_RIGHT),
        (j, n, DAMPING_TOP_BOTTOM),
        (k, n * n, DAMPING_FRONT_BACK),
    ] {
        if coord == 1 {
            diagonal -= PRESSURE_BOUNDARY_SCALE * damping;
        } else {
            sum += pressure[c - stride];
        }
        if coord == last {
            diagonal -= PRESSURE_BOUNDARY_SCALE * damping;
        } else {
            sum += pressure[c + stride];
        }
    }
    (sum, diagonal)
}

// In-place SOR sweeps; sweep order is part of the result, so this stays sequential
fn solve_pressure(
    grid: &Grid,
    iterations: usize,
    pressure: &mut [f32],
    divergence: &[f32],
    gate: Option<&SpatialIndex>,
) -> ProjectionReport {
    let mut report = ProjectionReport {
        iterations: 0,
        residual: 0.0,
        converged: false,
    };

    for round in 0..iterations {
        let mut max_delta = 0.0f32;
        for (i, j, k) in grid.interior() {
            if !is_live(gate, i, j, k) {
                continue;
            }
            let c = grid.offset(i, j, k);
            let old = pressure[c];
            let (sum, diagonal) = pressure_stencil(grid, pressure, i, j, k, c);
            let relaxed = (sum + divergence[c]) / diagonal;
            let new = old * (1.0 - SOR_OMEGA) + SOR_OMEGA * relaxed;
            pressure[c] = new;
            max_delta = max_delta.max((new - old).abs());
        }
        apply_boundary(grid, pressure, PRESSURE_BOUNDARY_SCALE);

        report.iterations = round + 1;
        report.residual = max_delta;
        if max_delta < SOR_TOLERANCE {
            report.converged = true;
            break;
        }
    }

    report
}
