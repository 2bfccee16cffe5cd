//! Semi-Lagrangian transport with a MacCormack correction.
//!
//! A forward trace predicts the advected field, a trace in the opposite
//! direction estimates the error of that prediction, and half of the error is
//! added back. The result is clamped to the range of the six face neighbours of
//! the source cell, which removes the over- and undershoots the correction
//! would otherwise create.

use crate::boundary::apply_boundary;
use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::grid::{Grid, VelocityRef};
use crate::spatial::{SpatialIndex, is_live};

/// Owns the predictor buffers so advection does not allocate per call.
#[derive(Clone, Debug)]
pub struct Advector {
    forward: Vec<f32>,
    backward: Vec<f32>,
}

impl Advector {
    pub fn new(grid: &Grid) -> Self {
        Self {
            forward: vec![0.0; grid.cell_count()],
            backward: vec![0.0; grid.cell_count()],
        }
    }

    pub fn release(&mut self) {
        self.forward = Vec::new();
        self.backward = Vec::new();
    }

    /// Advect `src` along `velocity` into `dst`, then refresh the walls with `boundary_scale`.
    #[allow(clippy::too_many_arguments)]
    pub fn advect(
        &mut self,
        grid: &Grid,
        config: &SimulationConfig,
        dst: &mut [f32],
        src: &[f32],
        velocity: VelocityRef<'_>,
        temperature: &[f32],
        boundary_scale: f32,
        gate: Option<&SpatialIndex>,
    ) {
        let dt0 = config.time_step * (grid.size() - 2) as f32;
        let Self { forward, backward } = self;

        // Walls of the predictor buffers take the source values
        forward.copy_from_slice(src);
        backward.copy_from_slice(src);

        // Forward pass: where did the fluid in this cell come from
        trace(grid, forward, src, velocity, temperature, dt0, gate);

        // Backward pass: carry the prediction back to estimate its error
        trace(grid, backward, forward, velocity, temperature, -dt0, gate);

        let forward = &*forward;
        let backward = &*backward;
        grid.par_update_interior(dst, |i, j, k, c, cell| {
            if !is_live(gate, i, j, k) {
                *cell = src[c];
                return;
            }
            let corrected = forward[c] + 0.5 * (forward[c] - backward[c]);

            // Monotonicity limiter
            let (lo, hi) = grid
                .neighbors6(c)
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &nb| {
                    (lo.min(src[nb]), hi.max(src[nb]))
                });
            *cell = corrected.max(lo).min(hi);
        });

        apply_boundary(grid, dst, boundary_scale);
    }
}

// One semi-Lagrangian pass: sample `source` at `cell - dt0 * v * tf` for every interior cell
fn trace(
    grid: &Grid,
    target: &mut [f32],
    source: &[f32],
    velocity: VelocityRef<'_>,
    temperature: &[f32],
    dt0: f32,
    gate: Option<&SpatialIndex>,
) {
    let hi = grid.size() as f32 - 1.5;
    grid.par_update_interior(target, |i, j, k, c, cell| {
        if !is_live(gate, i, j, k) {
            *cell = source[c];
            return;
        }
        let temp_factor = 1.0 + temperature[c] * ADVECT_TEMP_FACTOR;
        let x = (i as f32 - dt0 * velocity.x[c] * temp_factor).clamp(0.5, hi);
        let y = (j as f32 - dt0 * velocity.y[c] * temp_factor).clamp(0.5, hi);
        let z = (k as f32 - dt0 * velocity.z[c] * temp_factor).clamp(0.5, hi);
        *cell = grid.sample(source, x, y, z);
    });
}
