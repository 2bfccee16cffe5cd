//! Coarse activity tracking so solver passes can skip idle parts of the grid.
//!
//! Injection calls register the fine cells they touch. Each `rebuild` turns the
//! accumulated touches into a coarse map of active regions (every touched
//! region plus its 3×3×3 neighbourhood). A region that drops out of the map is
//! kept at [`REGION_COOLING`] for one more rebuild before going inactive, so
//! the edge of the simulated area does not pop.

use crate::conditions::*;
use crate::grid::{FluidState, Grid};
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct SpatialIndex {
    grid: Grid,
    cell_size: usize,
    cell_count: usize,
    touched: HashSet<usize>,
    active_regions: Vec<f32>,
    previous: Vec<f32>,
}

impl SpatialIndex {
    pub fn new(grid: Grid) -> Self {
        let cell_size = (grid.size() / COARSE_DIVISOR).max(1);
        let cell_count = grid.size().div_ceil(cell_size);
        let regions = cell_count * cell_count * cell_count;
        Self {
            grid,
            cell_size,
            cell_count,
            touched: HashSet::new(),
            active_regions: vec![0.0; regions],
            previous: vec![0.0; regions],
        }
    }

    // Fine cells per region, per axis
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn touch(&mut self, index: usize) {
        if index < self.grid.cell_count() {
            self.touched.insert(index);
        }
    }

    pub fn touched(&self) -> &HashSet<usize> {
        &self.touched
    }

    /// Register every cell of `state` that still carries visible density or motion.
    pub fn touch_live_cells(&mut self, state: &FluidState, threshold: f32) {
        let live: Vec<usize> = (0..state.len())
            .into_par_iter()
            .filter(|&c| {
                let speed = state.velocity_x[c].abs() + state.velocity_y[c].abs() + state.velocity_z[c].abs();
                state.density[c].abs() > threshold || speed > threshold
            })
            .collect();
        self.touched.extend(live);
    }

    fn region_of(&self, i: usize, j: usize, k: usize) -> usize {
        let cs = self.cell_size;
        let cc = self.cell_count;
        i / cs + (j / cs) * cc + (k / cs) * cc * cc
    }

    /// Recompute the active regions from the cells touched since the last rebuild.
    ///
    /// The touched set is consumed.
    pub fn rebuild(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.active_regions);
        self.active_regions.fill(0.0);

        let cc = self.cell_count as isize;
        let cs = self.cell_size;
        for index in self.touched.drain() {
            let (i, j, k) = self.grid.decode(index);
            let (x, y, z) = ((i / cs) as isize, (j / cs) as isize, (k / cs) as isize);

            // Mark the region and its neighbours
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                        if (0..cc).contains(&nx) && (0..cc).contains(&ny) && (0..cc).contains(&nz) {
                            let region = (nx + ny * cc + nz * cc * cc) as usize;
                            self.active_regions[region] = REGION_ACTIVE;
                        }
                    }
                }
            }
        }

        // Temporal coherence: regions that just lost activity cool down for one rebuild
        for (region, &old) in self.active_regions.iter_mut().zip(self.previous.iter()) {
            if old == REGION_ACTIVE && *region == 0.0 {
                *region = REGION_COOLING;
            }
        }

        log::debug!(
            "spatial index rebuilt: {} active, {} cooling of {} regions",
            self.active_count(),
            self.cooling_count(),
            self.active_regions.len()
        );
    }

    // Value of the region containing fine cell (i, j, k)
    pub fn region_value(&self, i: usize, j: usize, k: usize) -> f32 {
        self.active_regions[self.region_of(i, j, k)]
    }

    /// Whether the solvers should process fine cell `(i, j, k)` this step.
    pub fn has_activity(&self, i: usize, j: usize, k: usize) -> bool {
        self.region_value(i, j, k) != 0.0
    }

    pub fn active_regions(&self) -> &[f32] {
        &self.active_regions
    }

    pub fn active_count(&self) -> usize {
        self.active_regions.iter().filter(|&&v| v == REGION_ACTIVE).count()
    }

    pub fn cooling_count(&self) -> usize {
        self.active_regions.iter().filter(|&&v| v == REGION_COOLING).count()
    }

    pub fn is_idle(&self) -> bool {
        self.touched.is_empty() && self.active_regions.iter().all(|&v| v == 0.0)
    }

    pub fn clear(&mut self) {
        self.touched.clear();
        self.active_regions.fill(0.0);
        self.previous.fill(0.0);
    }
}

/// Gate predicate used by every solver: without an index every cell is live.
#[inline]
pub fn is_live(gate: Option<&SpatialIndex>, i: usize, j: usize, k: usize) -> bool {
    gate.is_none_or(|index| index.has_activity(i, j, k))
}
