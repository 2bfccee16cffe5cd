//! The simulation orchestrator: owns the buffers, runs the solver pipeline once
//! per `step()`, and hands every field to the render collaborator afterwards.

use crate::advection::Advector;
use crate::conditions::*;
use crate::config::SimulationConfig;
use crate::diffusion::diffuse;
use crate::error::{BackendError, ConfigError};
use crate::forces;
use crate::grid::{BufferPair, FieldKind, FluidState, Grid, Vector3, VelocityRef};
use crate::pressure_computation::{ProjectionReport, project};
use crate::spatial::SpatialIndex;
use crate::vorticity::confine;
use std::collections::HashSet;

/// Receives field snapshots after each step, after `reset()` and after `add_force`.
///
/// The slice is only valid for the duration of the call.
pub trait FieldSink {
    fn publish(&mut self, kind: FieldKind, data: &[f32]);
}

/// An accelerated execution path behind the same contract as the CPU pipeline.
///
/// Results are not required to match the CPU solver bit for bit.
pub trait GpuBackend {
    fn init(&mut self, grid_size: usize) -> Result<(), BackendError>;
    fn is_ready(&self) -> bool;
    /// Advance `state` by one step at simulation time `time`.
    fn step(&mut self, state: &mut FluidState, time: f32);
    fn upload_velocity(&mut self, index: usize, vx: f32, vy: f32, vz: f32);
    fn reset(&mut self);
    fn dispose(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Ready,
    Disposed,
}

// Per-step working memory, allocated once
#[derive(Clone, Debug)]
struct Scratch {
    velocity_x: Vec<f32>,
    velocity_y: Vec<f32>,
    velocity_z: Vec<f32>,
    scalar: Vec<f32>,
}

impl Scratch {
    fn new(grid: &Grid) -> Self {
        let len = grid.cell_count();
        Self {
            velocity_x: vec![0.0; len],
            velocity_y: vec![0.0; len],
            velocity_z: vec![0.0; len],
            scalar: vec![0.0; len],
        }
    }

    fn release(&mut self) {
        self.velocity_x = Vec::new();
        self.velocity_y = Vec::new();
        self.velocity_z = Vec::new();
        self.scalar = Vec::new();
    }
}

pub struct FluidSimulation {
    config: SimulationConfig,
    grid: Grid,
    buffers: BufferPair,
    index: SpatialIndex,
    advector: Advector,
    scratch: Scratch,
    backend: Option<Box<dyn GpuBackend>>,
    sink: Option<Box<dyn FieldSink>>,
    time: f32,
    lifecycle: Lifecycle,
    last_projection: Option<ProjectionReport>,
}

impl FluidSimulation {
    /// Validate `config` and allocate zero-filled buffers.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = Grid::new(config.grid_size);
        let simulation = Self {
            grid,
            buffers: BufferPair::new(grid),
            index: SpatialIndex::new(grid),
            advector: Advector::new(&grid),
            scratch: Scratch::new(&grid),
            backend: None,
            sink: None,
            time: 0.0,
            lifecycle: Lifecycle::Ready,
            last_projection: None,
            config,
        };

        log::info!(
            "fluid simulation ready: {}³ cells, {} iterations, dt {}, spatial index {}",
            simulation.grid.size(),
            simulation.config.iterations,
            simulation.config.time_step,
            if simulation.config.use_spatial_index { "on" } else { "off" }
        );
        Ok(simulation)
    }

    /// Attach an accelerated backend. Initialisation happens here, exactly once.
    ///
    /// On failure the backend is dropped and the CPU pipeline is used for the
    /// lifetime of this simulation.
    pub fn with_backend(mut self, mut backend: Box<dyn GpuBackend>) -> Self {
        if !self.config.use_gpu {
            log::debug!("accelerated backend ignored: use_gpu is off");
            return self;
        }
        match backend.init(self.grid.size()) {
            Ok(()) => {
                log::info!("accelerated backend initialised");
                self.backend = Some(backend);
            }
            Err(e) => log::warn!("accelerated backend unavailable, using CPU solver: {}", e),
        }
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn FieldSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Advance the simulation by one fixed time step.
    pub fn step(&mut self) {
        if self.check_disposed("step") {
            return;
        }
        self.time += self.config.time_step;

        // Cells touched since the last step decide what the solvers visit this step
        if self.config.use_spatial_index {
            self.index.rebuild();
        } else {
            self.index.clear();
        }

        self.buffers.seed_next();
        if self.uses_gpu() {
            if let Some(backend) = self.backend.as_mut() {
                backend.step(self.buffers.next_mut(), self.time);
            }
        } else {
            self.run_cpu_pipeline();
        }

        if !self.buffers.next().is_finite() {
            log::warn!("non-finite values at t = {:.3}, keeping the previous state", self.time);
            self.swap_or_keep(false);
            return;
        }

        self.swap_or_keep(true);
        log::trace!(
            "step t = {:.3}: total density {:.4}",
            self.time,
            self.buffers.current().total_density()
        );
        self.publish_all();
    }

    fn run_cpu_pipeline(&mut self) {
        let Self {
            config,
            grid,
            buffers,
            index,
            advector,
            scratch,
            last_projection,
            ..
        } = self;
        let (config, grid) = (&*config, &*grid);
        let gate = config.use_spatial_index.then_some(&*index);
        let (current, next) = buffers.split_mut();

        // Viscosity
        diffuse(grid, config, &mut next.velocity_x, &current.velocity_x, config.viscosity, &current.temperature, gate);
        diffuse(grid, config, &mut next.velocity_y, &current.velocity_y, config.viscosity, &current.temperature, gate);
        diffuse(grid, config, &mut next.velocity_z, &current.velocity_z, config.viscosity, &current.temperature, gate);

        let velocity = VelocityRef {
            x: &next.velocity_x,
            y: &next.velocity_y,
            z: &next.velocity_z,
        };
        advector.advect(grid, config, &mut next.density, &current.density, velocity, &next.temperature, 1.0, gate);

        project(
            grid,
            config,
            &mut next.velocity_x,
            &mut next.velocity_y,
            &mut next.velocity_z,
            &mut next.pressure,
            &mut next.divergence,
            &next.temperature,
            gate,
        );

        confine(
            grid,
            config,
            &mut next.velocity_x,
            &mut next.velocity_y,
            &mut next.velocity_z,
            &mut next.temp,
            &next.temperature,
            gate,
        );

        forces::apply_buoyancy(
            grid,
            config,
            &mut next.velocity_y,
            &next.temperature,
            &next.density,
            &mut next.pressure,
            gate,
        );

        // Self-advection reads a snapshot of the velocity it moves
        scratch.velocity_x.copy_from_slice(&next.velocity_x);
        scratch.velocity_y.copy_from_slice(&next.velocity_y);
        scratch.velocity_z.copy_from_slice(&next.velocity_z);
        let snapshot = VelocityRef {
            x: &scratch.velocity_x,
            y: &scratch.velocity_y,
            z: &scratch.velocity_z,
        };
        advector.advect(grid, config, &mut next.velocity_x, snapshot.x, snapshot, &next.temperature, 1.0, gate);
        advector.advect(grid, config, &mut next.velocity_y, snapshot.y, snapshot, &next.temperature, 1.0, gate);
        advector.advect(grid, config, &mut next.velocity_z, snapshot.z, snapshot, &next.temperature, 1.0, gate);

        *last_projection = Some(project(
            grid,
            config,
            &mut next.velocity_x,
            &mut next.velocity_y,
            &mut next.velocity_z,
            &mut next.pressure,
            &mut next.divergence,
            &next.temperature,
            gate,
        ));

        // Density, then temperature: diffuse and advect through the projected field
        let velocity = VelocityRef {
            x: &next.velocity_x,
            y: &next.velocity_y,
            z: &next.velocity_z,
        };
        scratch.scalar.copy_from_slice(&next.density);
        diffuse(grid, config, &mut next.density, &scratch.scalar, config.diffusion, &next.temperature, gate);
        scratch.scalar.copy_from_slice(&next.density);
        advector.advect(grid, config, &mut next.density, &scratch.scalar, velocity, &next.temperature, 1.0, gate);

        scratch.scalar.copy_from_slice(&next.temperature);
        diffuse(grid, config, &mut next.temperature, &scratch.scalar, config.diffusion, &scratch.scalar, gate);
        scratch.scalar.copy_from_slice(&next.temperature);
        advector.advect(grid, config, &mut next.temperature, &scratch.scalar, velocity, &scratch.scalar, 1.0, gate);
    }

    /// Inject density around `(x, y, z)`; coordinates are clamped into the grid.
    pub fn add_force(&mut self, x: f32, y: f32, z: f32, amount: f32) {
        if self.check_disposed("add_force") || self.reject_non_finite("add_force", &[amount]) {
            return;
        }
        forces::add_force(&self.grid, self.buffers.current_mut(), &mut self.index, x, y, z, amount);
        self.publish(FieldKind::Density);
    }

    /// Inject a velocity impulse around `(x, y, z)`, mirrored to the accelerated backend when it runs.
    pub fn add_velocity(&mut self, x: f32, y: f32, z: f32, vx: f32, vy: f32, vz: f32) {
        if self.check_disposed("add_velocity") || self.reject_non_finite("add_velocity", &[vx, vy, vz]) {
            return;
        }
        let centre = forces::add_velocity(
            &self.grid,
            self.buffers.current_mut(),
            &mut self.index,
            x,
            y,
            z,
            Vector3::new(vx, vy, vz),
        );
        if let Some(backend) = self.backend.as_mut().filter(|backend| backend.is_ready()) {
            backend.upload_velocity(centre, vx, vy, vz);
        }
    }

    pub fn add_heat(&mut self, x: f32, y: f32, z: f32, amount: f32) {
        if self.check_disposed("add_heat") || self.reject_non_finite("add_heat", &[amount]) {
            return;
        }
        forces::add_heat(&self.grid, self.buffers.current_mut(), &mut self.index, x, y, z, amount);
    }

    /// Zero every field of both buffers, clear the spatial index and rewind the clock.
    pub fn reset(&mut self) {
        if self.check_disposed("reset") {
            return;
        }
        self.buffers.fill_zero();
        self.index.clear();
        self.time = 0.0;
        self.last_projection = None;
        if let Some(backend) = self.backend.as_mut() {
            backend.reset();
        }
        self.publish_all();
    }

    /// Release every buffer and the backend. Further calls are no-ops.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            log::debug!("dispose called on a disposed simulation");
            return;
        }
        if let Some(mut backend) = self.backend.take() {
            backend.dispose();
        }
        self.buffers.release();
        self.scratch.release();
        self.advector.release();
        self.index.clear();
        self.lifecycle = Lifecycle::Disposed;
        log::info!("fluid simulation disposed at t = {:.3}", self.time);
    }

    fn check_disposed(&self, operation: &str) -> bool {
        let disposed = self.lifecycle == Lifecycle::Disposed;
        if disposed {
            log::debug!("{} ignored: simulation is disposed", operation);
        }
        disposed
    }

    // Swap when accepted, then carry live cells of the current state into the index
    fn swap_or_keep(&mut self, accept: bool) {
        if accept {
            self.buffers.swap();
        }
        if self.config.use_spatial_index {
            self.index.touch_live_cells(self.buffers.current(), ACTIVITY_THRESHOLD);
        }
    }

    // Injections must keep the current buffer finite
    fn reject_non_finite(&self, operation: &str, values: &[f32]) -> bool {
        let rejected = !values.iter().all(|v| v.is_finite());
        if rejected {
            log::warn!("{} ignored: non-finite input {:?}", operation, values);
        }
        rejected
    }

    fn publish(&mut self, kind: FieldKind) {
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(kind, self.buffers.current().field(kind));
        }
    }

    fn publish_all(&mut self) {
        for kind in FieldKind::ALL {
            self.publish(kind);
        }
    }

    /// Simulation clock: number of steps times `time_step` since construction or `reset()`.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// The current (most recently completed) state.
    pub fn state(&self) -> &FluidState {
        self.buffers.current()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Whether steps run on the accelerated backend.
    pub fn uses_gpu(&self) -> bool {
        self.backend.as_ref().is_some_and(|backend| backend.is_ready())
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn active_regions(&self) -> &[f32] {
        self.index.active_regions()
    }

    /// Cells registered since the last rebuild.
    pub fn touched_indices(&self) -> &HashSet<usize> {
        self.index.touched()
    }

    /// Report of the second pressure solve of the last CPU step.
    pub fn last_projection(&self) -> Option<ProjectionReport> {
        self.last_projection
    }
}
