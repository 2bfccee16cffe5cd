use crate::conditions::*;
use crate::error::ConfigError;

/// Parameters of one simulation instance.
///
/// Fixed at construction. A different configuration needs a new
/// [`FluidSimulation`](crate::simulation::FluidSimulation).
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Cells per axis (N).
    pub grid_size: usize,
    /// Relaxation rounds for diffusion and pressure.
    pub iterations: usize,
    /// Fixed time step consumed by every `step()`.
    pub time_step: f32,
    /// Velocity diffusion rate.
    pub viscosity: f32,
    /// Density diffusion rate.
    pub diffusion: f32,
    pub gravity: f32,
    /// Density coefficient of the buoyancy term.
    pub density: f32,
    /// Temperature coefficient of the buoyancy term.
    pub temperature: f32,
    pub vorticity_strength: f32,
    pub surface_tension: f32,
    pub buoyancy: f32,
    /// Scales the curl magnitude by local temperature.
    pub turbulence_factor: f32,
    pub wavelength: f32,
    pub damping: f32,
    /// Try the accelerated backend before falling back to the CPU solver.
    pub use_gpu: bool,
    /// Skip cells outside the active regions.
    pub use_spatial_index: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            iterations: DEFAULT_ITERATIONS,
            time_step: DEFAULT_TIME_STEP,
            viscosity: DEFAULT_VISCOSITY,
            diffusion: DEFAULT_DIFFUSION,
            gravity: DEFAULT_GRAVITY,
            density: DEFAULT_DENSITY_COEF,
            temperature: DEFAULT_TEMPERATURE_COEF,
            vorticity_strength: DEFAULT_VORTICITY_STRENGTH,
            surface_tension: DEFAULT_SURFACE_TENSION,
            buoyancy: DEFAULT_BUOYANCY,
            turbulence_factor: DEFAULT_TURBULENCE_FACTOR,
            wavelength: DEFAULT_WAVELENGTH,
            damping: DEFAULT_DAMPING,
            use_gpu: true,
            use_spatial_index: true,
        }
    }
}

impl SimulationConfig {
    /// A configuration with every physical coefficient at zero.
    ///
    /// Useful as a base when only one effect should be observed.
    pub fn quiet(grid_size: usize, iterations: usize, time_step: f32) -> Self {
        Self {
            grid_size,
            iterations,
            time_step,
            viscosity: 0.0,
            diffusion: 0.0,
            gravity: 0.0,
            density: 0.0,
            temperature: 0.0,
            vorticity_strength: 0.0,
            surface_tension: 0.0,
            buoyancy: 0.0,
            turbulence_factor: 0.0,
            wavelength: 0.0,
            damping: 0.0,
            use_gpu: false,
            use_spatial_index: true,
        }
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_viscosity(mut self, viscosity: f32) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_diffusion(mut self, diffusion: f32) -> Self {
        self.diffusion = diffusion;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_vorticity_strength(mut self, vorticity_strength: f32) -> Self {
        self.vorticity_strength = vorticity_strength;
        self
    }

    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn with_spatial_index(mut self, use_spatial_index: bool) -> Self {
        self.use_spatial_index = use_spatial_index;
        self
    }

    /// Check that the configuration describes a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.iterations < 1 {
            return Err(ConfigError::NoIterations(self.iterations));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }

        let coefficients = [
            ("viscosity", self.viscosity),
            ("diffusion", self.diffusion),
            ("gravity", self.gravity),
            ("density", self.density),
            ("temperature", self.temperature),
            ("vorticity_strength", self.vorticity_strength),
            ("surface_tension", self.surface_tension),
            ("buoyancy", self.buoyancy),
            ("turbulence_factor", self.turbulence_factor),
            ("wavelength", self.wavelength),
            ("damping", self.damping),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_degenerate_grid() {
        let config = SimulationConfig::default().with_grid_size(2);
        assert_eq!(config.validate(), Err(ConfigError::GridTooSmall(2)));
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = SimulationConfig::default().with_iterations(0);
        assert_eq!(config.validate(), Err(ConfigError::NoIterations(0)));
    }

    #[test]
    fn test_rejects_bad_time_step() {
        for dt in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let config = SimulationConfig::default().with_time_step(dt);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidTimeStep(_))),
                "time_step {} should be rejected",
                dt
            );
        }
    }

    #[test]
    fn test_rejects_non_finite_coefficient() {
        let config = SimulationConfig::default().with_gravity(f32::NAN);
        match config.validate() {
            Err(ConfigError::NonFinite { name, .. }) => assert_eq!(name, "gravity"),
            other => panic!("expected NonFinite, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_config_has_no_physics() {
        let config = SimulationConfig::quiet(8, 4, 1.0 / 60.0);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.gravity, 0.0);
        assert_eq!(config.vorticity_strength, 0.0);
        assert!(!config.use_gpu);
    }
}
