// Window parameters
pub const WINDOW_SCALE: usize = 4; // Size of a displayed cell, in pixels
pub const WINDOW_TITLE: &str = "Voxel Fluid";
pub const SNAPSHOT_PATH: &str = "density_slice.png";
pub const TARGET_FPS: usize = 60;
pub const DENSITY_DISPLAY_MAX: f32 = 2.0; // Density shown at full red



// Demo scene
pub const DEMO_GRID_SIZE: usize = 64;
pub const MOUSE_DENSITY: f32 = 2.0; // Density injected per frame while the left button is down
pub const MOUSE_VELOCITY_SCALE: f32 = 0.5; // Cursor drag, in cells per frame, to velocity
pub const DROP_CHANCE: f64 = 0.05; // Probability of a random drop per frame
pub const DROP_AMOUNT: f32 = 4.0;
pub const DROP_HEAT: f32 = 1.5;



// Default simulation parameters
pub const DEFAULT_GRID_SIZE: usize = 128;
pub const DEFAULT_ITERATIONS: usize = 8;
pub const DEFAULT_TIME_STEP: f32 = 0.025;



// Default physical parameters
pub const DEFAULT_VISCOSITY: f32 = 0.000_000_1;
pub const DEFAULT_DIFFUSION: f32 = 0.000_000_1;
pub const DEFAULT_GRAVITY: f32 = -12.0;
pub const DEFAULT_DENSITY_COEF: f32 = 0.008;
pub const DEFAULT_TEMPERATURE_COEF: f32 = 0.4;



// Default fluid dynamics parameters
pub const DEFAULT_SURFACE_TENSION: f32 = 0.15;
pub const DEFAULT_BUOYANCY: f32 = 15.0;
pub const DEFAULT_VORTICITY_STRENGTH: f32 = 0.3;
pub const DEFAULT_TURBULENCE_FACTOR: f32 = 0.25;
pub const DEFAULT_WAVELENGTH: f32 = 15.0;
pub const DEFAULT_DAMPING: f32 = 0.95;



// Boundary damping, per axis pair
pub const DAMPING_TOP_BOTTOM: f32 = 1.0;
pub const DAMPING_LEFT_RIGHT: f32 = 0.8;
pub const DAMPING_FRONT_BACK: f32 = 0.9;



// Temperature coupling of each solver
pub const DIFFUSE_TEMP_FACTOR: f32 = 0.1;
pub const ADVECT_TEMP_FACTOR: f32 = 0.05;
pub const PROJECT_TEMP_FACTOR: f32 = 0.1;
pub const VORTICITY_TEMP_FACTOR: f32 = 0.2;



// Pressure solver
pub const SOR_OMEGA: f32 = 1.9;
pub const SOR_TOLERANCE: f32 = 1e-4;
pub const PRESSURE_BOUNDARY_SCALE: f32 = -1.0;

// Vorticity confinement
pub const VORTICITY_EPSILON: f32 = 1e-5;

// Height-field relaxation of pressure toward density
pub const WAVE_RELAXATION: f32 = 0.1;



// Injection
pub const FORCE_RADIUS: f32 = 2.5;
pub const VELOCITY_RADIUS: f32 = 3.0;
pub const FALLOFF_SHARPNESS: f32 = 2.0;



// Spatial activity index
pub const COARSE_DIVISOR: usize = 8; // Coarse cell size is N / COARSE_DIVISOR
pub const REGION_ACTIVE: f32 = 1.0;
pub const REGION_COOLING: f32 = 0.5;
pub const ACTIVITY_THRESHOLD: f32 = 1e-4; // Below this a cell is not carried over to the next rebuild
