//! Real-time 3D Eulerian fluid simulation on a cubic voxel grid.
//!
//! [`FluidSimulation`] owns two field buffers and advances them with a fixed
//! pipeline of diffusion, MacCormack advection, pressure projection, vorticity
//! confinement and buoyancy. A coarse [`SpatialIndex`] lets every solver skip
//! the parts of the grid where nothing happens.

pub mod advection;
pub mod boundary;
pub mod conditions;
pub mod config;
pub mod diffusion;
pub mod error;
pub mod forces;
pub mod grid;
pub mod plot;
pub mod pressure_computation;
pub mod simulation;
pub mod spatial;
pub mod visualization;
pub mod vorticity;

pub use config::SimulationConfig;
pub use error::{BackendError, ConfigError, RenderError};
pub use grid::{BufferPair, FieldKind, FluidState, Grid, Vector3, VelocityRef};
pub use pressure_computation::ProjectionReport;
pub use simulation::{FieldSink, FluidSimulation, GpuBackend, Lifecycle};
pub use spatial::SpatialIndex;
