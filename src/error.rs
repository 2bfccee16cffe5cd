//! Error types for the fluid core.

use thiserror::Error;

/// A simulation parameter that cannot produce a meaningful simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no interior cells.
    #[error("grid_size must be at least 3, got {0}")]
    GridTooSmall(usize),

    /// The relaxation solvers would never run.
    #[error("iterations must be at least 1, got {0}")]
    NoIterations(usize),

    /// The time step is zero, negative or not finite.
    #[error("time_step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),

    /// A physical coefficient is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFinite {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Failure of an accelerated backend to come up.
///
/// Never surfaced to the caller of the simulation: it is logged and the CPU
/// path is used instead.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The device or context could not be created.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend cannot handle this grid resolution.
    #[error("unsupported grid size {0}")]
    UnsupportedGridSize(usize),
}

/// Failure of the demo viewer or of a snapshot export.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),

    #[error("snapshot export failed: {0}")]
    Snapshot(String),

    #[error("depth {depth} is outside a grid of size {size}")]
    SliceOutOfRange { depth: usize, size: usize },
}
