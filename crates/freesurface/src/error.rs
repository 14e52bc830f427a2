//! Error types for domain construction, configuration and time stepping.
//!
//! Every failure here is terminal for the current run: the driver never
//! retries, it hands the error back and keeps its previous state.

use thiserror::Error;

use crate::field::CellField;
use crate::linalg::{PreconditionerError, SolverStatus};

/// Crate-wide result alias.
pub type SimResult<T> = Result<T, SimError>;

/// Invalid configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("solver iteration budget must be at least 1")]
    ZeroIterations,

    #[error("initial jet (row {row}, faces {col_start}..{col_end}) lies outside a {rows}x{cols} grid")]
    JetOutOfBounds {
        row: usize,
        col_start: usize,
        col_end: usize,
        rows: usize,
        cols: usize,
    },

    #[error("failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Violations of the material-mask invariants, detected at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("grid must be at least 3x3, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },

    #[error("{what} has {found} entries, expected {expected}")]
    WrongLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("layout row {row} has {found} columns, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("layout character {ch:?} at ({row}, {col}) is not one of '#', '~', '.'")]
    UnknownCell { ch: char, row: usize, col: usize },

    #[error("masks do not partition the grid at cell ({row}, {col}): solid={solid} water={water} air={air}")]
    NotAPartition {
        row: usize,
        col: usize,
        solid: u8,
        water: u8,
        air: u8,
    },

    #[error("domain contains no water cells")]
    NoWater,

    #[error("water cell ({row}, {col}) touches the grid border")]
    WaterOnBorder { row: usize, col: usize },

    #[error("water cell ({row}, {col}) has no water or air neighbours")]
    IsolatedWater { row: usize, col: usize },

    /// A connected body of water with no free surface. Its pressure is only
    /// defined up to a constant.
    #[error("water body containing ({row}, {col}) is sealed from the air")]
    SealedWater { row: usize, col: usize },
}

/// Failures of the pressure linear solve.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("preconditioner setup failed: {0}")]
    Preconditioner(#[from] PreconditionerError),

    #[error("pressure solve did not converge: {status:?} after {iterations} iterations (residual {residual:.3e}, target {target:.3e})")]
    NotConverged {
        status: SolverStatus,
        iterations: usize,
        residual: f64,
        target: f64,
    },
}

/// Top-level simulation error.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid domain: {0}")]
    Domain(#[from] DomainError),

    #[error("pressure projection failed: {0}")]
    Solver(#[from] SolverError),

    /// The projected velocity is not divergence-free inside the water.
    /// Carries the full divergence field for inspection.
    #[error("non-zero divergence {max_divergence:.3e} at water cell ({row}, {col}) exceeds tolerance {tolerance:.1e}")]
    DivergenceCheck {
        max_divergence: f64,
        row: usize,
        col: usize,
        tolerance: f64,
        divergence: CellField,
    },

    #[error("{what} shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}
