//! Free-surface fluid simulation on a 2D MAC grid.
//!
//! Incompressible flow with:
//! - Fixed solid / water / air material mask (container + wedge by default)
//! - Chorin pressure projection, ILU(0)-preconditioned BiCGSTAB
//! - Semi-Lagrangian velocity advection
//! - Marker particles seeded at water cell centers
//!
//! This crate handles simulation only. A renderer reads the per-step state
//! through [`Simulation::state`] or a [`FrameSink`].

pub mod advection;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod grid;
pub mod linalg;
pub mod operators;
pub mod particle;
pub mod pressure;
pub mod simulation;

pub use config::{FluidParams, JetConfig, SimConfig};
pub use diagnostics::StepReport;
pub use error::{ConfigError, DomainError, SimError, SimResult, SolverError};
pub use field::{CellField, PressureField, Staggered, StaggeredField, StaggeredMask};
pub use grid::{CellType, Domain, DomainLayout, FaceMasks};
pub use linalg::{SolverConfig, SolverStatus};
pub use particle::Particles;
pub use pressure::{PressureProjection, Projection};
pub use simulation::{FrameSink, Simulation, SimulationState};
