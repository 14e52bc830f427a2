//! Sparse linear algebra for the pressure solve.
//!
//! - [`CsrMatrix`] / [`CsrBuilder`]: triplet assembly into CSR storage
//! - [`Ilu0Preconditioner`]: incomplete LU, zero fill-in
//! - [`BiCgStabSolver`]: preconditioned BiCGSTAB

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix};
pub use preconditioner::{IdentityPreconditioner, Ilu0Preconditioner, Preconditioner, PreconditionerError};
pub use solver::{BiCgStabSolver, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, dot, norm2, norm_inf};
