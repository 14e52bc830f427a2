//! Preconditioned BiCGSTAB.
//!
//! The pressure matrix is symmetric in exact arithmetic, but the solver does
//! not rely on it. Work vectors are kept between solves so a projection that
//! runs every step does not reallocate.

use serde::{Deserialize, Serialize};

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, dot, norm2, residual};

/// Below this magnitude a BiCGSTAB scalar is treated as a breakdown.
const BREAKDOWN_TOL: f64 = 1e-300;

/// Residual growth factor that counts as divergence.
const DIVERGENCE_FACTOR: f64 = 1e8;

/// Stopping criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Relative tolerance on `‖r‖ / ‖b‖`.
    pub rtol: f64,
    /// Absolute tolerance on `‖r‖`.
    pub atol: f64,
    pub max_iter: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-12,
            atol: 1e-14,
            max_iter: 1000,
        }
    }
}

impl SolverConfig {
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Residual norm the solve must reach for a right-hand side of norm `b_norm`.
    #[inline]
    pub fn target(&self, b_norm: f64) -> f64 {
        (self.rtol * b_norm).max(self.atol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    Converged,
    MaxIterationsReached,
    /// Residual grew by more than `DIVERGENCE_FACTOR` or became non-finite.
    Diverged,
    /// `ρ`, `(r̂, v)` or `ω` vanished.
    Breakdown,
}

/// Outcome of one solve. `residual_norm` is the true residual `‖b - A x‖`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub iterations: usize,
    pub residual_norm: f64,
    pub initial_residual_norm: f64,
    pub relative_residual: f64,
    /// Tolerance that was in force.
    pub target: f64,
}

impl SolverResult {
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// BiCGSTAB with right preconditioning.
#[derive(Debug, Clone)]
pub struct BiCgStabSolver {
    config: SolverConfig,
    r: Vec<f64>,
    r_hat: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    p_hat: Vec<f64>,
    s_hat: Vec<f64>,
}

impl BiCgStabSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r_hat: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            for w in [
                &mut self.r,
                &mut self.r_hat,
                &mut self.p,
                &mut self.v,
                &mut self.s,
                &mut self.t,
                &mut self.p_hat,
                &mut self.s_hat,
            ] {
                *w = vec![0.0; n];
            }
        }
    }

    /// Solve `A x = b`, starting from the contents of `x`.
    pub fn solve<P: Preconditioner + ?Sized>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        assert_eq!(x.len(), n, "solve: x and b differ in length");
        self.ensure_workspace(n);

        let target = self.config.target(norm2(b));

        // r = b - A x
        matrix.mul_vec(x, &mut self.t);
        residual(b, &self.t, &mut self.r);
        let initial = norm2(&self.r);

        if initial <= target {
            return self.finish(SolverStatus::Converged, 0, initial, initial, target);
        }

        let mut status = SolverStatus::MaxIterationsReached;
        let mut iterations = 0;
        let mut true_res = initial;

        // Each pass restarts from the true residual held in `r`.
        while iterations < self.config.max_iter {
            status = self.iterate(matrix, x, precond, &mut iterations, initial, target);

            // Recurrence residuals drift; judge the true one.
            matrix.mul_vec(x, &mut self.t);
            residual(b, &self.t, &mut self.r);
            true_res = norm2(&self.r);

            if status != SolverStatus::Converged || true_res <= target {
                break;
            }
            if !true_res.is_finite() {
                status = SolverStatus::Diverged;
                break;
            }
            log::debug!(
                "BiCGSTAB restart after {} iterations: true residual {:.3e} above target {:.3e}",
                iterations,
                true_res,
                target
            );
            status = SolverStatus::MaxIterationsReached;
        }

        self.finish(status, iterations, true_res, initial, target)
    }

    /// One BiCGSTAB cycle from the residual currently in `r`, sharing the
    /// iteration budget through `iterations`.
    fn iterate<P: Preconditioner + ?Sized>(
        &mut self,
        matrix: &CsrMatrix,
        x: &mut [f64],
        precond: &P,
        iterations: &mut usize,
        initial: f64,
        target: f64,
    ) -> SolverStatus {
        let n = x.len();
        self.r_hat.copy_from_slice(&self.r);
        self.p.fill(0.0);
        self.v.fill(0.0);

        let (mut rho_old, mut alpha, mut omega) = (1.0, 1.0, 1.0);
        let mut first = true;

        while *iterations < self.config.max_iter {
            let rho = dot(&self.r_hat, &self.r);
            if rho.abs() < BREAKDOWN_TOL {
                return SolverStatus::Breakdown;
            }

            let beta = if first { 0.0 } else { (rho / rho_old) * (alpha / omega) };
            first = false;
            rho_old = rho;

            // p = r + β (p - ω v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            precond.apply(&self.p, &mut self.p_hat);
            matrix.mul_vec(&self.p_hat, &mut self.v);

            let r_hat_v = dot(&self.r_hat, &self.v);
            if r_hat_v.abs() < BREAKDOWN_TOL {
                return SolverStatus::Breakdown;
            }
            alpha = rho / r_hat_v;
            *iterations += 1;

            // s = r - α v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            if norm2(&self.s) <= target {
                axpy(alpha, &self.p_hat, x);
                return SolverStatus::Converged;
            }

            precond.apply(&self.s, &mut self.s_hat);
            matrix.mul_vec(&self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt > 0.0 { dot(&self.t, &self.s) / tt } else { 0.0 };

            axpy(alpha, &self.p_hat, x);
            axpy(omega, &self.s_hat, x);

            // r = s - ω t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res = norm2(&self.r);
            log::trace!("BiCGSTAB iter {}: residual = {:.6e}", *iterations, res);

            if !res.is_finite() || res > initial * DIVERGENCE_FACTOR {
                return SolverStatus::Diverged;
            }
            if res <= target {
                return SolverStatus::Converged;
            }
            if omega.abs() < BREAKDOWN_TOL {
                return SolverStatus::Breakdown;
            }
        }
        SolverStatus::MaxIterationsReached
    }

    fn finish(&self, status: SolverStatus, iterations: usize, res: f64, initial: f64, target: f64) -> SolverResult {
        SolverResult {
            status,
            iterations,
            residual_norm: res,
            initial_residual_norm: initial,
            relative_residual: if initial > 0.0 { res / initial } else { 0.0 },
            target,
        }
    }
}
