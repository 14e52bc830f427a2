//! Per-step diagnostics.

use glam::DVec2;

use crate::field::{CellField, StaggeredField};
use crate::grid::Domain;
use crate::particle::Particles;

/// Summary of one successful step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Step number, 1-based.
    pub step: u64,
    /// Simulated time after the step.
    pub time: f64,
    pub solver_iterations: usize,
    /// True residual of the pressure solve.
    pub solver_residual: f64,
    /// Largest |divergence| over water cells after projection.
    pub max_divergence: f64,
    /// CFL number of the velocity used for advection.
    pub cfl: f64,
}

/// Largest |divergence| over water cells and the cell where it occurs.
pub fn max_water_divergence(domain: &Domain, divergence: &CellField) -> (f64, usize, usize) {
    domain
        .water_cells()
        .iter()
        .map(|&(i, j)| (divergence.get(i, j).abs(), i, j))
        .fold((0.0, 0, 0), |best, cur| if cur.0 > best.0 || cur.0.is_nan() { cur } else { best })
}

/// `½ ρ Σ u² Δx²` over faces touching water. Each face carries one
/// component, so this is the usual MAC kinetic energy estimate.
pub fn kinetic_energy(domain: &Domain, u: &StaggeredField, density: f64) -> f64 {
    let wb = &domain.faces().water_boundary;
    let sum_sq: f64 = u
        .x()
        .iter()
        .zip(wb.x())
        .chain(u.y().iter().zip(wb.y()))
        .filter(|&(_, &on)| on)
        .map(|(v, _)| v * v)
        .sum();
    let dx = domain.cell_size();
    0.5 * density * sum_sq * dx * dx
}

/// Largest face speed.
pub fn max_speed(u: &StaggeredField) -> f64 {
    u.max_abs()
}

/// `max|u| Δt / Δx`
pub fn cfl_number(u: &StaggeredField, dt: f64, cell_size: f64) -> f64 {
    max_speed(u) * dt / cell_size
}

/// Axis-aligned bounds `(min, max)` of the particle cloud.
pub fn particle_bounds(particles: &Particles) -> Option<(DVec2, DVec2)> {
    let mut it = particles.iter().copied();
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
}
