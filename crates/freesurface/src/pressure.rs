//! Pressure projection.
//!
//! Solves for the pressure in water cells that makes the corrected velocity
//! divergence-free, then applies the correction. Air cells are a zero
//! pressure boundary; solid faces impose the solid velocity.
//!
//! The material mask never changes during a run, so the Poisson matrix and
//! its ILU(0) factors are built once when the projection is created.

use crate::config::FluidParams;
use crate::error::SolverError;
use crate::field::{CellField, PressureField, StaggeredField};
use crate::grid::{CellType, Domain};
use crate::linalg::{BiCgStabSolver, CsrBuilder, CsrMatrix, Ilu0Preconditioner, SolverConfig, SolverResult};
use crate::operators::{divergence, pressure_gradient_update};

/// Poisson matrix over the water cells, in the order of
/// [`Domain::water_cells`].
///
/// Row `k` has the water-or-air neighbour count on the diagonal and `-1` for
/// each water neighbour, all scaled by `Δt / (ρ Δx²)`. Solid neighbours do
/// not appear.
pub fn assemble_poisson_matrix(domain: &Domain, params: &FluidParams) -> CsrMatrix {
    let unknowns = unknown_index(domain);
    let n = domain.water_count();
    let mut builder = CsrBuilder::new_square(n).with_capacity(5 * n);

    for (row, &(i, j)) in domain.water_cells().iter().enumerate() {
        builder.push(row, row, f64::from(domain.water_or_air_neighbors(i, j)));

        // Water is never on the border, so every neighbour exists.
        for (ni, nj) in [(i - 1, j), (i + 1, j), (i, j - 1), (i, j + 1)] {
            if domain.cell_type(ni, nj) == CellType::Water {
                if let Some(col) = unknowns[domain.cell_index(ni, nj)] {
                    builder.push(row, col, -1.0);
                }
            }
        }
    }

    let mut matrix = builder.build();
    let dx = domain.cell_size();
    matrix.scale(params.dt / (params.density * dx * dx));
    matrix
}

/// Cell index -> unknown index (water cells only).
fn unknown_index(domain: &Domain) -> Vec<Option<usize>> {
    let mut map = vec![None; domain.rows() * domain.cols()];
    for (k, &(i, j)) in domain.water_cells().iter().enumerate() {
        map[domain.cell_index(i, j)] = Some(k);
    }
    map
}

/// Result of one projection.
#[derive(Debug, Clone)]
pub struct Projection {
    pub velocity: StaggeredField,
    pub pressure: PressureField,
    pub solve: SolverResult,
}

/// Reusable projection operator for a fixed domain.
#[derive(Debug, Clone)]
pub struct PressureProjection {
    params: FluidParams,
    matrix: CsrMatrix,
    precond: Ilu0Preconditioner,
    solver: BiCgStabSolver,
    rhs: Vec<f64>,
    solution: Vec<f64>,
}

impl PressureProjection {
    pub fn new(domain: &Domain, params: FluidParams, solver: SolverConfig) -> Result<Self, SolverError> {
        let matrix = assemble_poisson_matrix(domain, &params);
        let precond = Ilu0Preconditioner::new(&matrix)?;
        let n = matrix.n_rows();

        log::debug!(
            "pressure system: {} unknowns, {} non-zeros, preconditioner ILU(0)",
            n,
            matrix.nnz()
        );

        Ok(Self {
            params,
            matrix,
            precond,
            solver: BiCgStabSolver::new(solver),
            rhs: vec![0.0; n],
            solution: vec![0.0; n],
        })
    }

    #[inline]
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    #[inline]
    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    /// Solve for water pressure and return the corrected velocity.
    ///
    /// `pressure` supplies the values kept in non-water cells; the inputs are
    /// not modified.
    pub fn project(
        &mut self,
        domain: &Domain,
        velocity: &StaggeredField,
        pressure: &PressureField,
    ) -> Result<Projection, SolverError> {
        let div = divergence(velocity, domain, self.params.solid_velocity);

        for (k, &(i, j)) in domain.water_cells().iter().enumerate() {
            self.rhs[k] = -div.get(i, j);
        }
        self.solution.fill(0.0);

        let solve = self
            .solver
            .solve(&self.matrix, &self.rhs, &mut self.solution, &self.precond);

        if !solve.is_converged() {
            return Err(SolverError::NotConverged {
                status: solve.status,
                iterations: solve.iterations,
                residual: solve.residual_norm,
                target: solve.target,
            });
        }

        let mut new_pressure: CellField = pressure.clone();
        for (k, &(i, j)) in domain.water_cells().iter().enumerate() {
            new_pressure.set(i, j, self.solution[k]);
        }

        let new_velocity = pressure_gradient_update(velocity, &new_pressure, domain, &self.params);

        Ok(Projection {
            velocity: new_velocity,
            pressure: new_pressure,
            solve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DomainLayout;
    use crate::linalg::SolverStatus;

    fn params() -> FluidParams {
        FluidParams {
            dt: 0.5,
            density: 1.0,
            ..FluidParams::default()
        }
    }

    #[test]
    fn test_matrix_structure() {
        let d = Domain::new(5, 5, 1.0, &DomainLayout::Wedge).unwrap();
        let a = assemble_poisson_matrix(&d, &params());
        assert_eq!(a.n_rows(), 5);
        assert!(a.is_symmetric(0.0));

        // Scale Δt/(ρΔx²) = 0.5
        // (1,1): air above, water right -> diag 2, one off-diagonal.
        assert_eq!(a.get(0, 0), 1.0);
        assert_eq!(a.get(0, 1), -0.5);
        // (1,2): air above, water on three sides.
        assert_eq!(a.get(1, 1), 2.0);
        // (3,2): only the water cell above.
        assert_eq!(a.get(4, 4), 0.5);
        assert_eq!(a.get(4, 3), -0.5);
        assert_eq!(a.nnz(), 5 + 2 * 4);
    }

    #[test]
    fn test_single_cell_surrounded_by_air() {
        let d = Domain::from_layout(&["#...#", "#.~.#", "#...#", "#####"], 1.0).unwrap();
        let mut u = StaggeredField::zeros(4, 5);
        u.set_y(1, 2, 1.0);
        let div = divergence(&u, &d, 0.0).get(1, 2);
        assert_eq!(div, -1.0);

        let p = params();
        let mut proj = PressureProjection::new(&d, p, SolverConfig::default()).unwrap();
        let out = proj.project(&d, &u, &CellField::zeros(4, 5)).unwrap();

        let expected = -div * p.density / (4.0 * p.dt);
        assert!((out.pressure.get(1, 2) - expected).abs() < 1e-12);
        assert!(divergence(&out.velocity, &d, 0.0).get(1, 2).abs() < 1e-12);
    }

    #[test]
    fn test_single_cell_in_a_cup() {
        let dx = 2.0;
        let d = Domain::from_layout(&["#.#", "#~#", "###"], dx).unwrap();
        let mut u = StaggeredField::zeros(3, 3);
        u.set_y(1, 1, 3.0);
        let p = params();
        let div = divergence(&u, &d, 0.0).get(1, 1);

        let mut proj = PressureProjection::new(&d, p, SolverConfig::default()).unwrap();
        let out = proj.project(&d, &u, &CellField::zeros(3, 3)).unwrap();

        let expected = -div * p.density * dx * dx / p.dt;
        assert!((out.pressure.get(1, 1) - expected).abs() < 1e-12);
        // The only free face is the top one; it must carry no net flow.
        assert!(out.velocity.y_at(1, 1).abs() < 1e-12);
    }

    #[test]
    fn test_non_water_pressure_is_carried_over() {
        let d = Domain::new(6, 6, 1.0, &DomainLayout::Wedge).unwrap();
        let mut prev = CellField::zeros(6, 6);
        prev.set(5, 0, 42.0); // solid corner
        let u = StaggeredField::uniform(6, 6, 0.3, -0.2);

        let mut proj = PressureProjection::new(&d, params(), SolverConfig::default()).unwrap();
        let out = proj.project(&d, &u, &prev).unwrap();
        assert_eq!(out.pressure.get(5, 0), 42.0);
        assert_eq!(out.pressure.get(0, 2), 0.0);
    }

    #[test]
    fn test_non_convergence_is_an_error() {
        let d = Domain::new(30, 30, 1.0, &DomainLayout::Wedge).unwrap();
        let cfg = SolverConfig::new(1e-14, 1).with_atol(0.0);
        let mut proj = PressureProjection::new(&d, params(), cfg).unwrap();
        let mut u = StaggeredField::zeros(30, 30);
        for j in 10..20 {
            u.set_x(10, j, -30.0);
        }
        let err = proj.project(&d, &u, &CellField::zeros(30, 30)).unwrap_err();
        assert!(
            matches!(err, SolverError::NotConverged { status: SolverStatus::MaxIterationsReached, .. }),
            "{err:?}"
        );
    }
}
