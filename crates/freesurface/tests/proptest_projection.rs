//! Property-based tests for the projection and the step loop using proptest
//!
//! These tests verify invariants across random grids and velocity fields:
//! - Projection leaves every water cell divergence-free
//! - Water-solid faces are pinned to the solid velocity
//! - Particle count conservation
//! - No NaN values in velocity, pressure or particle positions

use freesurface::operators::divergence;
use freesurface::{CellField, Domain, DomainLayout, PressureProjection, SimConfig, Simulation, StaggeredField};
use proptest::prelude::*;

const DIV_TOL: f64 = 1e-9;
const MAX_SPEED: f64 = 2.0;

/// Random grid size plus a velocity field of matching shape.
fn grid_and_velocity() -> impl Strategy<Value = (usize, usize, Vec<f64>, Vec<f64>)> {
    (4usize..14, 4usize..14).prop_flat_map(|(n, m)| {
        (
            Just(n),
            Just(m),
            prop::collection::vec(-MAX_SPEED..MAX_SPEED, n * (m + 1)),
            prop::collection::vec(-MAX_SPEED..MAX_SPEED, (n + 1) * m),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: projection makes any velocity field divergence-free in water
    #[test]
    fn test_projection_is_divergence_free((n, m, x, y) in grid_and_velocity(), solid_velocity in -0.5f64..0.5) {
        let domain = Domain::new(n, m, 1.0, &DomainLayout::Wedge).unwrap();
        let params = SimConfig::new(n, m).with_solid_velocity(solid_velocity).fluid_params();
        let mut proj = PressureProjection::new(&domain, params, Default::default()).unwrap();

        let u = StaggeredField::from_parts(n, m, x, y).unwrap();
        let out = proj.project(&domain, &u, &CellField::zeros(n, m)).unwrap();

        let div = divergence(&out.velocity, &domain, solid_velocity);
        for &(i, j) in domain.water_cells() {
            prop_assert!(div.get(i, j).abs() < DIV_TOL, "cell ({}, {}): {}", i, j, div.get(i, j));
        }

        let ws = &domain.faces().water_solid;
        for (v, &on) in out.velocity.x().iter().zip(ws.x()).chain(out.velocity.y().iter().zip(ws.y())) {
            if on {
                prop_assert_eq!(*v, solid_velocity);
            }
        }
    }

    /// Property: stepping never creates or loses particles and stays finite
    #[test]
    fn test_steps_conserve_particles((n, m, x, y) in grid_and_velocity(), steps in 1u64..4) {
        let cfg = SimConfig::new(n, m).with_dt(0.1);
        let mut sim = Simulation::new(cfg).unwrap();
        sim.set_velocity(StaggeredField::from_parts(n, m, x, y).unwrap()).unwrap();
        let count = sim.particles().len();

        for _ in 0..steps {
            let report = sim.step().unwrap();
            prop_assert!(report.max_divergence < DIV_TOL);
        }

        prop_assert_eq!(sim.particles().len(), count);
        prop_assert!(sim.velocity().is_finite());
        prop_assert!(sim.pressure().as_slice().iter().all(|p| p.is_finite()));
        prop_assert!(sim.particles().iter().all(|p| p.is_finite()));
    }
}
