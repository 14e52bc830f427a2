//! Time stepping driver.
//!
//! One step runs, strictly in order:
//! 1. body forces on faces touching water
//! 2. pressure projection
//! 3. divergence check on the projected velocity
//! 4. advection of the velocity field and the marker particles
//!
//! The state is replaced only after every stage succeeded; an error leaves
//! the previous state in place.

use crate::advection::{advect_particles, advect_velocity};
use crate::config::SimConfig;
use crate::diagnostics::{cfl_number, max_water_divergence, StepReport};
use crate::error::{SimError, SimResult};
use crate::field::{CellField, PressureField, StaggeredField};
use crate::grid::{Domain, VelocitySampler};
use crate::operators::{apply_body_forces, divergence};
use crate::particle::Particles;
use crate::pressure::PressureProjection;

/// Everything that changes from one step to the next.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    pub velocity: StaggeredField,
    pub pressure: PressureField,
    pub particles: Particles,
}

/// Receives a snapshot after every completed step.
///
/// Renderers and recorders implement this; they only ever see the state.
pub trait FrameSink {
    fn on_frame(&mut self, step: u64, state: &SimulationState);
}

impl<F> FrameSink for F
where
    F: FnMut(u64, &SimulationState),
{
    fn on_frame(&mut self, step: u64, state: &SimulationState) {
        self(step, state)
    }
}

/// Free-surface simulation on a fixed domain.
pub struct Simulation {
    config: SimConfig,
    domain: Domain,
    projection: PressureProjection,
    state: SimulationState,
    step_count: u64,
    time: f64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let domain = Domain::new(config.rows, config.cols, config.cell_size, &config.layout)?;
        let projection = PressureProjection::new(&domain, config.fluid_params(), config.solver)?;

        let mut velocity = StaggeredField::zeros(domain.rows(), domain.cols());
        if let Some(jet) = &config.initial_jet {
            for j in jet.cols.clone() {
                velocity.set_x(jet.row, j, jet.velocity);
            }
        }

        let state = SimulationState {
            velocity,
            pressure: CellField::zeros(domain.rows(), domain.cols()),
            particles: Particles::from_water_cells(&domain),
        };

        log::info!(
            "simulation: {}x{} grid, dx={}, dt={}, {} water cells, {} pressure non-zeros",
            domain.rows(),
            domain.cols(),
            config.cell_size,
            config.dt,
            domain.water_count(),
            projection.matrix().nnz()
        );

        Ok(Self {
            config,
            domain,
            projection,
            state,
            step_count: 0,
            time: 0.0,
        })
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance one time step.
    pub fn step(&mut self) -> SimResult<StepReport> {
        let params = *self.projection.params();
        let dx = self.domain.cell_size();

        let forced = apply_body_forces(&self.state.velocity, &self.domain, params.gravity, params.dt);
        let projected = self.projection.project(&self.domain, &forced, &self.state.pressure)?;

        let div = divergence(&projected.velocity, &self.domain, params.solid_velocity);
        let (max_divergence, row, col) = max_water_divergence(&self.domain, &div);
        let tolerance = self.config.divergence_tolerance;
        if max_divergence.is_nan() || max_divergence > tolerance {
            log::error!(
                "step {}: divergence {:.3e} at water cell ({}, {}) after projection",
                self.step_count + 1,
                max_divergence,
                row,
                col
            );
            return Err(SimError::DivergenceCheck {
                max_divergence,
                row,
                col,
                tolerance,
                divergence: div,
            });
        }

        let cfl = cfl_number(&projected.velocity, params.dt, dx);
        if cfl > 1.0 {
            log::warn!("step {}: CFL {:.2} > 1", self.step_count + 1, cfl);
        }

        let velocity = advect_velocity(&projected.velocity, dx, params.dt);
        let mut particles = self.state.particles.clone();
        let sampler = VelocitySampler::new(&projected.velocity, dx);
        advect_particles(&mut particles, &sampler, params.dt);

        self.state = SimulationState {
            velocity,
            pressure: projected.pressure,
            particles,
        };
        self.step_count += 1;
        self.time += params.dt;

        let report = StepReport {
            step: self.step_count,
            time: self.time,
            solver_iterations: projected.solve.iterations,
            solver_residual: projected.solve.residual_norm,
            max_divergence,
            cfl,
        };
        log::debug!(
            "step {}: t={:.3} iters={} residual={:.3e} max_div={:.3e} cfl={:.3}",
            report.step,
            report.time,
            report.solver_iterations,
            report.solver_residual,
            report.max_divergence,
            report.cfl
        );
        Ok(report)
    }

    /// Run `steps` steps, handing each new state to `sink`. Stops at the
    /// first error.
    pub fn run<S: FrameSink + ?Sized>(&mut self, steps: u64, sink: &mut S) -> SimResult<()> {
        for _ in 0..steps {
            self.step()?;
            sink.on_frame(self.step_count, &self.state);
        }
        Ok(())
    }

    // ========================================================================
    // State access
    // ========================================================================

    /// Replace the velocity field, e.g. to set initial conditions.
    pub fn set_velocity(&mut self, velocity: StaggeredField) -> SimResult<()> {
        let expected = (self.domain.rows(), self.domain.cols());
        let found = (velocity.rows(), velocity.cols());
        if expected != found {
            return Err(SimError::ShapeMismatch {
                what: "velocity",
                expected,
                found,
            });
        }
        self.state.velocity = velocity;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    #[inline]
    pub fn velocity(&self) -> &StaggeredField {
        &self.state.velocity
    }

    #[inline]
    pub fn pressure(&self) -> &PressureField {
        &self.state.pressure
    }

    #[inline]
    pub fn particles(&self) -> &Particles {
        &self.state.particles
    }

    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Divergence of the current velocity field.
    pub fn divergence(&self) -> CellField {
        divergence(&self.state.velocity, &self.domain, self.config.solid_velocity)
    }
}
