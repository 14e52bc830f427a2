//! Simulation configuration.
//!
//! Everything a run needs is in [`SimConfig`]; it round-trips through JSON
//! with every field optional (missing fields take their defaults).

use std::ops::Range;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::DomainLayout;
use crate::linalg::SolverConfig;

/// Initial horizontal jet: x-faces `(row, cols)` start at `velocity`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JetConfig {
    pub row: usize,
    pub cols: Range<usize>,
    pub velocity: f64,
}

impl Default for JetConfig {
    fn default() -> Self {
        Self {
            row: 10,
            cols: 10..20,
            velocity: -30.0,
        }
    }
}

/// Physical parameters shared by the operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidParams {
    /// Time step Δt
    pub dt: f64,
    /// Density ρ
    pub density: f64,
    /// Uniform body acceleration; positive y points towards larger row index.
    pub gravity: DVec2,
    /// Normal velocity imposed on water-solid faces.
    pub solid_velocity: f64,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            dt: 0.5,
            density: 1.0,
            gravity: DVec2::new(0.0, 9.8),
            solid_velocity: 0.0,
        }
    }
}

/// Full run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid rows n
    pub rows: usize,
    /// Grid columns m
    pub cols: usize,
    /// Cell size Δx
    pub cell_size: f64,
    /// Time step Δt
    pub dt: f64,
    /// Density ρ
    pub density: f64,
    #[serde(with = "dvec2_serde")]
    pub gravity: DVec2,
    pub solid_velocity: f64,
    pub layout: DomainLayout,
    /// `None` starts from rest.
    pub initial_jet: Option<JetConfig>,
    pub solver: SolverConfig,
    /// Largest |divergence| accepted in a water cell after projection.
    pub divergence_tolerance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let fluid = FluidParams::default();
        Self {
            rows: 30,
            cols: 30,
            cell_size: 1.0,
            dt: fluid.dt,
            density: fluid.density,
            gravity: fluid.gravity,
            solid_velocity: fluid.solid_velocity,
            layout: DomainLayout::Wedge,
            initial_jet: Some(JetConfig::default()),
            solver: SolverConfig::default(),
            divergence_tolerance: 1e-9,
        }
    }
}

impl SimConfig {
    /// Wedge domain of the given size, starting from rest.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            initial_jet: None,
            ..Default::default()
        }
    }

    /// Custom layout; the grid size is taken from it.
    pub fn with_layout(mut self, layout: DomainLayout) -> Self {
        if let Some((rows, cols)) = layout.custom_shape() {
            self.rows = rows;
            self.cols = cols;
        }
        self.layout = layout;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_gravity(mut self, gravity: DVec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_solid_velocity(mut self, solid_velocity: f64) -> Self {
        self.solid_velocity = solid_velocity;
        self
    }

    pub fn with_jet(mut self, jet: Option<JetConfig>) -> Self {
        self.initial_jet = jet;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_divergence_tolerance(mut self, tolerance: f64) -> Self {
        self.divergence_tolerance = tolerance;
        self
    }

    pub fn fluid_params(&self) -> FluidParams {
        FluidParams {
            dt: self.dt,
            density: self.density,
            gravity: self.gravity,
            solid_velocity: self.solid_velocity,
        }
    }

    /// Check numeric options. Grid and layout problems are reported by
    /// domain construction instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("cell_size", self.cell_size),
            ("dt", self.dt),
            ("density", self.density),
            ("divergence_tolerance", self.divergence_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("gravity.x", self.gravity.x),
            ("gravity.y", self.gravity.y),
            ("solid_velocity", self.solid_velocity),
            ("solver.rtol", self.solver.rtol),
            ("solver.atol", self.solver.atol),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        if self.solver.max_iter == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if let Some(jet) = &self.initial_jet {
            if !jet.velocity.is_finite() {
                return Err(ConfigError::NotFinite {
                    name: "initial_jet.velocity",
                    value: jet.velocity,
                });
            }
            if jet.row >= self.rows || jet.cols.end > self.cols + 1 {
                return Err(ConfigError::JetOutOfBounds {
                    row: jet.row,
                    col_start: jet.cols.start,
                    col_end: jet.cols.end,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// glam is built without its serde feature; store vectors as `{x, y}`.
mod dvec2_serde {
    use glam::DVec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct DVec2Repr {
        x: f64,
        y: f64,
    }

    pub fn serialize<S>(vec: &DVec2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DVec2Repr { x: vec.x, y: vec.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DVec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = DVec2Repr::deserialize(deserializer)?;
        Ok(DVec2::new(repr.x, repr.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scenario() {
        let cfg = SimConfig::default();
        assert_eq!((cfg.rows, cfg.cols), (30, 30));
        assert_eq!(cfg.dt, 0.5);
        assert_eq!(cfg.gravity, DVec2::new(0.0, 9.8));
        assert_eq!(cfg.initial_jet, Some(JetConfig { row: 10, cols: 10..20, velocity: -30.0 }));
        assert!(cfg.validate().is_ok());
        assert!(SimConfig::new(5, 5).initial_jet.is_none());
    }

    #[test]
    fn test_json_roundtrip_and_partial_input() {
        let cfg = SimConfig::new(8, 6).with_gravity(DVec2::new(0.5, -2.0));
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains(r#""gravity":{"x":0.5,"y":-2.0}"#), "{json}");
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), cfg);

        let partial = SimConfig::from_json_str(r#"{"rows": 12, "dt": 0.1}"#).unwrap();
        assert_eq!(partial.rows, 12);
        assert_eq!(partial.dt, 0.1);
        assert_eq!(partial.cols, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = SimConfig::default().with_dt(0.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { name: "dt", .. }));

        let err = SimConfig::default().with_density(f64::NAN).validate().unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { name: "density", .. }));

        let err = SimConfig::default()
            .with_gravity(DVec2::new(f64::INFINITY, 0.0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFinite { name: "gravity.x", .. }));

        let err = SimConfig::default()
            .with_solver(SolverConfig { max_iter: 0, ..Default::default() })
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroIterations));
    }

    #[test]
    fn test_jet_must_fit_grid() {
        let cfg = SimConfig::new(5, 5).with_jet(Some(JetConfig::default()));
        assert!(matches!(cfg.validate(), Err(ConfigError::JetOutOfBounds { row: 10, .. })));
    }

    #[test]
    fn test_custom_layout_sets_size() {
        let cfg = SimConfig::new(30, 30).with_layout(DomainLayout::custom(&["#..#", "#~~#", "####"]));
        assert_eq!((cfg.rows, cfg.cols), (3, 4));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(SimConfig::from_json_str("{rows: 3"), Err(ConfigError::Json(_))));
    }
}
