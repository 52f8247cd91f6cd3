//! Configuration
//!
//! All structures can be deserialised (feature `serde`) and read from RON with
//! [RONImport](crate::traits::RONImport).
use crate::error::{FdstagError, Result};
use crate::types::IndexMode;

/// Non-uniform spacing along one axis
///
/// The axis is split into `cells.len()` segments. Segment `s` runs from delimiter `s - 1` to
/// delimiter `s` (the axis ends for the first and last segment), holds `cells[s]` cells, and
/// has ratio `biases[s]` between its last and first cell size.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct SegmentInput {
    /// Interior segment boundaries
    pub delimiters: Vec<f64>,
    /// Number of cells in each segment
    pub cells: Vec<usize>,
    /// Last-to-first cell size ratio of each segment (empty: uniform)
    #[cfg_attr(feature = "serde", serde(default))]
    pub biases: Vec<f64>,
}

/// Discretisation of one axis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct AxisConfig {
    /// Coordinate of the first node
    pub begin: f64,
    /// Coordinate of the last node
    pub end: f64,
    /// Total number of cells
    pub cells: usize,
    /// Optional segments (uniform spacing if absent)
    #[cfg_attr(feature = "serde", serde(default))]
    pub segments: Option<SegmentInput>,
}

impl AxisConfig {
    /// Uniformly spaced axis
    pub fn uniform(begin: f64, end: f64, cells: usize) -> Self {
        Self {
            begin,
            end,
            cells,
            segments: None,
        }
    }
}

/// Discretisation of the box
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct GridConfig {
    /// x-axis
    pub x: AxisConfig,
    /// y-axis
    pub y: AxisConfig,
    /// z-axis
    pub z: AxisConfig,
    /// Fixed process grid (chosen automatically if absent)
    #[cfg_attr(feature = "serde", serde(default))]
    pub processes: Option<[usize; 3]>,
}

impl GridConfig {
    /// Create a configuration with an automatic process grid
    pub fn new(x: AxisConfig, y: AxisConfig, z: AxisConfig) -> Self {
        Self {
            x,
            y,
            z,
            processes: None,
        }
    }

    /// Uniform grid of the box `[begin, end]`
    pub fn uniform(begin: [f64; 3], end: [f64; 3], cells: [usize; 3]) -> Self {
        Self::new(
            AxisConfig::uniform(begin[0], end[0], cells[0]),
            AxisConfig::uniform(begin[1], end[1], cells[1]),
            AxisConfig::uniform(begin[2], end[2], cells[2]),
        )
    }

    /// Axis configurations in x, y, z order
    pub fn axes(&self) -> [&AxisConfig; 3] {
        [&self.x, &self.y, &self.z]
    }
}

/// Residual evaluation settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResidualConfig {
    /// Gravity acceleration vector
    pub gravity: [f64; 3],
    /// Density gradient stabilisation parameter (free surface stabilisation)
    pub fssa: f64,
    /// Remove the average top pressure before calling the constitutive law
    pub pressure_shift: bool,
    /// Log residual norms after each evaluation
    pub log_residual: bool,
    /// Characteristic length, written to the partition file
    pub characteristic_length: f64,
    /// Numbering of the unknowns
    pub index_mode: IndexMode,
}

impl Default for ResidualConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0; 3],
            fssa: 0.0,
            pressure_shift: false,
            log_residual: false,
            characteristic_length: 1.0,
            index_mode: IndexMode::Coupled,
        }
    }
}

impl ResidualConfig {
    /// Check the settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fssa) {
            return Err(FdstagError::config("fssa", "must be in [0, 1]"));
        }
        if self.characteristic_length <= 0.0 {
            return Err(FdstagError::config(
                "characteristic_length",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Limits and constants for the rheology evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MaterialLimits {
    /// Lower viscosity cutoff
    pub eta_min: f64,
    /// Upper viscosity cutoff
    pub eta_max: f64,
    /// Reference viscosity for the initial guess
    pub eta_ref: f64,
    /// Reference temperature
    pub t_ref: f64,
    /// Universal gas constant
    pub rugc: f64,
    /// Absolute viscosity tolerance
    pub eta_atol: f64,
    /// Relative viscosity tolerance
    pub eta_rtol: f64,
    /// Absolute strain rate tolerance
    pub dii_atol: f64,
    /// Relative strain rate tolerance
    pub dii_rtol: f64,
    /// Reference strain rate (required)
    pub dii_ref: Option<f64>,
    /// Minimum cohesion
    pub min_cohesion: f64,
    /// Minimum friction
    pub min_friction: f64,
    /// Ultimate yield stress
    pub tau_ult: f64,
    /// Efficiency of shear heating
    pub shear_heat_eff: f64,
    /// Use quasi-harmonic averaging of the viscosities
    pub quasi_harmonic: bool,
    /// Use the reference viscosity for the initial guess
    pub initial_guess: bool,
}

impl Default for MaterialLimits {
    fn default() -> Self {
        Self {
            eta_min: 0.0,
            eta_max: f64::MAX,
            eta_ref: 1.0,
            t_ref: 0.0,
            rugc: 8.3144621,
            eta_atol: 0.0,
            eta_rtol: 1e-8,
            dii_atol: 0.0,
            dii_rtol: 1e-8,
            dii_ref: None,
            min_cohesion: 0.0,
            min_friction: 0.0,
            tau_ult: f64::MAX,
            shear_heat_eff: 1.0,
            quasi_harmonic: false,
            initial_guess: true,
        }
    }
}

impl MaterialLimits {
    /// Default limits with the given reference strain rate
    pub fn with_reference_strain_rate(dii_ref: f64) -> Self {
        Self {
            dii_ref: Some(dii_ref),
            ..Default::default()
        }
    }

    /// Check the limits
    pub fn validate(&self) -> Result<()> {
        match self.dii_ref {
            None => return Err(FdstagError::MissingParameter("dii_ref")),
            Some(d) if d <= 0.0 => {
                return Err(FdstagError::config("dii_ref", "must be positive"))
            }
            _ => {}
        }
        if self.eta_min > self.eta_max {
            return Err(FdstagError::config(
                "eta_min",
                "lower viscosity cutoff exceeds upper cutoff",
            ));
        }
        Ok(())
    }

    /// Reference strain rate
    pub fn reference_strain_rate(&self) -> f64 {
        self.dii_ref.unwrap_or_default()
    }
}

/// Time stepping settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeStepConfig {
    /// Initial time step
    pub dt: f64,
    /// Maximum time step
    pub dt_max: f64,
    /// Courant number
    pub courant: f64,
}

impl Default for TimeStepConfig {
    fn default() -> Self {
        Self {
            dt: 0.0,
            dt_max: f64::MAX,
            courant: 0.5,
        }
    }
}

impl TimeStepConfig {
    /// Check the settings
    pub fn validate(&self) -> Result<()> {
        if self.dt < 0.0 {
            return Err(FdstagError::config("dt", "must not be negative"));
        }
        if self.dt_max <= 0.0 {
            return Err(FdstagError::config("dt_max", "must be positive"));
        }
        if self.courant <= 0.0 {
            return Err(FdstagError::config("courant", "must be positive"));
        }
        Ok(())
    }
}

/// Complete model setup
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ModelConfig {
    /// Grid
    pub grid: GridConfig,
    /// Residual evaluation
    #[cfg_attr(feature = "serde", serde(default))]
    pub residual: ResidualConfig,
    /// Rheology limits
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: MaterialLimits,
    /// Time stepping
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: TimeStepConfig,
}

impl ModelConfig {
    /// Check every part of the configuration that does not need the process grid
    pub fn validate(&self) -> Result<()> {
        self.residual.validate()?;
        self.limits.validate()?;
        self.time.validate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_reference_strain_rate() {
        let limits = MaterialLimits::default();
        assert!(matches!(
            limits.validate(),
            Err(FdstagError::MissingParameter("dii_ref"))
        ));
        assert!(MaterialLimits::with_reference_strain_rate(1e-15)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_limit_defaults() {
        let limits = MaterialLimits::default();
        assert_eq!(limits.rugc, 8.3144621);
        assert_eq!(limits.tau_ult, f64::MAX);
        assert_eq!(limits.shear_heat_eff, 1.0);
        assert_eq!(limits.dii_rtol, 1e-8);
        assert!(!limits.quasi_harmonic);
    }

    #[test]
    fn test_invalid_fssa() {
        let config = ResidualConfig {
            fssa: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_courant() {
        let config = TimeStepConfig {
            courant: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
