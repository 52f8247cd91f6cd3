//! Degree-of-freedom numbering modes
#[cfg(feature = "serde")]
use serde::Deserialize;

/// Global numbering of velocity and pressure unknowns
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum IndexMode {
    /// A single range; on every process the velocity ids are directly followed by the pressure ids
    #[default]
    Coupled,
    /// Separate global ranges for velocity and for pressure
    Uncoupled,
}
