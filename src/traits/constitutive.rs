//! Constitutive law
use crate::config::MaterialLimits;

/// Input to the deviatoric part of the constitutive law at one point
#[derive(Debug, Clone, Copy)]
pub struct DeviatoricInput<'a> {
    /// Volume fractions of the material phases
    pub phase_ratio: &'a [f64],
    /// Rheology limiter settings
    pub limits: &'a MaterialLimits,
    /// Time step
    pub dt: f64,
    /// Pressure (with the pressure shift removed)
    pub pressure: f64,
    /// Temperature
    pub temperature: f64,
    /// Square root of the second invariant of the effective strain rate
    pub dii: f64,
    /// Inverse elastic viscosity `1 / (2 G dt)`
    pub i2gdt: f64,
}

/// Output of the deviatoric part of the constitutive law
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DeviatoricResponse {
    /// Effective viscosity, stress = 2 eta D
    pub eta: f64,
    /// Creep viscosity
    pub eta_creep: f64,
    /// Plastic strain rate (zero if the point does not yield)
    pub dii_plastic: f64,
}

/// Input to the volumetric part of the constitutive law at one point
#[derive(Debug, Clone, Copy)]
pub struct VolumetricInput<'a> {
    /// Volume fractions of the material phases
    pub phase_ratio: &'a [f64],
    /// Rheology limiter settings
    pub limits: &'a MaterialLimits,
    /// Time step
    pub dt: f64,
    /// Pressure
    pub pressure: f64,
    /// Temperature
    pub temperature: f64,
}

/// Output of the volumetric part of the constitutive law
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BulkResponse {
    /// Effective density
    pub rho: f64,
    /// Inverse bulk viscosity `1 / (K dt)`
    pub ikdt: f64,
    /// Effective thermal expansivity
    pub alpha: f64,
}

pub trait ConstitutiveLaw {
    //! Pointwise visco-elasto-plastic material law
    //!
    //! The residual engine treats the law as a pure function of the point state.

    /// Number of material phases
    fn phase_count(&self) -> usize;

    /// Inverse elastic viscosity `1 / (2 G dt)` averaged over the phases
    fn inverse_elastic_viscosity(&self, phase_ratio: &[f64], dt: f64) -> f64;

    /// Evaluate the deviatoric response
    fn deviatoric(&self, input: &DeviatoricInput<'_>) -> DeviatoricResponse;

    /// Evaluate the volumetric response
    fn volumetric(&self, input: &VolumetricInput<'_>) -> BulkResponse;
}
