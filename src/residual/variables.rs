//! Solution variables stored at the cells and edges
use crate::error::{FdstagError, Result};

/// Deviatoric state at a point
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DeviatoricState {
    /// Square root of the second invariant of the effective strain rate
    pub dii: f64,
    /// Effective viscosity
    pub eta: f64,
    /// Creep viscosity
    pub eta_creep: f64,
    /// Inverse elastic viscosity `1 / (2 G dt)`
    pub i2gdt: f64,
    /// Plastic strain rate
    pub dii_plastic: f64,
    /// Shear heating
    pub shear_heating: f64,
}

/// Volumetric state at a cell
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BulkState {
    /// Volumetric strain rate
    pub theta: f64,
    /// Effective density
    pub rho: f64,
    /// Inverse bulk viscosity `1 / (K dt)`
    pub ikdt: f64,
    /// Effective thermal expansivity
    pub alpha: f64,
    /// Pressure at the previous time step
    pub pn: f64,
    /// Temperature at the previous time step
    pub tn: f64,
}

/// Variables at a cell centre
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CellVariables {
    /// Deviatoric state
    pub dev: DeviatoricState,
    /// Volumetric state
    pub bulk: BulkState,
    /// Total deviatoric strain rate, xx component
    pub dxx: f64,
    /// Total deviatoric strain rate, yy component
    pub dyy: f64,
    /// Total deviatoric strain rate, zz component
    pub dzz: f64,
    /// Deviatoric stress, xx component
    pub sxx: f64,
    /// Deviatoric stress, yy component
    pub syy: f64,
    /// Deviatoric stress, zz component
    pub szz: f64,
    /// Stress history, xx component
    pub hxx: f64,
    /// Stress history, yy component
    pub hyy: f64,
    /// Stress history, zz component
    pub hzz: f64,
}

/// Variables at an edge
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EdgeVariables {
    /// Deviatoric state
    pub dev: DeviatoricState,
    /// Total shear strain rate
    pub d: f64,
    /// Shear stress
    pub s: f64,
    /// Stress history
    pub h: f64,
}

/// Phase volume fractions of a family of points
///
/// All fractions live in one buffer; point `n` owns the slice `n * phases..(n + 1) * phases`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRatios {
    phases: usize,
    data: Vec<f64>,
}

impl PhaseRatios {
    /// Create ratios for `points` points, all made of phase 0
    pub fn new(points: usize, phases: usize) -> Result<Self> {
        if phases == 0 {
            return Err(FdstagError::config("phases", "at least one phase is needed"));
        }
        let mut data = vec![0.0; points * phases];
        for chunk in data.chunks_exact_mut(phases) {
            chunk[0] = 1.0;
        }
        Ok(Self { phases, data })
    }

    /// Number of phases
    pub fn phases(&self) -> usize {
        self.phases
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.data.len() / self.phases
    }

    /// Are there no points?
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Ratios of point `n`
    pub fn get(&self, n: usize) -> &[f64] {
        &self.data[n * self.phases..(n + 1) * self.phases]
    }

    /// Mutable ratios of point `n`
    pub fn get_mut(&mut self, n: usize) -> &mut [f64] {
        &mut self.data[n * self.phases..(n + 1) * self.phases]
    }

    /// Make point `n` consist of a single phase
    pub fn set_phase(&mut self, n: usize, phase: usize) -> Result<()> {
        if phase >= self.phases {
            return Err(FdstagError::config(
                "phase",
                format!("phase {phase} out of {} phases", self.phases),
            ));
        }
        let ratios = self.get_mut(n);
        ratios.fill(0.0);
        ratios[phase] = 1.0;
        Ok(())
    }

    /// Check that the ratios of every point are non-negative and sum to one
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        for (n, ratios) in self.data.chunks_exact(self.phases).enumerate() {
            let sum = ratios.iter().sum::<f64>();
            if ratios.iter().any(|&r| r < 0.0) || (sum - 1.0).abs() > tolerance {
                return Err(FdstagError::config(
                    "phase_ratios",
                    format!("ratios of point {n} sum to {sum}"),
                ));
            }
        }
        Ok(())
    }
}

/// Records and phase ratios of a family of points, in local `k, j, i` order
#[derive(Debug, Clone)]
pub struct PointVariables<R> {
    pub(crate) records: Vec<R>,
    pub(crate) phase_ratios: PhaseRatios,
}

impl<R: Default + Clone> PointVariables<R> {
    /// Default records for `points` points
    pub fn new(points: usize, phases: usize) -> Result<Self> {
        Ok(Self {
            records: vec![R::default(); points],
            phase_ratios: PhaseRatios::new(points, phases)?,
        })
    }
}

impl<R> PointVariables<R> {
    /// Records
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Mutable records
    pub fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    /// Phase ratios
    pub fn phase_ratios(&self) -> &PhaseRatios {
        &self.phase_ratios
    }

    /// Mutable phase ratios
    pub fn phase_ratios_mut(&mut self) -> &mut PhaseRatios {
        &mut self.phase_ratios
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_phase_ratios() {
        let mut ratios = PhaseRatios::new(4, 3).unwrap();
        assert_eq!(ratios.len(), 4);
        assert_eq!(ratios.get(2), &[1.0, 0.0, 0.0]);
        ratios.set_phase(2, 1).unwrap();
        assert_eq!(ratios.get(2), &[0.0, 1.0, 0.0]);
        assert!(ratios.set_phase(0, 3).is_err());
        assert!(ratios.validate(1e-12).is_ok());

        ratios.get_mut(1)[2] = 0.5;
        assert!(ratios.validate(1e-12).is_err());
    }

    #[test]
    fn test_no_phases() {
        assert!(PhaseRatios::new(4, 0).is_err());
    }
}
