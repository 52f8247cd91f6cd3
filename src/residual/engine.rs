//! Residual engine state and the solution vector interface
use super::constraints::set_boundary_ghosts;
use super::{CellVariables, Constraints, EdgeVariables, PointVariables, TimeStep};
use crate::config::{MaterialLimits, ModelConfig, ResidualConfig, TimeStepConfig};
use crate::error::{FdstagError, Result};
use crate::grid::{DofIndex, LocalArray, PointLayout, StaggeredGrid};
use crate::traits::{ConstitutiveLaw, GridComm};
use crate::types::{Axis, GhostConstraint};

/// Norms of a residual vector
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ResidualSummary {
    /// Minimum of the continuity residual
    pub div_min: f64,
    /// Maximum of the continuity residual
    pub div_max: f64,
    /// 2-norm of the continuity residual
    pub div_norm: f64,
    /// 2-norm of the momentum residual
    pub momentum_norm: f64,
}

/// Nonlinear residual of the coupled momentum and mass balance on a staggered grid
///
/// The engine owns the local velocity, pressure and temperature fields, the strain rates at
/// cells and edges, the residual arrays and the variable records of every point. The
/// evaluation is split into stages that can also be called individually:
/// [import_solution](Self::import_solution), [effective_strain_rate](Self::effective_strain_rate),
/// [assemble_residual](Self::assemble_residual) and [export_residual](Self::export_residual).
pub struct ResidualEngine<'a, C: GridComm> {
    pub(crate) grid: StaggeredGrid<'a, C>,
    pub(crate) dof: DofIndex,
    pub(crate) config: ResidualConfig,
    pub(crate) limits: MaterialLimits,
    pub(crate) time: TimeStep,
    pub(crate) p_shift: f64,
    pub(crate) velocity: [LocalArray<f64>; 3],
    pub(crate) p: LocalArray<f64>,
    pub(crate) t: LocalArray<f64>,
    pub(crate) momentum: [LocalArray<f64>; 3],
    pub(crate) gc: LocalArray<f64>,
    pub(crate) normal_rate: [LocalArray<f64>; 3],
    pub(crate) dxy: LocalArray<f64>,
    pub(crate) dxz: LocalArray<f64>,
    pub(crate) dyz: LocalArray<f64>,
    pub(crate) wx: LocalArray<f64>,
    pub(crate) wy: LocalArray<f64>,
    pub(crate) wz: LocalArray<f64>,
    pub(crate) cells: PointVariables<CellVariables>,
    pub(crate) xy_edges: PointVariables<EdgeVariables>,
    pub(crate) xz_edges: PointVariables<EdgeVariables>,
    pub(crate) yz_edges: PointVariables<EdgeVariables>,
}

impl<'a, C: GridComm> ResidualEngine<'a, C> {
    /// Create an engine on a grid for a material model with `phases` phases
    pub fn new(
        grid: StaggeredGrid<'a, C>,
        config: ResidualConfig,
        limits: MaterialLimits,
        time: &TimeStepConfig,
        phases: usize,
    ) -> Result<Self> {
        config.validate()?;
        limits.validate()?;
        let time = TimeStep::new(time)?;
        let dof = DofIndex::new(&grid, config.index_mode);

        let zeros = |layout| grid.create_array(layout, 0.0);
        let faces = Axis::ALL.map(|a| zeros(PointLayout::face(a)));
        let cells = PointVariables::new(grid.count(PointLayout::Cells), phases)?;
        let xy_edges = PointVariables::new(grid.count(PointLayout::XYEdges), phases)?;
        let xz_edges = PointVariables::new(grid.count(PointLayout::XZEdges), phases)?;
        let yz_edges = PointVariables::new(grid.count(PointLayout::YZEdges), phases)?;

        let engine = Self {
            dof,
            config,
            limits,
            time,
            p_shift: 0.0,
            velocity: faces.clone(),
            p: zeros(PointLayout::Cells),
            t: zeros(PointLayout::Cells),
            momentum: faces,
            gc: zeros(PointLayout::Cells),
            normal_rate: [(); 3].map(|_| zeros(PointLayout::Cells)),
            dxy: zeros(PointLayout::XYEdges),
            dxz: zeros(PointLayout::XZEdges),
            dyz: zeros(PointLayout::YZEdges),
            wx: zeros(PointLayout::YZEdges),
            wy: zeros(PointLayout::XZEdges),
            wz: zeros(PointLayout::XYEdges),
            cells,
            xy_edges,
            xz_edges,
            yz_edges,
            grid,
        };
        if engine.grid.comm().is_root() {
            log::debug!(
                "Residual engine: {} velocity and {} pressure unknowns on rank 0",
                engine.dof.lnv(),
                engine.dof.lnp()
            );
        }
        Ok(engine)
    }

    /// Build the grid and the engine from a model configuration
    pub fn from_config(comm: &'a C, config: &ModelConfig, phases: usize) -> Result<Self> {
        config.validate()?;
        let grid = StaggeredGrid::new(comm, &config.grid)?;
        grid.view()?;
        Self::new(
            grid,
            config.residual.clone(),
            config.limits.clone(),
            &config.time,
            phases,
        )
    }

    /// Grid
    pub fn grid(&self) -> &StaggeredGrid<'a, C> {
        &self.grid
    }

    /// Unknown numbering
    pub fn dof(&self) -> &DofIndex {
        &self.dof
    }

    /// Residual settings
    pub fn config(&self) -> &ResidualConfig {
        &self.config
    }

    /// Rheology limits
    pub fn limits(&self) -> &MaterialLimits {
        &self.limits
    }

    /// Time step
    pub fn time(&self) -> &TimeStep {
        &self.time
    }

    /// Mutable time step
    pub fn time_mut(&mut self) -> &mut TimeStep {
        &mut self.time
    }

    /// Pressure shift removed before calling the constitutive law
    pub fn p_shift(&self) -> f64 {
        self.p_shift
    }

    /// Velocity component
    pub fn velocity(&self, axis: Axis) -> &LocalArray<f64> {
        &self.velocity[axis.index()]
    }

    /// Pressure
    pub fn pressure(&self) -> &LocalArray<f64> {
        &self.p
    }

    /// Temperature
    pub fn temperature(&self) -> &LocalArray<f64> {
        &self.t
    }

    /// Mutable temperature; call [update_temperature_ghosts](Self::update_temperature_ghosts)
    /// after changing owned values
    pub fn temperature_mut(&mut self) -> &mut LocalArray<f64> {
        &mut self.t
    }

    /// Momentum residual component
    pub fn momentum_residual(&self, axis: Axis) -> &LocalArray<f64> {
        &self.momentum[axis.index()]
    }

    /// Continuity residual
    pub fn continuity_residual(&self) -> &LocalArray<f64> {
        &self.gc
    }

    /// Effective normal strain rate at the cells
    pub fn normal_strain_rate(&self, axis: Axis) -> &LocalArray<f64> {
        &self.normal_rate[axis.index()]
    }

    /// Effective shear strain rate at an edge layout
    pub fn shear_strain_rate(&self, layout: PointLayout) -> Option<&LocalArray<f64>> {
        match layout {
            PointLayout::XYEdges => Some(&self.dxy),
            PointLayout::XZEdges => Some(&self.dxz),
            PointLayout::YZEdges => Some(&self.dyz),
            _ => None,
        }
    }

    /// Vorticity component; x lives on the yz edges, y on the xz edges and z on the xy edges
    pub fn vorticity_component(&self, axis: Axis) -> &LocalArray<f64> {
        match axis {
            Axis::X => &self.wx,
            Axis::Y => &self.wy,
            Axis::Z => &self.wz,
        }
    }

    /// Cell variables
    pub fn cells(&self) -> &PointVariables<CellVariables> {
        &self.cells
    }

    /// Mutable cell variables
    pub fn cells_mut(&mut self) -> &mut PointVariables<CellVariables> {
        &mut self.cells
    }

    /// Edge variables of an edge layout
    pub fn edges(&self, layout: PointLayout) -> Option<&PointVariables<EdgeVariables>> {
        match layout {
            PointLayout::XYEdges => Some(&self.xy_edges),
            PointLayout::XZEdges => Some(&self.xz_edges),
            PointLayout::YZEdges => Some(&self.yz_edges),
            _ => None,
        }
    }

    /// Mutable edge variables of an edge layout
    pub fn edges_mut(&mut self, layout: PointLayout) -> Option<&mut PointVariables<EdgeVariables>> {
        match layout {
            PointLayout::XYEdges => Some(&mut self.xy_edges),
            PointLayout::XZEdges => Some(&mut self.xz_edges),
            PointLayout::YZEdges => Some(&mut self.yz_edges),
            _ => None,
        }
    }

    /// Copy a solution vector into the local fields and fill all ghost points
    ///
    /// The fixed values of `constraints` are written into `x` first.
    pub fn import_solution(&mut self, x: &mut [f64], constraints: &Constraints) -> Result<()> {
        let lnv = self.dof.lnv();
        FdstagError::check_len("solution vector", self.dof.ln(), x.len())?;
        constraints.check(lnv, self.dof.lnp())?;
        constraints.check_shapes(&self.grid)?;
        constraints.apply(x, lnv);

        let mut offset = 0;
        for v in self.velocity.iter_mut() {
            let n = v.owned_len();
            v.copy_owned_from(&x[offset..offset + n]);
            offset += n;
        }
        self.p.copy_owned_from(&x[offset..]);

        for axis in Axis::ALL {
            let v = &mut self.velocity[axis.index()];
            self.grid.update_ghosts(v);
            let rules = constraints.velocity_rules(axis);
            set_boundary_ghosts(&self.grid, PointLayout::face(axis), v, |index| rules[index]);
        }
        self.grid.update_ghosts(&mut self.p);
        let rules = constraints.pressure_rules();
        set_boundary_ghosts(&self.grid, PointLayout::Cells, &mut self.p, |index| {
            rules[index]
        });
        Ok(())
    }

    /// Copy the local residual into a residual vector and zero the fixed entries
    pub fn export_residual(&self, f: &mut [f64], constraints: &Constraints) -> Result<()> {
        let lnv = self.dof.lnv();
        FdstagError::check_len("residual vector", self.dof.ln(), f.len())?;
        constraints.check(lnv, self.dof.lnp())?;
        constraints.check_shapes(&self.grid)?;

        let mut offset = 0;
        for r in &self.momentum {
            let n = r.owned_len();
            r.copy_owned_to(&mut f[offset..offset + n]);
            offset += n;
        }
        self.gc.copy_owned_to(&mut f[offset..]);
        constraints.zero(f, lnv);
        Ok(())
    }

    /// Evaluate the residual `f` of the solution `x`
    pub fn evaluate(
        &mut self,
        x: &mut [f64],
        f: &mut [f64],
        law: &impl ConstitutiveLaw,
        constraints: &Constraints,
    ) -> Result<()> {
        self.import_solution(x, constraints)?;
        if self.config.pressure_shift {
            self.pressure_shift();
        }
        self.effective_strain_rate();
        self.assemble_residual(law)?;
        self.export_residual(f, constraints)?;
        if self.config.log_residual {
            self.residual_summary(f)?;
        }
        Ok(())
    }

    /// Update the inverse elastic viscosity of every point for the current time step
    pub fn inverse_elastic_viscosity(&mut self, law: &impl ConstitutiveLaw) -> Result<()> {
        self.check_phases(law)?;
        let dt = self.time.dt();
        for (n, rec) in self.cells.records.iter_mut().enumerate() {
            rec.dev.i2gdt = law.inverse_elastic_viscosity(self.cells.phase_ratios.get(n), dt);
        }
        for edges in [&mut self.xy_edges, &mut self.xz_edges, &mut self.yz_edges] {
            for (n, rec) in edges.records.iter_mut().enumerate() {
                rec.dev.i2gdt = law.inverse_elastic_viscosity(edges.phase_ratios.get(n), dt);
            }
        }
        Ok(())
    }

    pub(crate) fn check_phases(&self, law: &impl ConstitutiveLaw) -> Result<()> {
        let phases = self.cells.phase_ratios.phases();
        if law.phase_count() == phases {
            Ok(())
        } else {
            Err(FdstagError::config(
                "phases",
                format!(
                    "material law has {} phases, the records {phases}",
                    law.phase_count()
                ),
            ))
        }
    }

    /// Average pressure of the top cell layer
    ///
    /// The value is stored and subtracted from the pressure passed to the constitutive law.
    pub fn pressure_shift(&mut self) -> f64 {
        let az = self.grid.axis(Axis::Z);
        let top = az.tcels() - 1;
        let local = self
            .p
            .owned_indices()
            .filter(|&(_, _, k)| az.pstart() + k as usize == top)
            .map(|index| self.p[index])
            .sum::<f64>();
        let layer = self.grid.axis(Axis::X).tcels() * self.grid.axis(Axis::Y).tcels();
        self.p_shift = self.grid.comm().all_reduce_sum(local) / layer as f64;
        if self.grid.comm().is_root() {
            log::info!("Pressure shift                 :  {:.8e}", self.p_shift);
        }
        self.p_shift
    }

    /// Keep the current stresses as elastic history and the current pressure and temperature
    /// as the state of the previous step
    pub fn store_history(&mut self) {
        for (n, index) in self.p.owned_indices().enumerate() {
            let rec = &mut self.cells.records[n];
            rec.hxx = rec.sxx;
            rec.hyy = rec.syy;
            rec.hzz = rec.szz;
            rec.bulk.pn = self.p[index];
            rec.bulk.tn = self.t[index];
        }
        for edges in [&mut self.xy_edges, &mut self.xz_edges, &mut self.yz_edges] {
            for rec in edges.records.iter_mut() {
                rec.h = rec.s;
            }
        }
    }

    /// Norms of a residual vector, logged if residual logging is enabled
    pub fn residual_summary(&self, f: &[f64]) -> Result<ResidualSummary> {
        let lnv = self.dof.lnv();
        FdstagError::check_len("residual vector", self.dof.ln(), f.len())?;
        let comm = self.grid.comm();
        let (momentum, continuity) = f.split_at(lnv);

        let local_min = continuity.iter().copied().fold(f64::MAX, f64::min);
        let local_max = continuity.iter().copied().fold(f64::MIN, f64::max);
        let square = |values: &[f64]| values.iter().map(|v| v * v).sum::<f64>();

        let summary = ResidualSummary {
            div_min: comm.all_reduce_min(local_min),
            div_max: comm.all_reduce_max(local_max),
            div_norm: comm.all_reduce_sum(square(continuity)).sqrt(),
            momentum_norm: comm.all_reduce_sum(square(momentum)).sqrt(),
        };
        if self.config.log_residual && comm.is_root() {
            log::info!("Continuity: ");
            log::info!("   |Div|_inf = {:12.12e}", summary.div_min.abs().max(summary.div_max.abs()));
            log::info!("   |Div|_2   = {:12.12e}", summary.div_norm);
            log::info!("Momentum: ");
            log::info!("   |mRes|_2  = {:12.12e}", summary.momentum_norm);
        }
        Ok(summary)
    }

    /// Exchange the temperature and set zero-flux ghosts on the domain boundary
    pub fn update_temperature_ghosts(&mut self) {
        self.grid.update_ghosts(&mut self.t);
        set_boundary_ghosts(&self.grid, PointLayout::Cells, &mut self.t, |_| {
            GhostConstraint::Free
        });
    }
}
