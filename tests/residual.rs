//! Residual evaluation on a single process
mod common;

use approx::assert_relative_eq;
use common::{solution, Newtonian};
use fdstag::config::{
    AxisConfig, GridConfig, MaterialLimits, ResidualConfig, SegmentInput, TimeStepConfig,
};
use fdstag::grid::PointLayout;
use fdstag::types::{Axis, GhostConstraint, IndexMode};
use fdstag::{Constraints, FdstagError, ResidualEngine, SerialComm, StaggeredGrid};

fn engine<'a>(
    comm: &'a SerialComm,
    grid: &GridConfig,
    residual: ResidualConfig,
    time: TimeStepConfig,
    phases: usize,
) -> ResidualEngine<'a, SerialComm> {
    ResidualEngine::new(
        StaggeredGrid::new(comm, grid).unwrap(),
        residual,
        MaterialLimits::with_reference_strain_rate(1.0),
        &time,
        phases,
    )
    .unwrap()
}

fn unit_cube(cells: usize) -> GridConfig {
    GridConfig::uniform([0.0; 3], [1.0; 3], [cells; 3])
}

fn gravity(g: f64) -> ResidualConfig {
    ResidualConfig {
        gravity: [0.0, 0.0, g],
        ..Default::default()
    }
}

#[test]
fn test_quiescent_gravity() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(4), gravity(-10.0), TimeStepConfig::default(), 1);
    let constraints = Constraints::new(engine.grid());
    let mut x = vec![0.0; engine.dof().ln()];
    let mut f = vec![0.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 2.0), &constraints)
        .unwrap();

    // each cell pushes half its weight onto both of its z faces
    let fz = engine.momentum_residual(Axis::Z);
    for (i, j, k) in fz.owned_indices() {
        let expected = if k == 0 || k == 4 { 10.0 } else { 20.0 };
        assert_relative_eq!(fz[(i, j, k)], expected, epsilon = 1e-12);
    }
    for axis in [Axis::X, Axis::Y] {
        assert!(engine.momentum_residual(axis).owned_values().all(|v| v == 0.0));
    }
    assert!(f[engine.dof().lnv()..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_hydrostatic_balance() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(4), gravity(-10.0), TimeStepConfig::default(), 1);
    let constraints = Constraints::free_slip(engine.grid());
    let mut x = solution(&engine, |_, _| 0.0, |c| 20.0 * (1.0 - c[2]));
    let mut f = vec![1.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 2.0), &constraints)
        .unwrap();

    for v in f {
        assert_relative_eq!(v, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_constrained_entries_are_zero() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(3), gravity(-10.0), TimeStepConfig::default(), 1);
    let mut constraints = Constraints::free_slip(engine.grid());
    constraints.fix_pressure(0, 5.0);
    let mut x = solution(&engine, |_, c| c[0] * c[1], |_| 1.0);
    let mut f = vec![1.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 1.0), &constraints)
        .unwrap();

    let lnv = engine.dof().lnv();
    for &(index, _) in constraints.velocity() {
        assert_eq!(x[index], 0.0);
        assert_eq!(f[index], 0.0);
    }
    assert_eq!(x[lnv], 5.0);
    assert_eq!(f[lnv], 0.0);
    assert!(f[..lnv].iter().any(|&v| v != 0.0));
}

#[test]
fn test_uniform_shear() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(4), ResidualConfig::default(), TimeStepConfig::default(), 1);
    let mut constraints = Constraints::new(engine.grid());
    {
        let rules = constraints.velocity_rules_mut(Axis::X);
        let [nx, ny, nz] = rules.shape().map(|n| n as isize);
        for k in -1..=nz {
            for i in -1..=nx {
                rules[(i, -1, k)] = GhostConstraint::Boundary(0.0);
                rules[(i, ny, k)] = GhostConstraint::Boundary(1.0);
            }
        }
    }
    let mut x = solution(&engine, |axis, c| if axis == Axis::X { c[1] } else { 0.0 }, |_| 0.0);
    let mut f = vec![0.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 1.0), &constraints)
        .unwrap();

    for rec in engine.cells().records() {
        assert_relative_eq!(rec.dev.dii, 0.5, epsilon = 1e-12);
    }
    for layout in [PointLayout::XYEdges, PointLayout::XZEdges, PointLayout::YZEdges] {
        for rec in engine.edges(layout).unwrap().records() {
            assert_relative_eq!(rec.dev.dii, 0.5, epsilon = 1e-12);
        }
    }
    for rec in engine.edges(PointLayout::XYEdges).unwrap().records() {
        assert_relative_eq!(rec.d, 0.5, epsilon = 1e-12);
        assert_relative_eq!(rec.s, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rec.dev.shear_heating, 1.0, epsilon = 1e-12);
    }
    // a uniform stress has no divergence
    for v in f {
        assert_relative_eq!(v, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_continuity_residual() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(2), ResidualConfig::default(), TimeStepConfig::default(), 1);
    let constraints = Constraints::new(engine.grid());
    let mut x = solution(&engine, |axis, c| if axis == Axis::X { c[0] } else { 0.0 }, |_| 0.0);
    let mut f = vec![0.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 1.0), &constraints)
        .unwrap();

    for v in &f[engine.dof().lnv()..] {
        assert_relative_eq!(*v, -1.0, epsilon = 1e-12);
    }
    for rec in engine.cells().records() {
        assert_relative_eq!(rec.bulk.theta, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rec.dxx, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(rec.dyy, -1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(rec.dzz, -1.0 / 3.0, epsilon = 1e-12);
    }

    let summary = engine.residual_summary(&f).unwrap();
    assert_relative_eq!(summary.div_min, -1.0, epsilon = 1e-12);
    assert_relative_eq!(summary.div_max, -1.0, epsilon = 1e-12);
    assert_relative_eq!(summary.div_norm, 8.0_f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_compressible_thermal_residual() {
    let comm = SerialComm;
    let residual = ResidualConfig {
        fssa: 1.0,
        ..gravity(-10.0)
    };
    let time = TimeStepConfig {
        dt: 0.5,
        ..Default::default()
    };
    let mut engine = engine(&comm, &unit_cube(4), residual, time, 1);
    let constraints = Constraints::new(engine.grid());
    let law = Newtonian::single(1.0, 2.0).with_bulk(0.5, 3.0);
    engine.temperature_mut().fill(4.0);
    let mut x = solution(&engine, |axis, _| if axis == Axis::Z { 1.0 } else { 0.0 }, |_| 1.0);
    let mut f = vec![0.0; engine.dof().ln()];
    engine.evaluate(&mut x, &mut f, &law, &constraints).unwrap();

    // -ikdt (p - pn) - theta + alpha (T - Tn) / dt with pn = Tn = 0
    for v in &f[engine.dof().lnv()..] {
        assert_relative_eq!(*v, -0.5 + 24.0, epsilon = 1e-12);
    }

    // stabilised face terms: (-p + vz fssa dt rho g) / h -/+ rho g / 2
    let fz = engine.momentum_residual(Axis::Z);
    for (i, j, k) in fz.owned_indices() {
        let expected = match k {
            0 => 54.0,
            4 => -34.0,
            _ => 20.0,
        };
        assert_relative_eq!(fz[(i, j, k)], expected, epsilon = 1e-10);
    }

    engine.store_history();
    engine.evaluate(&mut x, &mut f, &law, &constraints).unwrap();
    for v in &f[engine.dof().lnv()..] {
        assert_relative_eq!(*v, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_courant_step() {
    let comm = SerialComm;
    let grid = GridConfig::uniform([0.0; 3], [4.0; 3], [4; 3]);
    let time = TimeStepConfig {
        dt: 1.0,
        dt_max: 100.0,
        courant: 0.5,
    };
    let mut engine = engine(&comm, &grid, ResidualConfig::default(), time, 1);
    let constraints = Constraints::new(engine.grid());
    let mut x = solution(&engine, |axis, c| if axis == Axis::Y { -2.0 * c[1] / 4.0 } else { 1.0 }, |_| 0.0);
    engine.import_solution(&mut x, &constraints).unwrap();

    assert_relative_eq!(engine.courant_step(), 0.25);
    assert_relative_eq!(engine.time().prev_dt(), 1.0);
}

#[test]
fn test_courant_step_biased() {
    let comm = SerialComm;
    let z = AxisConfig {
        begin: 0.0,
        end: 3.0,
        cells: 2,
        segments: Some(SegmentInput {
            delimiters: vec![1.0],
            cells: vec![1, 1],
            biases: vec![],
        }),
    };
    let grid = GridConfig::new(AxisConfig::uniform(0.0, 2.0, 2), AxisConfig::uniform(0.0, 2.0, 2), z);
    let time = TimeStepConfig {
        dt: 10.0,
        dt_max: 100.0,
        courant: 1.0,
    };
    let mut engine = engine(&comm, &grid, ResidualConfig::default(), time, 1);
    let constraints = Constraints::new(engine.grid());
    // downward flow through the middle node leaves through the small cell
    let mut x = solution(&engine, |axis, c| if axis == Axis::Z && c[2] == 1.0 { -4.0 } else { 0.0 }, |_| 0.0);
    engine.import_solution(&mut x, &constraints).unwrap();
    assert_relative_eq!(engine.courant_step(), 0.25);
}

#[test]
fn test_pressure_shift() {
    let comm = SerialComm;
    let residual = ResidualConfig {
        pressure_shift: true,
        ..Default::default()
    };
    let mut engine = engine(&comm, &unit_cube(4), residual, TimeStepConfig::default(), 1);
    let constraints = Constraints::new(engine.grid());
    let mut x = solution(&engine, |_, _| 0.0, |c| 3.0 + c[0] - c[2]);
    let mut f = vec![0.0; engine.dof().ln()];
    engine
        .evaluate(&mut x, &mut f, &Newtonian::single(1.0, 1.0), &constraints)
        .unwrap();
    // mean of x over the top layer is 0.5, z of the top cell centres 0.875
    assert_relative_eq!(engine.p_shift(), 3.0 + 0.5 - 0.875, epsilon = 1e-12);
}

#[test]
fn test_elastic_history() {
    struct Elastic;
    impl fdstag::traits::ConstitutiveLaw for Elastic {
        fn phase_count(&self) -> usize {
            1
        }
        fn inverse_elastic_viscosity(&self, _phase_ratio: &[f64], dt: f64) -> f64 {
            1.0 / (2.0 * dt)
        }
        fn deviatoric(
            &self,
            input: &fdstag::traits::DeviatoricInput<'_>,
        ) -> fdstag::traits::DeviatoricResponse {
            fdstag::traits::DeviatoricResponse {
                eta: 1.0 / (2.0 * input.i2gdt),
                eta_creep: f64::MAX,
                dii_plastic: 0.0,
            }
        }
        fn volumetric(&self, _input: &fdstag::traits::VolumetricInput<'_>) -> fdstag::traits::BulkResponse {
            fdstag::traits::BulkResponse::default()
        }
    }

    let comm = SerialComm;
    let time = TimeStepConfig {
        dt: 0.5,
        ..Default::default()
    };
    let mut engine = engine(&comm, &unit_cube(2), ResidualConfig::default(), time, 1);
    let constraints = Constraints::new(engine.grid());
    engine.inverse_elastic_viscosity(&Elastic).unwrap();
    assert!(engine.cells().records().iter().all(|r| r.dev.i2gdt == 1.0));

    let mut x = solution(&engine, |axis, c| if axis == Axis::X { c[0] } else { 0.0 }, |_| 0.0);
    let mut f = vec![0.0; engine.dof().ln()];
    engine.evaluate(&mut x, &mut f, &Elastic, &constraints).unwrap();
    let sxx = engine.cells().records()[0].sxx;
    assert_relative_eq!(sxx, 2.0 / 3.0, epsilon = 1e-12);

    // without motion the stored stress keeps driving the effective strain rate
    engine.store_history();
    let mut x = vec![0.0; engine.dof().ln()];
    engine.evaluate(&mut x, &mut f, &Elastic, &constraints).unwrap();
    assert_relative_eq!(engine.cells().records()[0].sxx, sxx, epsilon = 1e-12);
    assert_relative_eq!(engine.cells().records()[0].hxx, sxx, epsilon = 1e-12);
}

#[test]
fn test_phase_ratios() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(2), gravity(-1.0), TimeStepConfig::default(), 2);
    let heavy = Newtonian::new(vec![1.0, 1.0], vec![1.0, 3.0]);
    // the law must know the same number of phases
    let mut x = vec![0.0; engine.dof().ln()];
    let mut f = vec![0.0; engine.dof().ln()];
    let constraints = Constraints::new(engine.grid());
    assert!(matches!(
        engine.evaluate(&mut x, &mut f, &Newtonian::single(1.0, 1.0), &constraints),
        Err(FdstagError::Config { .. })
    ));

    let cells = engine.cells_mut();
    for n in 0..cells.phase_ratios().len() {
        cells.phase_ratios_mut().set_phase(n, 1).unwrap();
    }
    engine.evaluate(&mut x, &mut f, &heavy, &constraints).unwrap();
    assert!(engine.cells().records().iter().all(|r| r.bulk.rho == 3.0));
}

#[test]
fn test_size_mismatch() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(2), ResidualConfig::default(), TimeStepConfig::default(), 1);
    let constraints = Constraints::new(engine.grid());
    let mut x = vec![0.0; engine.dof().ln() - 1];
    assert!(matches!(
        engine.import_solution(&mut x, &constraints),
        Err(FdstagError::SizeMismatch { .. })
    ));
}

#[test]
fn test_constraints_of_other_grid() {
    let comm = SerialComm;
    let mut engine = engine(
        &comm,
        &GridConfig::uniform([0.0; 3], [1.0; 3], [2, 2, 3]),
        ResidualConfig::default(),
        TimeStepConfig::default(),
        1,
    );
    // same number of unknowns, other shapes
    let other =
        StaggeredGrid::new(&comm, &GridConfig::uniform([0.0; 3], [1.0; 3], [3, 2, 2])).unwrap();
    let constraints = Constraints::new(&other);
    let mut x = vec![0.0; engine.dof().ln()];
    assert!(matches!(
        engine.import_solution(&mut x, &constraints),
        Err(FdstagError::SizeMismatch { what: "x-faces", .. })
    ));
    let mut f = vec![0.0; engine.dof().ln()];
    assert!(engine.export_residual(&mut f, &constraints).is_err());
}

#[test]
fn test_temperature_ghosts() {
    let comm = SerialComm;
    let mut engine = engine(&comm, &unit_cube(2), ResidualConfig::default(), TimeStepConfig::default(), 1);
    let t = engine.temperature_mut();
    for (i, j, k) in t.owned_indices() {
        t[(i, j, k)] = (1 + i + 2 * j + 4 * k) as f64;
    }
    engine.update_temperature_ghosts();
    let t = engine.temperature();
    assert_eq!(t[(-1, 0, 0)], t[(0, 0, 0)]);
    assert_eq!(t[(2, 1, 1)], t[(1, 1, 1)]);
    assert_eq!(t[(-1, -1, 2)], t[(0, 0, 1)]);
}

#[test]
fn test_uncoupled_numbering() {
    let comm = SerialComm;
    let residual = ResidualConfig {
        index_mode: IndexMode::Uncoupled,
        ..Default::default()
    };
    let engine = engine(&comm, &unit_cube(2), residual, TimeStepConfig::default(), 1);
    assert_eq!(engine.dof().stv(), 0);
    assert_eq!(engine.dof().stp(), 0);
    assert_eq!(engine.dof().p()[(0, 0, 0)].global(), Some(0));
    assert_eq!(engine.dof().vx()[(0, 0, 0)].global(), Some(0));
}
