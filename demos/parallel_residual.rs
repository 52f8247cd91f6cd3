use fdstag::{
    config::{AxisConfig, GridConfig, MaterialLimits, ModelConfig, ResidualConfig, TimeStepConfig},
    traits::{
        BulkResponse, ConstitutiveLaw, DeviatoricInput, DeviatoricResponse, GridComm,
        PartitionExport, VolumetricInput,
    },
    Constraints, MpiComm, ResidualEngine,
};
use mpi::{environment::Universe, traits::CommunicatorCollectives};

/// Isoviscous fluid with a constant density
struct Isoviscous {
    eta: f64,
    rho: f64,
}

impl ConstitutiveLaw for Isoviscous {
    fn phase_count(&self) -> usize {
        1
    }
    fn inverse_elastic_viscosity(&self, _phase_ratio: &[f64], _dt: f64) -> f64 {
        0.0
    }
    fn deviatoric(&self, _input: &DeviatoricInput<'_>) -> DeviatoricResponse {
        DeviatoricResponse {
            eta: self.eta,
            eta_creep: self.eta,
            dii_plastic: 0.0,
        }
    }
    fn volumetric(&self, _input: &VolumetricInput<'_>) -> BulkResponse {
        BulkResponse {
            rho: self.rho,
            ikdt: 0.0,
            alpha: 0.0,
        }
    }
}

/// Evaluate the residual of a hydrostatic column on all MPI processes
fn main() {
    let universe: Universe = mpi::initialize().unwrap();
    let world = universe.world();
    let comm = MpiComm::new(&world);

    let config = ModelConfig {
        grid: GridConfig::new(
            AxisConfig::uniform(0.0, 1.0, 16),
            AxisConfig::uniform(0.0, 1.0, 16),
            AxisConfig::uniform(-1.0, 0.0, 16),
        ),
        residual: ResidualConfig {
            gravity: [0.0, 0.0, -10.0],
            log_residual: true,
            ..Default::default()
        },
        limits: MaterialLimits::with_reference_strain_rate(1e-15),
        time: TimeStepConfig::default(),
    };
    let mut engine = ResidualEngine::from_config(&comm, &config, 1).unwrap();
    let law = Isoviscous { eta: 1.0, rho: 1.0 };
    let constraints = Constraints::free_slip(engine.grid());

    // hydrostatic pressure: the residual vanishes
    let mut x = vec![0.0; engine.dof().ln()];
    let lnv = engine.dof().lnv();
    let grid = engine.grid();
    for (n, index) in engine.pressure().owned_indices().enumerate() {
        let z = grid.point_coordinates(fdstag::grid::PointLayout::Cells, index)[2];
        x[lnv + n] = -10.0 * z;
    }
    let mut f = vec![0.0; engine.dof().ln()];
    engine.evaluate(&mut x, &mut f, &law, &constraints).unwrap();
    let summary = engine.residual_summary(&f).unwrap();

    engine
        .grid()
        .export_partitioning(&std::env::temp_dir(), 1.0)
        .unwrap();

    world.barrier();
    if comm.is_root() {
        println!(
            "momentum residual {:.3e}, divergence {:.3e}",
            summary.momentum_norm, summary.div_norm
        );
    }
}
