//! Nonlinear residual of the Stokes problem on the staggered grid
mod assembly;
mod constraints;
mod courant;
mod engine;
mod strain_rate;
mod time_step;
mod variables;

pub use constraints::Constraints;
pub use engine::{ResidualEngine, ResidualSummary};
pub use time_step::TimeStep;
pub use variables::{
    BulkState, CellVariables, DeviatoricState, EdgeVariables, PhaseRatios, PointVariables,
};
