//! Parallel staggered-grid discretisation and nonlinear residual assembly
//!
//! The crate partitions a regular, possibly non-uniform 3D grid over a 3D process grid,
//! lays out the staggered variables (cell centres, corners, edges and faces), numbers the
//! velocity and pressure unknowns, and evaluates the residual of the quasi-static momentum
//! and mass conservation equations for a visco-elasto-plastic continuum.
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod comm;
pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod residual;
pub mod traits;
pub mod types;

#[cfg(feature = "mpi")]
pub use comm::MpiComm;
pub use comm::SerialComm;
pub use error::{FdstagError, Result};
pub use grid::{DofIndex, StaggeredGrid};
pub use residual::{Constraints, ResidualEngine};
