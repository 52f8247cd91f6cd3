//! Courant time step control
use super::ResidualEngine;
use crate::grid::{AxisDiscretisation, LocalArray};
use crate::traits::GridComm;
use crate::types::Axis;

/// Maximum inverse step `|v| / h` of one velocity component over the owned points
///
/// `h` is the size of the cell the point moves into.
fn max_inverse_step(v: &LocalArray<f64>, axis: &AxisDiscretisation) -> f64 {
    let a = axis.axis().index();
    if let Some(h) = axis.h_uni() {
        return v.owned_values().fold(0.0_f64, |m, value| m.max(value.abs())) / h;
    }
    v.owned_indices().fold(0.0, |m: f64, (i, j, k)| {
        let value = v[(i, j, k)];
        let position = [i, j, k][a];
        let cell = if value < 0.0 { position - 1 } else { position };
        m.max(value.abs() / axis.cell_size(cell))
    })
}

impl<C: GridComm> ResidualEngine<'_, C> {
    /// Select the next time step from the Courant criterion
    ///
    /// The current step becomes the previous one; the new step grows by at most 10 %,
    /// is bounded by `dt_max` and moves no material point further than `courant` cells.
    pub fn courant_step(&mut self) -> f64 {
        let local = Axis::ALL
            .iter()
            .map(|&axis| max_inverse_step(&self.velocity[axis.index()], self.grid.axis(axis)))
            .fold(0.0, f64::max);
        let global = self.grid.comm().all_reduce_max(local);
        let dt = self.time.limit(global);
        if self.grid.comm().is_root() {
            log::debug!("Courant time step              :  {dt:.8e}");
        }
        dt
    }
}
