//! Strain rates and vorticity from the velocity field
use super::ResidualEngine;
use crate::grid::{AxisDiscretisation, LocalArray};
use crate::traits::GridComm;
use crate::types::Axis;

type Index = (isize, isize, isize);

/// Velocity derivatives `(dv_a/dx_b, dv_b/dx_a)` at an edge in the `a`-`b` plane
///
/// `va` is the velocity component along `a`, `vb` along `b`; derivatives are taken
/// across the cells adjacent to the edge.
fn edge_gradients(
    (va, vb): (&LocalArray<f64>, &LocalArray<f64>),
    (axis_a, axis_b): (&AxisDiscretisation, &AxisDiscretisation),
    (a, b): (usize, usize),
    index: Index,
) -> (f64, f64) {
    let shifted = |axis: usize| {
        let mut target = [index.0, index.1, index.2];
        target[axis] -= 1;
        (target[0], target[1], target[2])
    };
    let position = [index.0, index.1, index.2];
    let dva_db = (va[index] - va[shifted(b)]) / axis_b.node_size(position[b]);
    let dvb_da = (vb[index] - vb[shifted(a)]) / axis_a.node_size(position[a]);
    (dva_db, dvb_da)
}

impl<C: GridComm> ResidualEngine<'_, C> {
    /// Compute the effective strain rates at cells and edges
    ///
    /// The total deviatoric rates are stored in the records; the exchanged arrays hold the
    /// effective rates, i.e. total rates plus the elastic history scaled by `I2Gdt`.
    pub fn effective_strain_rate(&mut self) {
        let Self {
            grid,
            velocity,
            normal_rate,
            dxy,
            dxz,
            dyz,
            cells,
            xy_edges,
            xz_edges,
            yz_edges,
            ..
        } = self;
        let grid = &*grid;
        let axes = Axis::ALL.map(|a| grid.axis(a));
        let [vx, vy, vz] = &*velocity;

        for (n, (i, j, k)) in cells_indices(&normal_rate[0]) {
            let rec = &mut cells.records[n];
            let xx = (vx[(i + 1, j, k)] - vx[(i, j, k)]) / axes[0].cell_size(i);
            let yy = (vy[(i, j + 1, k)] - vy[(i, j, k)]) / axes[1].cell_size(j);
            let zz = (vz[(i, j, k + 1)] - vz[(i, j, k)]) / axes[2].cell_size(k);
            let theta = xx + yy + zz;
            rec.bulk.theta = theta;
            rec.dxx = xx - theta / 3.0;
            rec.dyy = yy - theta / 3.0;
            rec.dzz = zz - theta / 3.0;
            let i2gdt = rec.dev.i2gdt;
            normal_rate[0][(i, j, k)] = rec.dxx + rec.hxx * i2gdt;
            normal_rate[1][(i, j, k)] = rec.dyy + rec.hyy * i2gdt;
            normal_rate[2][(i, j, k)] = rec.dzz + rec.hzz * i2gdt;
        }

        for (array, records, (va, vb), (a, b)) in [
            (&mut *dxy, &mut *xy_edges, (vx, vy), (0, 1)),
            (&mut *dxz, &mut *xz_edges, (vx, vz), (0, 2)),
            (&mut *dyz, &mut *yz_edges, (vy, vz), (1, 2)),
        ] {
            for (n, index) in cells_indices(array) {
                let rec = &mut records.records[n];
                let (dva_db, dvb_da) = edge_gradients((va, vb), (axes[a], axes[b]), (a, b), index);
                rec.d = 0.5 * (dva_db + dvb_da);
                array[index] = rec.d + rec.h * rec.dev.i2gdt;
            }
        }

        for array in normal_rate.iter_mut().chain([dxy, dxz, dyz]) {
            grid.update_ghosts(array);
        }
    }

    /// Compute the vorticity at the edges
    ///
    /// The x component lives on the yz edges, y on the xz edges and z on the xy edges.
    pub fn vorticity(&mut self) {
        let Self {
            grid,
            velocity,
            wx,
            wy,
            wz,
            ..
        } = self;
        let grid = &*grid;
        let axes = Axis::ALL.map(|a| grid.axis(a));
        let [vx, vy, vz] = &*velocity;

        // wz = dvy/dx - dvx/dy, wy = dvx/dz - dvz/dx, wx = dvz/dy - dvy/dz
        for (array, (va, vb), (a, b), sign) in [
            (&mut *wz, (vx, vy), (0, 1), 1.0),
            (&mut *wy, (vx, vz), (0, 2), -1.0),
            (&mut *wx, (vy, vz), (1, 2), 1.0),
        ] {
            for (_, index) in cells_indices(array) {
                let (dva_db, dvb_da) = edge_gradients((va, vb), (axes[a], axes[b]), (a, b), index);
                array[index] = sign * (dvb_da - dva_db);
            }
        }

        for array in [wx, wy, wz] {
            grid.update_ghosts(array);
        }
    }
}

/// Owned points of an array paired with their record number
fn cells_indices(array: &LocalArray<f64>) -> impl Iterator<Item = (usize, Index)> {
    array.owned_indices().enumerate()
}
