//! Momentum and continuity residual assembly
use super::{DeviatoricState, ResidualEngine};
use crate::error::Result;
use crate::grid::LocalArray;
use crate::traits::{
    ConstitutiveLaw, DeviatoricInput, DeviatoricResponse, GridComm, VolumetricInput,
};
use crate::types::Axis;

type Index = (isize, isize, isize);

fn sum_squares(array: &LocalArray<f64>, points: [Index; 4]) -> f64 {
    points.iter().map(|&point| array[point].powi(2)).sum()
}

fn average(array: &LocalArray<f64>, points: [Index; 4]) -> f64 {
    0.25 * points.iter().map(|&point| array[point]).sum::<f64>()
}

fn store_response(dev: &mut DeviatoricState, response: &DeviatoricResponse) {
    dev.eta = response.eta;
    dev.eta_creep = response.eta_creep;
    dev.dii_plastic = response.dii_plastic;
}

/// Local indices `(i1, i2)` of the cells on both sides of node `i`, clamped to the domain
///
/// On the first global node both indices point to the cell after the node, on the last
/// global node both point to the cell before it.
fn clamp_cells(i: isize, global: usize, last: usize) -> (isize, isize) {
    let i1 = if global == last { i - 1 } else { i };
    let i2 = if global == 0 { i } else { i - 1 };
    (i1, i2)
}

impl<C: GridComm> ResidualEngine<'_, C> {
    /// Evaluate the constitutive law at every point and assemble the residuals
    ///
    /// Requires the effective strain rates of the current solution. Each point adds its
    /// stress divergence and body force contributions to the adjacent faces; contributions
    /// to ghost faces are summed onto their owners afterwards.
    pub fn assemble_residual(&mut self, law: &impl ConstitutiveLaw) -> Result<()> {
        self.check_phases(law)?;
        let Self {
            grid,
            config,
            limits,
            time,
            p_shift,
            velocity,
            p,
            t,
            momentum,
            gc,
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
        let limits = &*limits;
        let [ax, ay, az] = Axis::ALL.map(|a| grid.axis(a));
        let [vx, vy, vz] = &*velocity;
        let [fx, fy, fz] = momentum;
        let [dxx, dyy, dzz] = &*normal_rate;
        let (dxy, dxz, dyz) = (&*dxy, &*dxz, &*dyz);
        let dt = time.dt();
        let p_shift = *p_shift;
        let fssa = config.fssa;
        let efficiency = limits.shear_heat_eff;
        let [gravity_x, gravity_y, gravity_z] = config.gravity;

        for f in [&mut *fx, &mut *fy, &mut *fz, &mut *gc] {
            f.set_zero();
        }

        // cells
        for (n, index) in p.owned_indices().enumerate() {
            let (i, j, k) = index;
            let rec = &mut cells.records[n];
            let phase_ratio = cells.phase_ratios.get(n);

            let (xx, yy, zz) = (dxx[index], dyy[index], dzz[index]);
            let j2 = 0.5 * (xx * xx + yy * yy + zz * zz)
                + 0.25 * sum_squares(dxy, [(i, j, k), (i + 1, j, k), (i, j + 1, k), (i + 1, j + 1, k)])
                + 0.25 * sum_squares(dxz, [(i, j, k), (i + 1, j, k), (i, j, k + 1), (i + 1, j, k + 1)])
                + 0.25 * sum_squares(dyz, [(i, j, k), (i, j + 1, k), (i, j, k + 1), (i, j + 1, k + 1)]);
            rec.dev.dii = j2.sqrt();

            let pc = p[index];
            let tc = t[index];
            let response = law.deviatoric(&DeviatoricInput {
                phase_ratio,
                limits,
                dt,
                pressure: pc - p_shift,
                temperature: tc,
                dii: rec.dev.dii,
                i2gdt: rec.dev.i2gdt,
            });
            store_response(&mut rec.dev, &response);

            rec.sxx = 2.0 * response.eta * xx;
            rec.syy = 2.0 * response.eta * yy;
            rec.szz = 2.0 * response.eta * zz;
            rec.dev.shear_heating =
                efficiency * (rec.sxx * rec.dxx + rec.syy * rec.dyy + rec.szz * rec.dzz);

            // total Cauchy stress
            let sxx = rec.sxx - pc;
            let syy = rec.syy - pc;
            let szz = rec.szz - pc;

            let bulk = law.volumetric(&VolumetricInput {
                phase_ratio,
                limits,
                dt,
                pressure: pc,
                temperature: tc,
            });
            rec.bulk.rho = bulk.rho;
            rec.bulk.ikdt = bulk.ikdt;
            rec.bulk.alpha = bulk.alpha;

            let gx = bulk.rho * gravity_x;
            let gy = bulk.rho * gravity_y;
            let gz = bulk.rho * gravity_z;

            // free surface stabilisation
            let tx = fssa * dt * gx;
            let ty = fssa * dt * gy;
            let tz = fssa * dt * gz;

            let (bdx, fdx) = (ax.node_size(i), ax.node_size(i + 1));
            let (bdy, fdy) = (ay.node_size(j), ay.node_size(j + 1));
            let (bdz, fdz) = (az.node_size(k), az.node_size(k + 1));

            fx[(i, j, k)] -= (sxx + vx[(i, j, k)] * tx) / bdx + gx / 2.0;
            fx[(i + 1, j, k)] += (sxx + vx[(i + 1, j, k)] * tx) / fdx - gx / 2.0;
            fy[(i, j, k)] -= (syy + vy[(i, j, k)] * ty) / bdy + gy / 2.0;
            fy[(i, j + 1, k)] += (syy + vy[(i, j + 1, k)] * ty) / fdy - gy / 2.0;
            fz[(i, j, k)] -= (szz + vz[(i, j, k)] * tz) / bdz + gz / 2.0;
            fz[(i, j, k + 1)] += (szz + vz[(i, j, k + 1)] * tz) / fdz - gz / 2.0;

            let thermal = if dt > 0.0 {
                bulk.alpha * (tc - rec.bulk.tn) / dt
            } else {
                0.0
            };
            gc[index] = -bulk.ikdt * (pc - rec.bulk.pn) - rec.bulk.theta + thermal;
        }

        let last = [ax.tnods() - 1, ay.tnods() - 1, az.tnods() - 1];

        // xy edges
        for (n, index) in dxy.owned_indices().enumerate() {
            let (i, j, k) = index;
            let rec = &mut xy_edges.records[n];
            let (i1, i2) = clamp_cells(i, ax.pstart() + i as usize, last[0]);
            let (j1, j2) = clamp_cells(j, ay.pstart() + j as usize, last[1]);

            let xy = dxy[index];
            let corners = [(i1, j1, k), (i2, j1, k), (i1, j2, k), (i2, j2, k)];
            let j2_inv = xy * xy
                + 0.125 * (sum_squares(dxx, corners) + sum_squares(dyy, corners) + sum_squares(dzz, corners))
                + 0.25 * sum_squares(dxz, [(i, j1, k), (i, j1, k + 1), (i, j2, k), (i, j2, k + 1)])
                + 0.25 * sum_squares(dyz, [(i1, j, k), (i1, j, k + 1), (i2, j, k), (i2, j, k + 1)]);
            rec.dev.dii = j2_inv.sqrt();

            let around = [(i, j, k), (i - 1, j, k), (i, j - 1, k), (i - 1, j - 1, k)];
            let response = law.deviatoric(&DeviatoricInput {
                phase_ratio: xy_edges.phase_ratios.get(n),
                limits,
                dt,
                pressure: average(p, around) - p_shift,
                temperature: average(t, around),
                dii: rec.dev.dii,
                i2gdt: rec.dev.i2gdt,
            });
            store_response(&mut rec.dev, &response);
            rec.s = 2.0 * response.eta * xy;
            rec.dev.shear_heating = efficiency * 2.0 * rec.s * rec.d;
            let s = rec.s;

            let (bdx, fdx) = (ax.cell_size(i - 1), ax.cell_size(i));
            let (bdy, fdy) = (ay.cell_size(j - 1), ay.cell_size(j));
            fx[(i, j - 1, k)] -= s / bdy;
            fx[(i, j, k)] += s / fdy;
            fy[(i - 1, j, k)] -= s / bdx;
            fy[(i, j, k)] += s / fdx;
        }

        // xz edges
        for (n, index) in dxz.owned_indices().enumerate() {
            let (i, j, k) = index;
            let rec = &mut xz_edges.records[n];
            let (i1, i2) = clamp_cells(i, ax.pstart() + i as usize, last[0]);
            let (k1, k2) = clamp_cells(k, az.pstart() + k as usize, last[2]);

            let xz = dxz[index];
            let corners = [(i1, j, k1), (i2, j, k1), (i1, j, k2), (i2, j, k2)];
            let j2_inv = xz * xz
                + 0.125 * (sum_squares(dxx, corners) + sum_squares(dyy, corners) + sum_squares(dzz, corners))
                + 0.25 * sum_squares(dxy, [(i, j, k1), (i, j + 1, k1), (i, j, k2), (i, j + 1, k2)])
                + 0.25 * sum_squares(dyz, [(i1, j, k), (i1, j + 1, k), (i2, j, k), (i2, j + 1, k)]);
            rec.dev.dii = j2_inv.sqrt();

            let around = [(i, j, k), (i - 1, j, k), (i, j, k - 1), (i - 1, j, k - 1)];
            let response = law.deviatoric(&DeviatoricInput {
                phase_ratio: xz_edges.phase_ratios.get(n),
                limits,
                dt,
                pressure: average(p, around) - p_shift,
                temperature: average(t, around),
                dii: rec.dev.dii,
                i2gdt: rec.dev.i2gdt,
            });
            store_response(&mut rec.dev, &response);
            rec.s = 2.0 * response.eta * xz;
            rec.dev.shear_heating = efficiency * 2.0 * rec.s * rec.d;
            let s = rec.s;

            let (bdx, fdx) = (ax.cell_size(i - 1), ax.cell_size(i));
            let (bdz, fdz) = (az.cell_size(k - 1), az.cell_size(k));
            fx[(i, j, k - 1)] -= s / bdz;
            fx[(i, j, k)] += s / fdz;
            fz[(i - 1, j, k)] -= s / bdx;
            fz[(i, j, k)] += s / fdx;
        }

        // yz edges
        for (n, index) in dyz.owned_indices().enumerate() {
            let (i, j, k) = index;
            let rec = &mut yz_edges.records[n];
            let (j1, j2) = clamp_cells(j, ay.pstart() + j as usize, last[1]);
            let (k1, k2) = clamp_cells(k, az.pstart() + k as usize, last[2]);

            let yz = dyz[index];
            let corners = [(i, j1, k1), (i, j2, k1), (i, j1, k2), (i, j2, k2)];
            let j2_inv = yz * yz
                + 0.125 * (sum_squares(dxx, corners) + sum_squares(dyy, corners) + sum_squares(dzz, corners))
                + 0.25 * sum_squares(dxy, [(i, j, k1), (i + 1, j, k1), (i, j, k2), (i + 1, j, k2)])
                + 0.25 * sum_squares(dxz, [(i, j1, k), (i + 1, j1, k), (i, j2, k), (i + 1, j2, k)]);
            rec.dev.dii = j2_inv.sqrt();

            let around = [(i, j, k), (i, j - 1, k), (i, j, k - 1), (i, j - 1, k - 1)];
            let response = law.deviatoric(&DeviatoricInput {
                phase_ratio: yz_edges.phase_ratios.get(n),
                limits,
                dt,
                pressure: average(p, around) - p_shift,
                temperature: average(t, around),
                dii: rec.dev.dii,
                i2gdt: rec.dev.i2gdt,
            });
            store_response(&mut rec.dev, &response);
            rec.s = 2.0 * response.eta * yz;
            rec.dev.shear_heating = efficiency * 2.0 * rec.s * rec.d;
            let s = rec.s;

            let (bdy, fdy) = (ay.cell_size(j - 1), ay.cell_size(j));
            let (bdz, fdz) = (az.cell_size(k - 1), az.cell_size(k));
            fy[(i, j, k - 1)] -= s / bdz;
            fy[(i, j, k)] += s / fdz;
            fz[(i, j - 1, k)] -= s / bdy;
            fz[(i, j, k)] += s / fdy;
        }

        for f in [fx, fy, fz] {
            grid.add_ghosts_to_owners(f);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp_cells() {
        assert_eq!(clamp_cells(0, 0, 4), (0, 0));
        assert_eq!(clamp_cells(2, 2, 4), (2, 1));
        assert_eq!(clamp_cells(4, 4, 4), (3, 3));
        // first local node of a later process
        assert_eq!(clamp_cells(0, 2, 4), (0, -1));
    }
}
