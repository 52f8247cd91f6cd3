//! Boundary conditions of the coupled Stokes problem
use crate::error::{FdstagError, Result};
use crate::grid::local_array::region_indices;
use crate::grid::{LocalArray, PointLayout, StaggeredGrid};
use crate::traits::GridComm;
use crate::types::{Axis, GhostConstraint};

/// Layouts of the ghost rule fields
const RULE_LAYOUTS: [PointLayout; 4] = [
    PointLayout::XFaces,
    PointLayout::YFaces,
    PointLayout::ZFaces,
    PointLayout::Cells,
];

/// Single- and two-point constraints
///
/// Single-point constraints fix entries of the solution vector; they are addressed by
/// local flat index into the velocity block (`0..lnv`) or the pressure block (`0..lnp`).
/// Two-point constraints define how the ghost values of points next to the domain
/// boundary are synthesised from the adjacent interior values.
#[derive(Debug, Clone)]
pub struct Constraints {
    velocity: Vec<(usize, f64)>,
    pressure: Vec<(usize, f64)>,
    rules: [LocalArray<GhostConstraint>; 4],
}

impl Constraints {
    /// Unconstrained problem: no fixed values, zero-gradient ghosts
    pub fn new<C: GridComm>(grid: &StaggeredGrid<'_, C>) -> Self {
        Self {
            velocity: vec![],
            pressure: vec![],
            rules: RULE_LAYOUTS.map(|layout| grid.create_array(layout, GhostConstraint::Free)),
        }
    }

    /// Free slip on every side of the box
    ///
    /// The normal velocity is fixed to zero on the boundary, tangential velocities have
    /// zero-gradient ghosts.
    pub fn free_slip<C: GridComm>(grid: &StaggeredGrid<'_, C>) -> Self {
        let mut constraints = Self::new(grid);
        let mut offset = 0;
        for axis in Axis::ALL {
            let layout = PointLayout::face(axis);
            let discretisation = grid.axis(axis);
            let last = discretisation.tnods() - 1;
            let shape = grid.shape(layout);
            let array = &constraints.rules[axis.index()];
            for (n, index) in array.owned_indices().enumerate() {
                let position = [index.0, index.1, index.2][axis.index()];
                let global = discretisation.pstart() + position as usize;
                if global == 0 || global == last {
                    constraints.velocity.push((offset + n, 0.0));
                }
            }
            offset += shape.iter().product::<usize>();
        }
        constraints
    }

    /// Fix an entry of the velocity block
    pub fn fix_velocity(&mut self, index: usize, value: f64) {
        self.velocity.push((index, value));
    }

    /// Fix an entry of the pressure block
    pub fn fix_pressure(&mut self, index: usize, value: f64) {
        self.pressure.push((index, value));
    }

    /// Fixed velocity entries
    pub fn velocity(&self) -> &[(usize, f64)] {
        &self.velocity
    }

    /// Fixed pressure entries
    pub fn pressure(&self) -> &[(usize, f64)] {
        &self.pressure
    }

    /// Ghost rules of a velocity component
    pub fn velocity_rules(&self, axis: Axis) -> &LocalArray<GhostConstraint> {
        &self.rules[axis.index()]
    }

    /// Mutable ghost rules of a velocity component
    pub fn velocity_rules_mut(&mut self, axis: Axis) -> &mut LocalArray<GhostConstraint> {
        &mut self.rules[axis.index()]
    }

    /// Ghost rules of the pressure
    pub fn pressure_rules(&self) -> &LocalArray<GhostConstraint> {
        &self.rules[3]
    }

    /// Mutable ghost rules of the pressure
    pub fn pressure_rules_mut(&mut self) -> &mut LocalArray<GhostConstraint> {
        &mut self.rules[3]
    }

    /// Check the fixed entries against the block sizes
    pub fn check(&self, lnv: usize, lnp: usize) -> Result<()> {
        for (entries, len, name) in [
            (&self.velocity, lnv, "velocity"),
            (&self.pressure, lnp, "pressure"),
        ] {
            if let Some((index, _)) = entries.iter().find(|(index, _)| *index >= len) {
                return Err(FdstagError::config(
                    "constraints",
                    format!("fixed {name} entry {index} outside of block of size {len}"),
                ));
            }
        }
        Ok(())
    }

    /// Check that the ghost rules were created for `grid`
    pub fn check_shapes<C: GridComm>(&self, grid: &StaggeredGrid<'_, C>) -> Result<()> {
        for (rules, layout) in self.rules.iter().zip(RULE_LAYOUTS) {
            for (expected, found) in grid.shape(layout).into_iter().zip(rules.shape()) {
                FdstagError::check_len(layout.name(), expected, found)?;
            }
        }
        Ok(())
    }

    /// Write the fixed values into a solution vector
    pub(crate) fn apply(&self, x: &mut [f64], lnv: usize) {
        for &(index, value) in &self.velocity {
            x[index] = value;
        }
        for &(index, value) in &self.pressure {
            x[lnv + index] = value;
        }
    }

    /// Zero the residual of the fixed entries
    pub(crate) fn zero(&self, f: &mut [f64], lnv: usize) {
        for &(index, _) in &self.velocity {
            f[index] = 0.0;
        }
        for &(index, _) in &self.pressure {
            f[lnv + index] = 0.0;
        }
    }
}

/// Synthesise the ghost values on the domain boundary
///
/// Points inside the domain and internal ghosts along the process boundaries are visited;
/// along each cell-centred axis where the point is next to the boundary, the ghost beyond
/// it is set by `rule`. Ghosts that are outside the domain along several axes receive the
/// sum of the single-axis ghost values minus `(m - 1)` times the interior value.
///
/// `values` must have been exchanged before.
pub(crate) fn set_boundary_ghosts<C: GridComm>(
    grid: &StaggeredGrid<'_, C>,
    layout: PointLayout,
    values: &mut LocalArray<f64>,
    rule: impl Fn((isize, isize, isize)) -> GhostConstraint,
) {
    let nodal = layout.nodal();
    let shape = values.shape();
    let axes = Axis::ALL.map(|a| grid.axis(a));
    let region = [0, 1, 2].map(|a| {
        let lower = if axes[a].has_prev() { -1 } else { 0 };
        let upper = shape[a] as isize + isize::from(axes[a].has_next());
        lower..upper
    });

    for point in region_indices(region) {
        let index = [point.0, point.1, point.2];

        // (axis, direction) of every boundary next to the point
        let mut sides = [(0, 0); 6];
        let mut count = 0;
        for a in 0..3 {
            if nodal[a] || index[a] < 0 || index[a] >= shape[a] as isize {
                continue;
            }
            let global = axes[a].pstart() + index[a] as usize;
            if global == 0 {
                sides[count] = (a, -1);
                count += 1;
            }
            if global == axes[a].tcels() - 1 {
                sides[count] = (a, 1);
                count += 1;
            }
        }
        if count == 0 {
            continue;
        }

        let interior = values[point];
        let shifted = |moves: &[(usize, isize)]| {
            let mut target = index;
            for &(a, d) in moves {
                target[a] += d;
            }
            (target[0], target[1], target[2])
        };
        let single = sides[..count]
            .iter()
            .map(|side| {
                let target = shifted(std::slice::from_ref(side));
                (target, rule(target).ghost_value(interior))
            })
            .collect::<Vec<_>>();
        for &(target, value) in &single {
            values[target] = value;
        }

        for mask in 1_usize..(1 << count) {
            let m = mask.count_ones() as usize;
            if m < 2 {
                continue;
            }
            let subset = (0..count)
                .filter(|n| mask & (1 << n) != 0)
                .collect::<Vec<_>>();
            if (1..m).any(|a| subset[..a].iter().any(|&b| sides[b].0 == sides[subset[a]].0)) {
                continue;
            }
            let moves = subset.iter().map(|&n| sides[n]).collect::<Vec<_>>();
            let sum = subset.iter().map(|&n| single[n].1).sum::<f64>();
            values[shifted(&moves)] = sum - (m - 1) as f64 * interior;
        }
    }
}
