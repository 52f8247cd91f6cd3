//! Partitioned discretisation of one axis
use super::MeshSegments;
use crate::error::{FdstagError, Result};
use crate::traits::GridComm;
use crate::types::Axis;

/// Relative tolerance for detecting a uniform axis
const UNIFORM_TOLERANCE: f64 = 1e-8;

/// Part of an axis owned by one process column
///
/// A process owns the nodes `pstart..pstart + nnods` and the cells `pstart..pstart + ncels`.
/// Every process owns as many nodes as cells, except the last one which also owns the last
/// node. Local indices run from -1 (the ghost point on the left) upwards.
#[derive(Debug, Clone)]
pub struct AxisDiscretisation {
    axis: Axis,
    rank: usize,
    starts: Vec<usize>,
    pstart: usize,
    nnods: usize,
    ncels: usize,
    tcels: usize,
    nodes: Vec<f64>,
    centres: Vec<f64>,
    bounds: Vec<f64>,
    h_uni: Option<f64>,
    h_min: f64,
    h_max: f64,
}

impl AxisDiscretisation {
    /// Create the discretisation seen by process `rank` of a column of `cells_per_process.len()`
    /// processes, and generate its coordinates
    ///
    /// The extreme cell sizes are local until [Self::min_max_cell_size] is called.
    pub fn new(
        axis: Axis,
        rank: usize,
        cells_per_process: &[usize],
        segments: &MeshSegments,
    ) -> Result<Self> {
        let nproc = cells_per_process.len();
        if rank >= nproc {
            return Err(FdstagError::axis(
                axis.name(),
                format!("rank {rank} outside a column of {nproc} processes"),
            ));
        }
        if cells_per_process.iter().any(|&c| c == 0) {
            return Err(FdstagError::axis(
                axis.name(),
                "every process needs at least one cell",
            ));
        }
        let tcels = cells_per_process.iter().sum::<usize>();
        if tcels != segments.cells() {
            return Err(FdstagError::axis(
                axis.name(),
                format!(
                    "partition holds {} cells, the mesh {}",
                    tcels,
                    segments.cells()
                ),
            ));
        }

        let mut starts = Vec::with_capacity(nproc + 1);
        let mut count = 0;
        for c in cells_per_process {
            starts.push(count);
            count += c;
        }
        // index of the last node
        starts.push(count);

        let ncels = cells_per_process[rank];
        let nnods = if rank + 1 == nproc { ncels + 1 } else { ncels };

        let mut discretisation = Self {
            axis,
            rank,
            pstart: starts[rank],
            starts,
            nnods,
            ncels,
            tcels,
            nodes: vec![],
            centres: vec![],
            bounds: vec![],
            h_uni: None,
            h_min: 0.0,
            h_max: 0.0,
        };
        discretisation.generate_coordinates(segments)?;
        Ok(discretisation)
    }

    /// Generate the node and cell centre coordinates including ghost points
    ///
    /// Internal ghost nodes come from the segments. Ghost nodes on the domain boundary are
    /// extrapolated linearly.
    pub fn generate_coordinates(&mut self, segments: &MeshSegments) -> Result<()> {
        let has_prev = self.has_prev();
        let has_next = self.has_next();

        let mut nodes = vec![0.0; self.nnods + if has_next { 3 } else { 2 }];
        let offset = usize::from(!has_prev);
        let first = self.pstart - usize::from(has_prev);
        let count = self.nnods + usize::from(has_prev) + if has_next { 2 } else { 0 };
        if segments.generate_range(first, &mut nodes[offset..offset + count]) != count {
            return Err(FdstagError::axis(
                self.axis.name(),
                "local nodes exceed the mesh segments",
            ));
        }

        if !has_prev {
            nodes[0] = 2.0 * nodes[1] - nodes[2];
        }
        if !has_next {
            let n = nodes.len();
            nodes[n - 1] = 2.0 * nodes[n - 2] - nodes[n - 3];
        }

        self.centres = nodes[..self.ncels + 3]
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect();
        self.nodes = nodes;

        let mut x = [0.0];
        self.bounds = self
            .starts
            .iter()
            .map(|&node| {
                segments.generate_range(node, &mut x);
                x[0]
            })
            .collect();

        let (h_min, h_max) = self.local_min_max();
        self.set_cell_sizes(h_min, h_max, segments.uniform_step());
        Ok(())
    }

    fn local_min_max(&self) -> (f64, f64) {
        (0..self.ncels as isize)
            .map(|i| self.cell_size(i))
            .fold((f64::MAX, f64::MIN), |(lo, hi), h| (lo.min(h), hi.max(h)))
    }

    fn set_cell_sizes(&mut self, h_min: f64, h_max: f64, uniform_step: f64) {
        if (h_max - h_min).abs() < UNIFORM_TOLERANCE * uniform_step {
            self.h_uni = Some(uniform_step);
            self.h_min = uniform_step;
            self.h_max = uniform_step;
        } else {
            self.h_uni = None;
            self.h_min = h_min;
            self.h_max = h_max;
        }
    }

    /// Compute the global extreme cell sizes and detect a uniform axis
    ///
    /// All processes sharing this axis hold the same column of coordinates, so the global
    /// reduction gives the column result.
    pub fn min_max_cell_size(&mut self, segments: &MeshSegments, comm: &impl GridComm) {
        let (lo, hi) = self.local_min_max();
        let h_min = comm.all_reduce_min(lo);
        let h_max = comm.all_reduce_max(hi);
        self.set_cell_sizes(h_min, h_max, segments.uniform_step());
    }

    /// Stretch about the coordinate origin: `x <- x (1 - eps)`
    pub fn stretch(&mut self, segments: &mut MeshSegments, eps: f64) {
        segments.stretch(eps);
        let factor = 1.0 - eps;
        for x in self
            .nodes
            .iter_mut()
            .chain(self.centres.iter_mut())
            .chain(self.bounds.iter_mut())
        {
            *x *= factor;
        }
        match self.h_uni {
            Some(_) => {
                let h = segments.uniform_step();
                self.h_uni = Some(h);
                self.h_min = h;
                self.h_max = h;
            }
            None => {
                self.h_min *= factor;
                self.h_max *= factor;
            }
        }
    }

    /// Check whether the axis can be coarsened by a geometric multigrid
    ///
    /// Returns the number of possible coarsening steps.
    pub fn check_multigrid(&self) -> Result<usize> {
        let name = self.axis.name();
        let nproc = self.process_count();
        if self.ncels % 2 != 0 {
            return Err(FdstagError::axis(name, "Local grid size is an odd number"));
        }
        if self.tcels % nproc != 0 {
            return Err(FdstagError::axis(
                name,
                "Uniform local grid size doesn't exist",
            ));
        }
        if self.tcels / nproc != self.ncels {
            return Err(FdstagError::axis(
                name,
                "Local grid size is not constant on all processors",
            ));
        }
        let mut size = self.ncels;
        let mut steps = 0;
        while size % 2 == 0 {
            size /= 2;
            steps += 1;
        }
        Ok(steps)
    }

    /// Coordinates of all nodes of the axis
    pub fn global_coordinates(&self, segments: &MeshSegments) -> Vec<f64> {
        let mut x = vec![0.0; self.tcels + 1];
        segments.generate_range(0, &mut x);
        x
    }

    /// Position of the process that owns the coordinate `x` along this axis
    ///
    /// Points outside the domain are assigned to the first or last process.
    pub fn point_owner(&self, x: f64) -> usize {
        let nproc = self.process_count();
        self.bounds[1..nproc]
            .partition_point(|&b| b <= x)
            .min(nproc - 1)
    }

    /// Position of `x` relative to the local part of the axis: -1 (left), 0 (inside) or 1 (right)
    pub fn point_neighbour(&self, x: f64) -> i8 {
        if x < self.node(0) {
            -1
        } else if x > self.node(self.ncels as isize) {
            1
        } else {
            0
        }
    }

    /// Axis
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Position of this process in its column
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes along the axis
    pub fn process_count(&self) -> usize {
        self.starts.len() - 1
    }

    /// Is there a process on the left?
    pub fn has_prev(&self) -> bool {
        self.rank > 0
    }

    /// Is there a process on the right?
    pub fn has_next(&self) -> bool {
        self.rank + 1 < self.process_count()
    }

    /// Global index of the first node (and cell) of every process, followed by the index of
    /// the last node
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Global index of the first local node
    pub fn pstart(&self) -> usize {
        self.pstart
    }

    /// Number of local nodes
    pub fn nnods(&self) -> usize {
        self.nnods
    }

    /// Number of local cells
    pub fn ncels(&self) -> usize {
        self.ncels
    }

    /// Total number of nodes
    pub fn tnods(&self) -> usize {
        self.tcels + 1
    }

    /// Total number of cells
    pub fn tcels(&self) -> usize {
        self.tcels
    }

    /// Uniform cell size, if the axis is uniform
    pub fn h_uni(&self) -> Option<f64> {
        self.h_uni
    }

    /// Smallest cell size
    pub fn h_min(&self) -> f64 {
        self.h_min
    }

    /// Largest cell size
    pub fn h_max(&self) -> f64 {
        self.h_max
    }

    /// Coordinate of local node `i`
    pub fn node(&self, i: isize) -> f64 {
        self.nodes[(i + 1) as usize]
    }

    /// Coordinate of the centre of local cell `i`
    pub fn centre(&self, i: isize) -> f64 {
        self.centres[(i + 1) as usize]
    }

    /// Size of local cell `i`
    pub fn cell_size(&self, i: isize) -> f64 {
        self.node(i + 1) - self.node(i)
    }

    /// Distance between the centres of the cells adjacent to local node `i`
    pub fn node_size(&self, i: isize) -> f64 {
        self.centre(i) - self.centre(i - 1)
    }

    /// Coordinates of the local nodes, without ghosts
    pub fn owned_nodes(&self) -> &[f64] {
        &self.nodes[1..=self.nnods]
    }

    /// Extent `[first node, last node]` of the local cells
    pub fn local_bounds(&self) -> (f64, f64) {
        (self.node(0), self.node(self.ncels as isize))
    }

    /// Extent of the axis
    pub fn global_bounds(&self) -> (f64, f64) {
        (self.bounds[0], self.bounds[self.bounds.len() - 1])
    }
}
