//! Staggered grid distributed over a 3D process grid
use super::{AxisDiscretisation, LocalArray, MeshSegments, PointLayout};
use crate::comm::{factorise_processes, split_cells};
use crate::config::GridConfig;
use crate::error::{FdstagError, Result};
use crate::grid::local_array::{owned_region, Region};
use crate::traits::{GridComm, HaloValue};
use crate::types::{Axis, NeighbourOffset};
use itertools::izip;
use std::ops::AddAssign;

/// Aspect ratio above which the grid is rejected
const MAX_ASPECT_RATIO: f64 = 5.0;

/// Aspect ratio above which a warning is issued
const WARN_ASPECT_RATIO: f64 = 2.0;

/// Staggered grid
///
/// Combines the three axis discretisations into the local part of the box, knows the
/// neighbouring processes and performs the ghost exchanges of all point layouts.
pub struct StaggeredGrid<'a, C: GridComm> {
    comm: &'a C,
    procs: [usize; 3],
    position: [usize; 3],
    segments: [MeshSegments; 3],
    axes: [AxisDiscretisation; 3],
    neighbours: [Option<usize>; 27],
}

impl<'a, C: GridComm> StaggeredGrid<'a, C> {
    /// Create the local part of the grid on the current process
    pub fn new(comm: &'a C, config: &GridConfig) -> Result<Self> {
        let size = comm.size();
        let rank = comm.rank();
        let cells = config.axes().map(|a| a.cells);

        let procs = match config.processes {
            Some(procs) => {
                if procs.iter().product::<usize>() != size {
                    return Err(FdstagError::config(
                        "processes",
                        format!("process grid {procs:?} does not match {size} processes"),
                    ));
                }
                for (axis, p, c) in izip!(Axis::ALL, procs, cells) {
                    if p == 0 || p > c {
                        return Err(FdstagError::axis(
                            axis.name(),
                            format!("cannot split {c} cells over {p} processes"),
                        ));
                    }
                }
                procs
            }
            None => factorise_processes(size, cells)?,
        };
        let position = [
            rank % procs[0],
            (rank / procs[0]) % procs[1],
            rank / (procs[0] * procs[1]),
        ];

        let segments = [
            MeshSegments::new(Axis::X, &config.x)?,
            MeshSegments::new(Axis::Y, &config.y)?,
            MeshSegments::new(Axis::Z, &config.z)?,
        ];

        let build = |axis: Axis| -> Result<AxisDiscretisation> {
            let a = axis.index();
            let seg = &segments[a];
            let split = split_cells(seg.cells(), procs[a]);
            let mut discretisation = AxisDiscretisation::new(axis, position[a], &split, seg)?;
            discretisation.min_max_cell_size(seg, comm);
            log::debug!(
                "rank {rank}: {}-axis nodes {}..{} of {}, {} cells",
                axis.name(),
                discretisation.pstart(),
                discretisation.pstart() + discretisation.nnods(),
                discretisation.tnods(),
                discretisation.ncels()
            );
            Ok(discretisation)
        };
        let axes = [build(Axis::X)?, build(Axis::Y)?, build(Axis::Z)?];

        let mut grid = Self {
            comm,
            procs,
            position,
            segments,
            axes,
            neighbours: [None; 27],
        };
        for offset in NeighbourOffset::all() {
            grid.neighbours[offset.index()] = grid.rank_at(offset);
        }
        Ok(grid)
    }

    fn rank_at(&self, offset: NeighbourOffset) -> Option<usize> {
        let mut rank = 0;
        let mut stride = 1;
        for (p, r, d) in izip!(self.procs, self.position, offset.components()) {
            let r = r as isize + d as isize;
            if r < 0 || r >= p as isize {
                return None;
            }
            rank += r as usize * stride;
            stride *= p;
        }
        Some(rank)
    }

    /// Communicator
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// Number of processes along each axis
    pub fn process_grid(&self) -> [usize; 3] {
        self.procs
    }

    /// Position of this process in the process grid
    pub fn process_position(&self) -> [usize; 3] {
        self.position
    }

    /// Discretisation of an axis
    pub fn axis(&self, axis: Axis) -> &AxisDiscretisation {
        &self.axes[axis.index()]
    }

    /// Segments of an axis
    pub fn segments(&self, axis: Axis) -> &MeshSegments {
        &self.segments[axis.index()]
    }

    /// Rank of the neighbour at `offset`, if there is one
    pub fn neighbour(&self, offset: NeighbourOffset) -> Option<usize> {
        self.neighbours[offset.index()]
    }

    /// The 27-entry neighbour table, ordered as [NeighbourOffset::all]
    pub fn neighbours(&self) -> &[Option<usize>; 27] {
        &self.neighbours
    }

    fn offset_of(&self, rank: usize) -> Option<NeighbourOffset> {
        NeighbourOffset::neighbours().find(|o| self.neighbour(*o) == Some(rank))
    }

    /// Number of local points of a layout along each axis
    pub fn shape(&self, layout: PointLayout) -> [usize; 3] {
        let nodal = layout.nodal();
        [0, 1, 2].map(|a| {
            if nodal[a] {
                self.axes[a].nnods()
            } else {
                self.axes[a].ncels()
            }
        })
    }

    /// Global index of the first local point of a layout along each axis
    pub fn start(&self, _layout: PointLayout) -> [usize; 3] {
        [0, 1, 2].map(|a| self.axes[a].pstart())
    }

    /// Global number of points of a layout along each axis
    pub fn global_shape(&self, layout: PointLayout) -> [usize; 3] {
        let nodal = layout.nodal();
        [0, 1, 2].map(|a| {
            if nodal[a] {
                self.axes[a].tnods()
            } else {
                self.axes[a].tcels()
            }
        })
    }

    /// Number of local points of a layout
    pub fn count(&self, layout: PointLayout) -> usize {
        self.shape(layout).iter().product()
    }

    /// New ghosted array for a layout
    pub fn create_array<T: Copy>(&self, layout: PointLayout, value: T) -> LocalArray<T> {
        LocalArray::new(self.shape(layout), value)
    }

    /// Coordinates of a local (or ghost) point of a layout
    pub fn point_coordinates(&self, layout: PointLayout, (i, j, k): (isize, isize, isize)) -> [f64; 3] {
        let nodal = layout.nodal();
        let position = |a: usize, index: isize| {
            if nodal[a] {
                self.axes[a].node(index)
            } else {
                self.axes[a].centre(index)
            }
        };
        [position(0, i), position(1, j), position(2, k)]
    }

    /// Neighbour-local and global rank of the process owning a point
    ///
    /// Only the process itself and its direct neighbours are considered. The first value is
    /// the index into the neighbour table; the global rank is `None` if the point lies outside
    /// the domain.
    pub fn point_rank(&self, x: [f64; 3]) -> (usize, Option<usize>) {
        let offset = NeighbourOffset::new(
            self.axes[0].point_neighbour(x[0]),
            self.axes[1].point_neighbour(x[1]),
            self.axes[2].point_neighbour(x[2]),
        );
        (offset.index(), self.neighbour(offset))
    }

    /// Global rank of the process owning a point anywhere in the domain
    pub fn point_owner(&self, x: [f64; 3]) -> usize {
        let [rx, ry, rz] = [0, 1, 2].map(|a| self.axes[a].point_owner(x[a]));
        rx + self.procs[0] * (ry + self.procs[1] * rz)
    }

    /// Maximum aspect ratio of all cells
    pub fn aspect_ratio(&self) -> f64 {
        let [ax, ay, az] = &self.axes;
        let mut local = 0.0_f64;
        for k in 0..az.ncels() as isize {
            let dz = az.cell_size(k);
            for j in 0..ay.ncels() as isize {
                let dy = ay.cell_size(j);
                for i in 0..ax.ncels() as isize {
                    let dx = ax.cell_size(i);
                    for (a, b) in [(dx, dy), (dx, dz), (dy, dz)] {
                        local = local.max(a.max(b) / a.min(b));
                    }
                }
            }
        }
        self.comm.all_reduce_max(local)
    }

    /// Log the grid summary and check the aspect ratio
    ///
    /// Returns the maximum aspect ratio.
    pub fn view(&self) -> Result<f64> {
        let [tx, ty, tz] = [0, 1, 2].map(|a| self.axes[a].tcels());
        let [nx, ny, nz] = [0, 1, 2].map(|a| self.axes[a].tnods());
        let aspect_ratio = self.aspect_ratio();

        if self.comm.is_root() {
            let [px, py, pz] = self.procs;
            log::info!("Processor grid  [nx, ny, nz]   : [{px}, {py}, {pz}]");
            log::info!("Fine grid cells [nx, ny, nz]   : [{tx}, {ty}, {tz}]");
            log::info!("Number of cells                :  {}", tx * ty * tz);
            log::info!(
                "Number of velocity DOF         :  {}",
                nx * ty * tz + tx * ny * tz + tx * ty * nz
            );
            log::info!("Maximum cell aspect ratio      :  {aspect_ratio:7.5}");
        }

        if aspect_ratio > MAX_ASPECT_RATIO {
            return Err(FdstagError::config(
                "aspect_ratio",
                format!("too large aspect ratio {aspect_ratio:.5} is not supported"),
            ));
        }
        if aspect_ratio > WARN_ASPECT_RATIO && self.comm.is_root() {
            log::warn!("non-optimal aspect ratio {aspect_ratio:.5}, expect precision deterioration");
        }
        Ok(aspect_ratio)
    }

    /// Bounding box `(begin, end)` of the local cells
    pub fn local_box(&self) -> ([f64; 3], [f64; 3]) {
        let bounds = self.axes.each_ref().map(|a| a.local_bounds());
        (bounds.map(|b| b.0), bounds.map(|b| b.1))
    }

    /// Bounding box `(begin, end)` of the domain
    pub fn global_box(&self) -> ([f64; 3], [f64; 3]) {
        let bounds = self.segments.each_ref().map(|s| {
            let b = s.bounds();
            (b[0], b[b.len() - 1])
        });
        (bounds.map(|b| b.0), bounds.map(|b| b.1))
    }

    /// Stretch the grid about the coordinate origin with background strain rates
    ///
    /// The z strain rate `-(exx + eyy)` conserves the volume. Positive rates compress.
    pub fn stretch(&mut self, exx: f64, eyy: f64, dt: f64) {
        let ezz = -(exx + eyy);
        for (axis, rate) in [(Axis::X, exx), (Axis::Y, eyy), (Axis::Z, ezz)] {
            if rate != 0.0 {
                let a = axis.index();
                self.axes[a].stretch(&mut self.segments[a], rate * dt);
            }
        }
    }

    /// Copy owned values into the ghost points of the neighbouring processes
    ///
    /// Ghost points on the domain boundary are left untouched.
    pub fn update_ghosts<T: HaloValue>(&self, array: &mut LocalArray<T>) {
        let shape = array.shape();
        let sends = NeighbourOffset::neighbours()
            .filter_map(|offset| {
                self.neighbour(offset)
                    .map(|rank| (rank, array.pack(send_region(shape, offset))))
            })
            .collect::<Vec<_>>();
        for (rank, data) in self.comm.exchange(&sends) {
            if let Some(offset) = self.offset_of(rank) {
                array.unpack(ghost_region(shape, offset), &data);
            }
        }
    }

    /// Add the values accumulated in ghost points to the owning processes
    ///
    /// Values in ghost points on the domain boundary are discarded.
    pub fn add_ghosts_to_owners<T: HaloValue + AddAssign>(&self, array: &mut LocalArray<T>) {
        let shape = array.shape();
        let sends = NeighbourOffset::neighbours()
            .filter_map(|offset| {
                self.neighbour(offset)
                    .map(|rank| (rank, array.pack(ghost_region(shape, offset))))
            })
            .collect::<Vec<_>>();
        for (rank, data) in self.comm.exchange(&sends) {
            if let Some(offset) = self.offset_of(rank) {
                array.unpack_add(send_region(shape, offset), &data);
            }
        }
    }
}

/// Owned points that are ghosts of the neighbour at `offset`
fn send_region(shape: [usize; 3], offset: NeighbourOffset) -> Region {
    let mut region = owned_region(shape);
    for (r, n, d) in izip!(region.iter_mut(), shape, offset.components()) {
        let n = n as isize;
        match d {
            -1 => *r = 0..1,
            1 => *r = n - 1..n,
            _ => {}
        }
    }
    region
}

/// Ghost points owned by the neighbour at `offset`
fn ghost_region(shape: [usize; 3], offset: NeighbourOffset) -> Region {
    let mut region = owned_region(shape);
    for (r, n, d) in izip!(region.iter_mut(), shape, offset.components()) {
        let n = n as isize;
        match d {
            -1 => *r = -1..0,
            1 => *r = n..n + 1,
            _ => {}
        }
    }
    region
}
