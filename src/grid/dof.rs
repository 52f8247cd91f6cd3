//! Global numbering of the velocity and pressure unknowns
use super::{LocalArray, PointLayout, StaggeredGrid};
use crate::traits::GridComm;
use crate::types::{DofId, IndexMode};

/// Marker for points without a global id during the ghost exchange
const NO_ID: usize = usize::MAX;

/// Global ids of the unknowns at all local and ghost points
///
/// Within a process the velocity unknowns are numbered x-faces, y-faces, z-faces, each in
/// `k, j, i` order with `i` fastest, followed by the pressure unknowns at the cells.
#[derive(Debug, Clone)]
pub struct DofIndex {
    mode: IndexMode,
    lnv: usize,
    lnp: usize,
    stv: usize,
    stp: usize,
    vx: LocalArray<DofId>,
    vy: LocalArray<DofId>,
    vz: LocalArray<DofId>,
    p: LocalArray<DofId>,
}

impl DofIndex {
    /// Number the unknowns
    pub fn new<C: GridComm>(grid: &StaggeredGrid<'_, C>, mode: IndexMode) -> Self {
        let comm = grid.comm();
        let faces = [PointLayout::XFaces, PointLayout::YFaces, PointLayout::ZFaces];
        let lnv = faces.iter().map(|f| grid.count(*f)).sum::<usize>();
        let lnp = grid.count(PointLayout::Cells);

        let stv = comm.exclusive_scan_sum(lnv);
        let stp = comm.exclusive_scan_sum(lnp);

        let (mut next_v, mut next_p) = match mode {
            IndexMode::Coupled => (stv + stp, stv + stp + lnv),
            IndexMode::Uncoupled => (stv, stp),
        };

        let number = |layout: PointLayout, next: &mut usize| {
            let mut ids = grid.create_array(layout, NO_ID);
            for (i, j, k) in ids.owned_indices().collect::<Vec<_>>() {
                ids[(i, j, k)] = *next;
                *next += 1;
            }
            grid.update_ghosts(&mut ids);
            let mut tagged = ids.map(|id| match id {
                NO_ID => DofId::Unassigned,
                id => DofId::Ghost(id),
            });
            for (i, j, k) in ids.owned_indices() {
                tagged[(i, j, k)] = DofId::Owned(ids[(i, j, k)]);
            }
            tagged
        };

        let vx = number(PointLayout::XFaces, &mut next_v);
        let vy = number(PointLayout::YFaces, &mut next_v);
        let vz = number(PointLayout::ZFaces, &mut next_v);
        let p = number(PointLayout::Cells, &mut next_p);

        Self {
            mode,
            lnv,
            lnp,
            stv,
            stp,
            vx,
            vy,
            vz,
            p,
        }
    }

    /// Numbering mode
    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    /// Number of local velocity unknowns
    pub fn lnv(&self) -> usize {
        self.lnv
    }

    /// Number of local pressure unknowns
    pub fn lnp(&self) -> usize {
        self.lnp
    }

    /// Number of local unknowns
    pub fn ln(&self) -> usize {
        self.lnv + self.lnp
    }

    /// Global velocity id of the first local velocity unknown (uncoupled numbering)
    pub fn stv(&self) -> usize {
        self.stv
    }

    /// Global pressure id of the first local pressure unknown (uncoupled numbering)
    pub fn stp(&self) -> usize {
        self.stp
    }

    /// Global id of the first local unknown (coupled numbering)
    pub fn st(&self) -> usize {
        self.stv + self.stp
    }

    /// Ids of the x-velocity points
    pub fn vx(&self) -> &LocalArray<DofId> {
        &self.vx
    }

    /// Ids of the y-velocity points
    pub fn vy(&self) -> &LocalArray<DofId> {
        &self.vy
    }

    /// Ids of the z-velocity points
    pub fn vz(&self) -> &LocalArray<DofId> {
        &self.vz
    }

    /// Ids of the pressure points
    pub fn p(&self) -> &LocalArray<DofId> {
        &self.p
    }
}
