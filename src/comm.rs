//! Communicators
//!
//! The grid only talks to other processes through the [GridComm](crate::traits::GridComm)
//! trait. [SerialComm] runs everything on one process, [MpiComm] (feature `mpi`) wraps an
//! MPI communicator.

#[cfg(feature = "mpi")]
mod parallel;
mod serial;

#[cfg(feature = "mpi")]
pub use parallel::MpiComm;
pub use serial::SerialComm;

use crate::error::{FdstagError, Result};

/// Choose the process grid `[px, py, pz]` for `size` processes
///
/// The factorisation with the smallest inter-process surface is chosen. No axis may be split
/// into more parts than it has cells.
pub fn factorise_processes(size: usize, cells: [usize; 3]) -> Result<[usize; 3]> {
    let mut best: Option<([usize; 3], usize)> = None;
    for px in (1..=size).filter(|p| size % p == 0) {
        let rest = size / px;
        for py in (1..=rest).filter(|p| rest % p == 0) {
            let procs = [px, py, rest / py];
            if procs.iter().zip(cells.iter()).any(|(p, c)| p > c) {
                continue;
            }
            let [nx, ny, nz] = cells;
            let surface = ny * nz * (procs[0] - 1) + nx * nz * (procs[1] - 1) + nx * ny * (procs[2] - 1);
            if best.map_or(true, |(_, s)| surface < s) {
                best = Some((procs, surface));
            }
        }
    }
    best.map(|(procs, _)| procs).ok_or_else(|| {
        FdstagError::config(
            "processes",
            format!("cannot distribute {size} processes over {cells:?} cells"),
        )
    })
}

/// Split `cells` cells over `parts` processes; the first processes take the remainder
pub fn split_cells(cells: usize, parts: usize) -> Vec<usize> {
    (0..parts)
        .map(|p| cells / parts + usize::from(p < cells % parts))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_factorise_cube() {
        assert_eq!(factorise_processes(8, [16, 16, 16]).unwrap(), [2, 2, 2]);
        assert_eq!(factorise_processes(1, [4, 4, 4]).unwrap(), [1, 1, 1]);
    }

    #[test]
    fn test_factorise_flat() {
        // A thin slab should not be cut along its short axis
        assert_eq!(factorise_processes(4, [64, 64, 2]).unwrap(), [2, 2, 1]);
        assert_eq!(factorise_processes(2, [32, 4, 4]).unwrap(), [2, 1, 1]);
    }

    #[test]
    fn test_factorise_too_many() {
        assert!(factorise_processes(8, [1, 1, 4]).is_err());
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells(10, 3), vec![4, 3, 3]);
        assert_eq!(split_cells(8, 2), vec![4, 4]);
        assert_eq!(split_cells(5, 1), vec![5]);
    }
}
