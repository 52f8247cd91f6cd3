//! Single process communicator
use crate::traits::{GridComm, HaloValue};

/// Communicator for a run on a single process
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl GridComm for SerialComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn all_reduce_sum(&self, value: f64) -> f64 {
        value
    }
    fn all_reduce_min(&self, value: f64) -> f64 {
        value
    }
    fn all_reduce_max(&self, value: f64) -> f64 {
        value
    }
    fn exclusive_scan_sum(&self, _value: usize) -> usize {
        0
    }
    fn exchange<T: HaloValue>(&self, sends: &[(usize, Vec<T>)]) -> Vec<(usize, Vec<T>)> {
        sends
            .iter()
            .filter(|(rank, data)| *rank == 0 && !data.is_empty())
            .cloned()
            .collect()
    }
}
