//! MPI communicator
use crate::traits::{GridComm, HaloValue};
use itertools::Itertools;
use mpi::{
    collective::SystemOperation,
    traits::{Communicator, CommunicatorCollectives},
};

/// Communicator backed by MPI
pub struct MpiComm<'a, C: Communicator> {
    comm: &'a C,
}

impl<'a, C: Communicator> MpiComm<'a, C> {
    /// Create new
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }

    /// The wrapped MPI communicator
    pub fn comm(&self) -> &C {
        self.comm
    }

    fn reduce(&self, value: f64, op: SystemOperation) -> f64 {
        let mut result = 0.0;
        self.comm.all_reduce_into(&value, &mut result, op);
        result
    }
}

impl<C: Communicator> GridComm for MpiComm<'_, C> {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }
    fn size(&self) -> usize {
        self.comm.size() as usize
    }
    fn all_reduce_sum(&self, value: f64) -> f64 {
        self.reduce(value, SystemOperation::sum())
    }
    fn all_reduce_min(&self, value: f64) -> f64 {
        self.reduce(value, SystemOperation::min())
    }
    fn all_reduce_max(&self, value: f64) -> f64 {
        self.reduce(value, SystemOperation::max())
    }
    fn exclusive_scan_sum(&self, value: usize) -> usize {
        let mut start: usize = 0;
        self.comm
            .exclusive_scan_into(&value, &mut start, SystemOperation::sum());
        // The receive buffer is undefined on the first process
        if self.comm.rank() == 0 {
            0
        } else {
            start
        }
    }
    fn exchange<T: HaloValue>(&self, sends: &[(usize, Vec<T>)]) -> Vec<(usize, Vec<T>)> {
        let size = self.size();
        let mut counts = vec![0; size];
        let mut data = Vec::<T>::new();
        for (rank, buffer) in sends.iter().sorted_by_key(|(rank, _)| *rank) {
            counts[*rank] += buffer.len();
            data.extend_from_slice(buffer);
        }

        let (recv_counts, recv_data) = all_to_all_varcount(self.comm, &counts, &data);

        let mut received = vec![];
        let mut offset = 0;
        for (rank, count) in recv_counts.into_iter().enumerate() {
            if count > 0 {
                received.push((rank, recv_data[offset..offset + count].to_vec()));
            }
            offset += count;
        }
        received
    }
}

// Send `counts[p]` consecutive entries of `data` to process `p`.
// Returns the receive counts from each process and the received data.
fn all_to_all_varcount<T: HaloValue>(
    comm: &impl Communicator,
    counts: &[usize],
    data: &[T],
) -> (Vec<usize>, Vec<T>) {
    let counts = counts.iter().map(|&x| x as i32).collect_vec();

    // First send around the counts
    let mut recv_counts = vec![0_i32; comm.size() as usize];
    comm.all_to_all_into(&counts, &mut recv_counts);

    let mut receive_data = vec![T::default(); recv_counts.iter().sum::<i32>() as usize];

    let displacements = |counts: &[i32]| {
        counts
            .iter()
            .scan(0, |acc, &x| {
                let old = *acc;
                *acc += x;
                Some(old)
            })
            .collect_vec()
    };
    let send_displacements = displacements(&counts);
    let receive_displacements = displacements(&recv_counts);

    let send_partition = mpi::datatype::Partition::new(data, &counts[..], send_displacements);
    let mut receive_partition = mpi::datatype::PartitionMut::new(
        &mut receive_data[..],
        &recv_counts[..],
        receive_displacements,
    );

    comm.all_to_all_varcount_into(&send_partition, &mut receive_partition);

    (
        recv_counts.iter().map(|&i| i as usize).collect_vec(),
        receive_data,
    )
}
