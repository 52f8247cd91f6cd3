//! Communication between the processes of the grid

/// Values that can be sent through a ghost exchange
#[cfg(feature = "mpi")]
pub trait HaloValue: Copy + Default + Send + Sync + 'static + mpi::traits::Equivalence {}

/// Values that can be sent through a ghost exchange
#[cfg(not(feature = "mpi"))]
pub trait HaloValue: Copy + Default + Send + Sync + 'static {}

impl HaloValue for f64 {}
impl HaloValue for usize {}

pub trait GridComm {
    //! The collective operations needed by the grid and the residual engine
    //!
    //! Every method is collective: all processes have to call it in the same order.

    /// Rank of the current process
    fn rank(&self) -> usize;

    /// Number of processes
    fn size(&self) -> usize;

    /// Sum of `value` over all processes
    fn all_reduce_sum(&self, value: f64) -> f64;

    /// Minimum of `value` over all processes
    fn all_reduce_min(&self, value: f64) -> f64;

    /// Maximum of `value` over all processes
    fn all_reduce_max(&self, value: f64) -> f64;

    /// Sum of `value` over all processes with a lower rank (0 on rank 0)
    fn exclusive_scan_sum(&self, value: usize) -> usize;

    /// Sparse pairwise exchange
    ///
    /// `sends` lists destination ranks with the buffer for each of them. The return value
    /// contains the non-empty buffers sent to this process, tagged with the source rank.
    fn exchange<T: HaloValue>(&self, sends: &[(usize, Vec<T>)]) -> Vec<(usize, Vec<T>)>;

    /// Is this the root process?
    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}
