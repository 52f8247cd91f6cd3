//! I/O
mod partition;
#[cfg(feature = "serde")]
mod ron;

pub use partition::PartitionInfo;
