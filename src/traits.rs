//! Traits

mod comm;
mod constitutive;
mod io;

pub use comm::{GridComm, HaloValue};
pub use constitutive::{
    BulkResponse, ConstitutiveLaw, DeviatoricInput, DeviatoricResponse, VolumetricInput,
};
pub use io::PartitionExport;
#[cfg(feature = "serde")]
pub use io::RONImport;
