//! Staggered grid
mod axis;
mod dof;
mod layout;
pub mod local_array;
mod segments;
mod staggered;

pub use axis::AxisDiscretisation;
pub use dof::DofIndex;
pub use layout::PointLayout;
pub use local_array::LocalArray;
pub use segments::MeshSegments;
pub use staggered::StaggeredGrid;
