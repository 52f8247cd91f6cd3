//! Types

mod axis;
mod constraint;
mod index_mode;
mod offset;
mod ownership;

pub use axis::Axis;
pub use constraint::GhostConstraint;
pub use index_mode::IndexMode;
pub use offset::NeighbourOffset;
pub use ownership::DofId;
