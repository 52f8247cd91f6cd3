//! Ownership of degrees of freedom

/// Global degree-of-freedom id stored at a local or ghost point
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DofId {
    /// Owned by the current process
    Owned(usize),
    /// Ghost on the current process. The value is the global id assigned by the owning process
    Ghost(usize),
    /// Physical boundary ghost without a degree of freedom
    #[default]
    Unassigned,
}

impl DofId {
    /// The global id, if the point carries a degree of freedom
    pub fn global(&self) -> Option<usize> {
        match *self {
            DofId::Owned(id) | DofId::Ghost(id) => Some(id),
            DofId::Unassigned => None,
        }
    }

    /// Is this point owned by the current process?
    pub fn is_owned(&self) -> bool {
        matches!(self, DofId::Owned(_))
    }
}
