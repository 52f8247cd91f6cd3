//! Two-point constraints

/// Rule used to synthesise a ghost value at a physical domain boundary
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub enum GhostConstraint {
    /// Zero normal gradient: the ghost copies the adjacent interior value
    #[default]
    Free,
    /// The value is prescribed on the boundary halfway between ghost and interior point
    Boundary(f64),
    /// The ghost value itself is prescribed
    Ghost(f64),
}

impl GhostConstraint {
    /// Ghost value given the adjacent interior value
    pub fn ghost_value(&self, interior: f64) -> f64 {
        match *self {
            GhostConstraint::Free => interior,
            GhostConstraint::Boundary(value) => 2.0 * value - interior,
            GhostConstraint::Ghost(value) => value,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ghost_values() {
        assert_eq!(GhostConstraint::Free.ghost_value(3.0), 3.0);
        assert_eq!(GhostConstraint::Boundary(1.0).ghost_value(3.0), -1.0);
        assert_eq!(GhostConstraint::Ghost(7.0).ghost_value(3.0), 7.0);
    }
}
