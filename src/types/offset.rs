//! Offsets between neighbouring processes

/// Offset of a neighbouring process in the 3D process grid
///
/// Each component is -1, 0 or 1. The 27 offsets (including the zero offset of the
/// process itself) are ordered with `di` fastest, then `dj`, then `dk`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct NeighbourOffset {
    /// Offset along x
    pub di: i8,
    /// Offset along y
    pub dj: i8,
    /// Offset along z
    pub dk: i8,
}

impl NeighbourOffset {
    /// The process itself
    pub const SELF: NeighbourOffset = NeighbourOffset {
        di: 0,
        dj: 0,
        dk: 0,
    };

    /// Create an offset; panics if a component is outside -1..=1
    pub fn new(di: i8, dj: i8, dk: i8) -> Self {
        assert!(
            (-1..=1).contains(&di) && (-1..=1).contains(&dj) && (-1..=1).contains(&dk),
            "Invalid neighbour offset ({di}, {dj}, {dk})"
        );
        Self { di, dj, dk }
    }

    /// Iterate over all 27 offsets
    pub fn all() -> impl Iterator<Item = NeighbourOffset> {
        (-1..=1).flat_map(|dk| {
            (-1..=1).flat_map(move |dj| (-1..=1).map(move |di| NeighbourOffset { di, dj, dk }))
        })
    }

    /// Iterate over the 26 offsets of actual neighbours
    pub fn neighbours() -> impl Iterator<Item = NeighbourOffset> {
        Self::all().filter(|o| *o != Self::SELF)
    }

    /// Position in the 27-entry table
    pub fn index(&self) -> usize {
        ((self.di + 1) + 3 * (self.dj + 1) + 9 * (self.dk + 1)) as usize
    }

    /// The offset seen from the neighbour
    pub fn opposite(&self) -> Self {
        Self {
            di: -self.di,
            dj: -self.dj,
            dk: -self.dk,
        }
    }

    /// Components as an array
    pub fn components(&self) -> [i8; 3] {
        [self.di, self.dj, self.dk]
    }
}
