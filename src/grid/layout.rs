//! Staggered point layouts
use crate::types::Axis;

/// Placement of a family of staggered variables
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PointLayout {
    /// Cell centres (pressure, temperature, normal strain rates)
    Cells,
    /// Cell corners
    Corners,
    /// Edges parallel to z (xy shear)
    XYEdges,
    /// Edges parallel to y (xz shear)
    XZEdges,
    /// Edges parallel to x (yz shear)
    YZEdges,
    /// Faces normal to x (x velocity)
    XFaces,
    /// Faces normal to y (y velocity)
    YFaces,
    /// Faces normal to z (z velocity)
    ZFaces,
}

impl PointLayout {
    /// All layouts
    pub const ALL: [PointLayout; 8] = [
        PointLayout::Cells,
        PointLayout::Corners,
        PointLayout::XYEdges,
        PointLayout::XZEdges,
        PointLayout::YZEdges,
        PointLayout::XFaces,
        PointLayout::YFaces,
        PointLayout::ZFaces,
    ];

    /// For each axis, are the points at nodes (rather than at cell centres)?
    pub fn nodal(&self) -> [bool; 3] {
        match self {
            PointLayout::Cells => [false, false, false],
            PointLayout::Corners => [true, true, true],
            PointLayout::XYEdges => [true, true, false],
            PointLayout::XZEdges => [true, false, true],
            PointLayout::YZEdges => [false, true, true],
            PointLayout::XFaces => [true, false, false],
            PointLayout::YFaces => [false, true, false],
            PointLayout::ZFaces => [false, false, true],
        }
    }

    /// Faces normal to an axis
    pub fn face(axis: Axis) -> Self {
        match axis {
            Axis::X => PointLayout::XFaces,
            Axis::Y => PointLayout::YFaces,
            Axis::Z => PointLayout::ZFaces,
        }
    }

    /// Name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            PointLayout::Cells => "cells",
            PointLayout::Corners => "corners",
            PointLayout::XYEdges => "xy-edges",
            PointLayout::XZEdges => "xz-edges",
            PointLayout::YZEdges => "yz-edges",
            PointLayout::XFaces => "x-faces",
            PointLayout::YFaces => "y-faces",
            PointLayout::ZFaces => "z-faces",
        }
    }
}
