//! Coordinate-space tagged geometry primitives.
//!
//! Two integer point types with the same shape that are deliberately not
//! interchangeable: [`WorldPoint`] lives in raster pixel coordinates
//! (top-left origin, x right, y down), [`LocalPoint`] is an offset relative
//! to a site's anchor vertex, where `(0, 0)` means "no displacement". The
//! only bridge between the two spaces is `Site::translate_to_world`; any
//! other mixing is a type error.

/// Integer pixel position in the full raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
}

impl WorldPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer offset relative to a site's anchor vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalPoint {
    pub x: i32,
    pub y: i32,
}

impl LocalPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Ordered pair of world points; the unit the line traversal renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub a: WorldPoint,
    pub b: WorldPoint,
}

impl Segment {
    pub fn new(a: WorldPoint, b: WorldPoint) -> Self {
        Self { a, b }
    }
}
