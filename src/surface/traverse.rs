//! Midpoint line traversal with a per-cell visitor.
//!
//! [`visit_line`] walks every raster cell on the discretized segment
//! between two world points and invokes a closure once per cell, in
//! strictly increasing order along the dominant axis, endpoints included.
//! The number of visited cells is `max(|dx|, |dy|) + 1` for every
//! orientation, including purely horizontal, vertical, and single-point
//! segments.
//!
//! The visitor is statically dispatched; the fixed call sites supply
//! averaging, painting, or stroke-drawing behavior on top of the same
//! walk.

use crate::geometry::WorldPoint;

/// Visit every cell on the segment from `a` to `b` exactly once.
pub fn visit_line<F: FnMut(i32, i32)>(a: WorldPoint, b: WorldPoint, mut visit: F) {
    if (b.y - a.y).abs() < (b.x - a.x).abs() {
        if a.x > b.x {
            shallow(b, a, &mut visit);
        } else {
            shallow(a, b, &mut visit);
        }
    } else if a.y > b.y {
        steep(b, a, &mut visit);
    } else {
        steep(a, b, &mut visit);
    }
}

/// `|dy| < dx`, `a.x <= b.x`: step x, let the error term advance y.
fn shallow<F: FnMut(i32, i32)>(a: WorldPoint, b: WorldPoint, visit: &mut F) {
    let dx = b.x - a.x;
    let mut dy = b.y - a.y;
    let mut yi = 1;
    if dy < 0 {
        yi = -1;
        dy = -dy;
    }
    let mut d = 2 * dy - dx;
    let mut y = a.y;
    for x in a.x..=b.x {
        visit(x, y);
        if d > 0 {
            y += yi;
            d -= 2 * dx;
        }
        d += 2 * dy;
    }
}

/// `|dx| <= dy`, `a.y <= b.y`: step y, let the error term advance x.
fn steep<F: FnMut(i32, i32)>(a: WorldPoint, b: WorldPoint, visit: &mut F) {
    let mut dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut xi = 1;
    if dx < 0 {
        xi = -1;
        dx = -dx;
    }
    let mut d = 2 * dx - dy;
    let mut x = a.x;
    for y in a.y..=b.y {
        visit(x, y);
        if d > 0 {
            x += xi;
            d -= 2 * dy;
        }
        d += 2 * dx;
    }
}
