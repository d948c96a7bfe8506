//! Dense raster cost surface.
//!
//! [`CostSurface`] owns a row-major `f64` score grid with values in
//! `[0, 1]` (1.0 = brightest, 0.0 = darkest = most attractive to the
//! alignment) plus an append-only buffer of colored strokes. Strokes are
//! rasterized only when the surface is rendered (`surface::io`); scoring
//! never reads them.
//!
//! The score grid is populated once at construction and mutated only by
//! explicit paint operations; the alignment core treats it as read-only.

pub mod io;
pub mod traverse;

use crate::geometry::{Segment, WorldPoint};
use traverse::visit_line;

/// A segment queued for rendering in a solid RGB color.
#[derive(Clone, Copy, Debug)]
pub struct Stroke {
    pub seg: Segment,
    pub color: [u8; 3],
}

/// Width × height grid of pixel scores plus pending visualization strokes.
#[derive(Clone, Debug)]
pub struct CostSurface {
    pub w: i32,
    pub h: i32,
    data: Vec<f64>,
    pub strokes: Vec<Stroke>,
}

impl CostSurface {
    /// Zero-score (all-dark) surface of size `w × h`.
    pub fn new(w: i32, h: i32) -> Self {
        assert!(w > 0 && h > 0, "surface dimensions must be positive");
        Self {
            w,
            h,
            data: vec![0.0; (w * h) as usize],
            strokes: Vec::new(),
        }
    }

    /// Wrap an existing row-major score buffer.
    pub fn from_scores(w: i32, h: i32, data: Vec<f64>) -> Self {
        assert!(w > 0 && h > 0, "surface dimensions must be positive");
        assert_eq!(data.len(), (w * h) as usize, "score buffer size mismatch");
        Self {
            w,
            h,
            data,
            strokes: Vec::new(),
        }
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.w + x) as usize
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f64 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, v: f64) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn in_bounds(&self, p: WorldPoint) -> bool {
        p.x >= 0 && p.x < self.w && p.y >= 0 && p.y < self.h
    }

    /// Mean score over the cells on the segment from `a` to `b`.
    ///
    /// The traversal always visits at least one cell, so the mean is
    /// defined even for `a == b` (it reduces to that pixel's score).
    pub fn segment_average(&self, a: WorldPoint, b: WorldPoint) -> f64 {
        let mut sum = 0.0;
        let mut count = 0u32;
        visit_line(a, b, |x, y| {
            sum += self.get(x, y);
            count += 1;
        });
        sum / f64::from(count)
    }

    /// Overwrite every cell on the segment with a constant score.
    pub fn paint_segment(&mut self, a: WorldPoint, b: WorldPoint, value: f64) {
        visit_line(a, b, |x, y| {
            let i = self.idx(x, y);
            self.data[i] = value;
        });
    }

    /// Queue a polyline for rendering. Strokes are drawn on save only.
    pub fn add_polyline(&mut self, polyline: &[WorldPoint], color: [u8; 3]) {
        for pair in polyline.windows(2) {
            self.strokes.push(Stroke {
                seg: Segment::new(pair[0], pair[1]),
                color,
            });
        }
    }

    /// Mirror the grid top-to-bottom in place.
    pub fn flip_y(&mut self) {
        let w = self.w as usize;
        for y in 0..(self.h as usize) / 2 {
            let opposite = self.h as usize - 1 - y;
            for x in 0..w {
                self.data.swap(y * w + x, opposite * w + x);
            }
        }
    }
}
