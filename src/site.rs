//! Per-vertex dynamic-programming cell.
//!
//! A [`Site`] owns the square window of candidate displaced positions for
//! one input vertex. The nominal `[-size, size]²` window is clipped to the
//! raster at construction (`xmin..=xmax × ymin..=ymax`); cells outside the
//! clipped bounds are never read or written by the recursion. Each cell
//! stores the best cumulative log-score reaching it and a backpointer into
//! the previous site's window.
//!
//! Two scoring terms feed the recursion:
//!
//! - `position_score`: `-d²/σ²`, the log of an unnormalized isotropic
//!   Gaussian penalizing displacement from the anchor.
//! - `transition_score`: `ln(1 − segment_average)`, the data term coupling
//!   consecutive candidates. It is 0 over a pure-dark segment and `-inf`
//!   over a pure-bright one.
//!
//! Filling a site from its predecessor scans every pair of candidate
//! positions, `O(|window|²)` per vertex pair; this is the dominant cost of
//! the whole alignment.

use crate::geometry::{LocalPoint, WorldPoint};
use crate::surface::CostSurface;

/// One candidate cell: cumulative log-score plus the previous site's local
/// position that achieved it.
#[derive(Clone, Copy, Debug)]
pub struct State {
    pub value: f64,
    pub from: LocalPoint,
}

impl Default for State {
    /// Unreachable until the recursion writes it.
    fn default() -> Self {
        Self {
            value: f64::NEG_INFINITY,
            from: LocalPoint::new(0, 0),
        }
    }
}

/// Clipped candidate window for one input vertex.
#[derive(Clone, Debug)]
pub struct Site {
    /// Original, undisplaced vertex position; origin of local space.
    pub anchor: WorldPoint,
    /// Nominal window radius.
    pub size: i32,
    /// Displacement tolerance of the position term.
    pub sigma: f64,
    /// Valid local x range after clipping to the raster.
    pub xmin: i32,
    pub xmax: i32,
    /// Valid local y range after clipping to the raster.
    pub ymin: i32,
    pub ymax: i32,
    state: Vec<State>,
}

impl Site {
    /// Window around `anchor`, clipped to the raster bounds of `surface`.
    ///
    /// For an in-raster anchor the valid window is never empty: it always
    /// contains at least the anchor itself.
    pub fn new(surface: &CostSurface, anchor: WorldPoint, size: i32, sigma: f64) -> Self {
        let dim = (2 * size + 1) as usize;
        Self {
            anchor,
            size,
            sigma,
            xmin: (-size).max(-anchor.x),
            xmax: size.min(surface.w - 1 - anchor.x),
            ymin: (-size).max(-anchor.y),
            ymax: size.min(surface.h - 1 - anchor.y),
            state: vec![State::default(); dim * dim],
        }
    }

    #[inline]
    fn index(&self, lp: LocalPoint) -> usize {
        ((lp.y + self.size) * (2 * self.size + 1) + lp.x + self.size) as usize
    }

    /// State of the candidate at local offset `lp`.
    #[inline]
    pub fn get(&self, lp: LocalPoint) -> State {
        self.state[self.index(lp)]
    }

    /// Log-domain Gaussian displacement penalty, `-d²/σ²`.
    ///
    /// Maximal (0) at `(0, 0)` and strictly decreasing with distance; the
    /// normalization constant is omitted since only relative scores
    /// matter.
    pub fn position_score(&self, lp: LocalPoint) -> f64 {
        let d2 = f64::from(lp.x * lp.x + lp.y * lp.y);
        -d2 / (self.sigma * self.sigma)
    }

    /// Data term for a candidate transition: `ln(1 − avg brightness)`.
    pub fn transition_score(surface: &CostSurface, a: WorldPoint, b: WorldPoint) -> f64 {
        (1.0 - surface.segment_average(a, b)).ln()
    }

    /// Anchor the first vertex: every cell stays unreachable except
    /// `(0, 0)`, which starts the path with score 0.
    pub fn calculate_as_first(&mut self) {
        let origin = self.index(LocalPoint::new(0, 0));
        self.state[origin] = State {
            value: 0.0,
            from: LocalPoint::new(0, 0),
        };
    }

    /// The Viterbi step: for every candidate in this window, maximize
    /// `position_score + prev.value + transition_score` over the previous
    /// window and record the winner as the backpointer.
    ///
    /// Comparison is strict and the previous window is scanned in a fixed
    /// order (x outer, y inner), so equal scores resolve to the first
    /// candidate scanned.
    pub fn calculate_from_previous(&mut self, prev: &Site, surface: &CostSurface) {
        for y in self.ymin..=self.ymax {
            for x in self.xmin..=self.xmax {
                let lp = LocalPoint::new(x, y);
                let here = self.translate_to_world(lp);
                let position = self.position_score(lp);
                let mut best = State::default();
                for prev_x in prev.xmin..=prev.xmax {
                    for prev_y in prev.ymin..=prev.ymax {
                        let prev_lp = LocalPoint::new(prev_x, prev_y);
                        let score = position
                            + prev.get(prev_lp).value
                            + Self::transition_score(surface, here, prev.translate_to_world(prev_lp));
                        if score > best.value {
                            best = State {
                                value: score,
                                from: prev_lp,
                            };
                        }
                    }
                }
                let i = self.index(lp);
                self.state[i] = best;
            }
        }
    }

    /// Highest-value candidate in the valid window (diagnostics only; the
    /// production backtrace fixes the terminal state at `(0, 0)`).
    pub fn find_best(&self) -> LocalPoint {
        let mut best_value = f64::NEG_INFINITY;
        let mut best = LocalPoint::new(0, 0);
        for y in self.ymin..=self.ymax {
            for x in self.xmin..=self.xmax {
                let lp = LocalPoint::new(x, y);
                if self.get(lp).value > best_value {
                    best_value = self.get(lp).value;
                    best = lp;
                }
            }
        }
        best
    }

    /// The single bridge between local and world space.
    pub fn translate_to_world(&self, local: LocalPoint) -> WorldPoint {
        WorldPoint::new(self.anchor.x + local.x, self.anchor.y + local.y)
    }
}
