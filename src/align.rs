//! Forward Viterbi pass and backtrace.
//!
//! The driver builds one [`Site`] per input vertex, strictly in order
//! (site `i` needs site `i-1` complete), then walks the stored
//! backpointers from the last site to the first to recover the optimal
//! displaced sequence. Both endpoints are anchored: the first by
//! `calculate_as_first`, the last by starting the backtrace at local
//! `(0, 0)`.
//!
//! A total log-score of `-inf` means no valid alignment exists (every
//! path crosses fully bright cells); the output then degrades to the
//! anchors and callers should surface the condition instead of trusting
//! the sequence.

use crate::error::AlignError;
use crate::geometry::{LocalPoint, WorldPoint};
use crate::site::Site;
use crate::surface::CostSurface;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Knobs of one alignment run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignParams {
    /// Window radius: maximum vertex displacement in pixels.
    pub window_size: i32,
    /// Sigma of the Gaussian displacement penalty, in pixels.
    pub sigma: f64,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            window_size: 15,
            sigma: 10.0,
        }
    }
}

/// Aligned sequence plus everything needed for diagnostics.
#[derive(Clone, Debug)]
pub struct Alignment {
    /// Corrected vertex positions, same length as the input.
    pub points: Vec<WorldPoint>,
    /// Total log-score of the selected path.
    pub log_score: f64,
    /// Per-vertex DP tables, retained for debug visualization.
    pub sites: Vec<Site>,
}

/// Align `points` onto the dark cells of `surface`.
pub fn align(
    surface: &CostSurface,
    points: &[WorldPoint],
    params: &AlignParams,
) -> Result<Alignment, AlignError> {
    align_observed(surface, points, params, |_| {})
}

/// [`align`] with a per-vertex observer, called after each forward step
/// with the vertex index. The CLI feeds a progress bar through it.
pub fn align_observed(
    surface: &CostSurface,
    points: &[WorldPoint],
    params: &AlignParams,
    mut on_step: impl FnMut(usize),
) -> Result<Alignment, AlignError> {
    if points.len() < 2 {
        return Err(AlignError::TooFewVertices(points.len()));
    }
    if params.window_size < 0 {
        return Err(AlignError::InvalidParams(format!(
            "window size must be non-negative, got {}",
            params.window_size
        )));
    }
    if !params.sigma.is_finite() || params.sigma <= 0.0 {
        return Err(AlignError::InvalidParams(format!(
            "sigma must be positive and finite, got {}",
            params.sigma
        )));
    }
    for (index, p) in points.iter().enumerate() {
        if !surface.in_bounds(*p) {
            return Err(AlignError::VertexOutOfBounds {
                index,
                x: p.x,
                y: p.y,
                w: surface.w,
                h: surface.h,
            });
        }
    }

    debug!(
        "forward pass: {} vertices, window {}, sigma {}",
        points.len(),
        params.window_size,
        params.sigma
    );
    let mut sites: Vec<Site> = Vec::with_capacity(points.len());
    let mut first = Site::new(surface, points[0], params.window_size, params.sigma);
    first.calculate_as_first();
    sites.push(first);
    for (i, &p) in points.iter().enumerate().skip(1) {
        let mut site = Site::new(surface, p, params.window_size, params.sigma);
        site.calculate_from_previous(&sites[i - 1], surface);
        sites.push(site);
        on_step(i);
    }

    // Backtrace. The last vertex stays anchored, mirroring the first; a
    // variant that lets the tail move would maximize over the last window
    // here instead of fixing (0, 0).
    info!("tracing solution backwards");
    let mut best = LocalPoint::new(0, 0);
    let last = sites.len() - 1;
    let log_score = sites[last].get(best).value;
    let mut out = Vec::with_capacity(points.len());
    out.push(sites[last].translate_to_world(best));
    for i in (0..last).rev() {
        best = sites[i + 1].get(best).from;
        out.push(sites[i].translate_to_world(best));
    }
    out.reverse();

    if log_score == f64::NEG_INFINITY {
        warn!("no valid alignment: total log-score is -inf");
    }
    Ok(Alignment {
        points: out,
        log_score,
        sites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_surface(w: i32, h: i32, score: f64) -> CostSurface {
        CostSurface::from_scores(w, h, vec![score; (w * h) as usize])
    }

    #[test]
    fn rejects_short_inputs_and_bad_parameters() {
        let surface = uniform_surface(16, 16, 0.0);
        let one = vec![WorldPoint::new(2, 2)];
        assert!(matches!(
            align(&surface, &one, &AlignParams::default()),
            Err(AlignError::TooFewVertices(1))
        ));

        let two = vec![WorldPoint::new(2, 2), WorldPoint::new(10, 10)];
        let negative = AlignParams {
            window_size: -1,
            ..Default::default()
        };
        assert!(matches!(
            align(&surface, &two, &negative),
            Err(AlignError::InvalidParams(_))
        ));
        let zero_sigma = AlignParams {
            sigma: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            align(&surface, &two, &zero_sigma),
            Err(AlignError::InvalidParams(_))
        ));
    }

    #[test]
    fn rejects_vertices_outside_the_raster() {
        let surface = uniform_surface(16, 16, 0.0);
        let points = vec![WorldPoint::new(2, 2), WorldPoint::new(16, 2)];
        assert!(matches!(
            align(&surface, &points, &AlignParams::default()),
            Err(AlignError::VertexOutOfBounds { index: 1, .. })
        ));
    }

    #[test]
    fn radius_zero_returns_the_input_unchanged() {
        // deterministic non-uniform scores
        let mut surface = CostSurface::new(24, 24);
        for y in 0..24 {
            for x in 0..24 {
                surface.set(x, y, f64::from((x * 7 + y * 13) % 29) / 40.0);
            }
        }
        let points = vec![
            WorldPoint::new(2, 3),
            WorldPoint::new(9, 7),
            WorldPoint::new(15, 4),
            WorldPoint::new(21, 20),
        ];
        let params = AlignParams {
            window_size: 0,
            sigma: 10.0,
        };
        let result = align(&surface, &points, &params).unwrap();
        assert_eq!(result.points, points);
        for site in &result.sites {
            assert_eq!(site.get(LocalPoint::new(0, 0)).from, LocalPoint::new(0, 0));
        }
    }

    #[test]
    fn all_dark_surface_keeps_vertices_at_their_anchors() {
        // No transition penalty anywhere, so the position term alone
        // decides and the minimal displacement is zero.
        let surface = uniform_surface(40, 40, 0.0);
        let points = vec![
            WorldPoint::new(0, 0),
            WorldPoint::new(10, 0),
            WorldPoint::new(20, 0),
        ];
        let params = AlignParams {
            window_size: 2,
            sigma: 1000.0,
        };
        let result = align(&surface, &points, &params).unwrap();
        assert_eq!(result.points, points);
        assert_eq!(result.log_score, 0.0);
    }

    #[test]
    fn fully_bright_surface_reports_no_valid_alignment() {
        let surface = uniform_surface(32, 32, 1.0);
        let points = vec![
            WorldPoint::new(4, 4),
            WorldPoint::new(16, 16),
            WorldPoint::new(28, 28),
        ];
        let result = align(&surface, &points, &AlignParams::default()).unwrap();
        assert_eq!(result.log_score, f64::NEG_INFINITY);
        assert_eq!(result.points.len(), points.len());
        // endpoints are still the anchors
        assert_eq!(result.points[0], points[0]);
        assert_eq!(result.points[2], points[2]);
    }
}
