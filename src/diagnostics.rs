//! Run statistics and likelihood visualization.
//!
//! The heat map renders each site's DP table as normalized per-pixel
//! likelihood `exp(value − max)`: the best candidate of every window shows
//! white, hopeless candidates fade to black. Windows later in the
//! sequence overwrite earlier ones where they overlap.

use crate::align::Alignment;
use crate::error::AlignError;
use crate::geometry::LocalPoint;
use crate::surface::io::ensure_parent_dir;
use crate::surface::CostSurface;
use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::path::Path;

/// Timing and score summary of one alignment run.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct AlignStats {
    /// Wall-clock seconds for the whole run.
    pub time_total: f64,
    /// Seconds per forward-pass step.
    pub time_per_point: f64,
    /// Total log-score of the selected path.
    pub log_score: f64,
}

/// Render the per-vertex likelihood tables over a transparent canvas the
/// size of `surface`.
pub fn render_likelihood(alignment: &Alignment, surface: &CostSurface) -> RgbaImage {
    let mut img = RgbaImage::new(surface.w as u32, surface.h as u32);
    for site in &alignment.sites {
        let mut max_value = f64::NEG_INFINITY;
        for y in site.ymin..=site.ymax {
            for x in site.xmin..=site.xmax {
                max_value = max_value.max(site.get(LocalPoint::new(x, y)).value);
            }
        }
        if max_value == f64::NEG_INFINITY {
            // fully unreachable window, nothing to normalize against
            continue;
        }
        for y in site.ymin..=site.ymax {
            for x in site.xmin..=site.xmax {
                let lp = LocalPoint::new(x, y);
                let world = site.translate_to_world(lp);
                let v = (255.0 * (site.get(lp).value - max_value).exp()) as u8;
                img.put_pixel(world.x as u32, world.y as u32, Rgba([v, v, v, 255]));
            }
        }
    }
    img
}

/// Render and write the likelihood heat map as a PNG.
pub fn save_likelihood(
    alignment: &Alignment,
    surface: &CostSurface,
    path: &Path,
) -> Result<(), AlignError> {
    ensure_parent_dir(path)?;
    render_likelihood(alignment, surface)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AlignError::ImageSave {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{align, AlignParams};
    use crate::geometry::WorldPoint;

    #[test]
    fn best_candidates_render_white_and_clipped_windows_stay_inside() {
        let surface = CostSurface::from_scores(20, 20, vec![0.0; 400]);
        let points = vec![
            WorldPoint::new(0, 0), // window clipped at the corner
            WorldPoint::new(10, 10),
            WorldPoint::new(19, 19),
        ];
        let params = AlignParams {
            window_size: 2,
            sigma: 5.0,
        };
        let result = align(&surface, &points, &params).unwrap();
        let img = render_likelihood(&result, &surface);

        // the anchored first vertex is the only reachable state there
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        // the middle window's best candidate is the undisplaced anchor
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
        // pixels never covered by a window keep zero alpha
        assert_eq!(img.get_pixel(5, 15).0[3], 0);
    }
}
