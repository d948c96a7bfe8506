//! Raster I/O for cost surfaces.
//!
//! - [`load_surface`]: read a PNG or TIFF into a [`CostSurface`], scoring
//!   each pixel with normalized BT.709 luminance.
//! - [`save_surface`]: render the score grid to grayscale, rasterize the
//!   queued strokes over it, and write a PNG.

use super::traverse::visit_line;
use super::CostSurface;
use crate::error::AlignError;
use crate::geometry::WorldPoint;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Raster decode selection; `Auto` trusts content/extension sniffing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Auto,
    Png,
    Tiff,
}

// ITU BT.709: brightness = 0.2126 R + 0.7152 G + 0.0722 B, normalized.
const LUMA_R: f64 = 0.2126 / 255.0;
const LUMA_G: f64 = 0.7152 / 255.0;
const LUMA_B: f64 = 0.0722 / 255.0;

/// Decode an image file into a cost surface of [0, 1] luminance scores.
pub fn load_surface(path: &Path, format: RasterFormat) -> Result<CostSurface, AlignError> {
    let img = match format {
        RasterFormat::Auto => image::open(path).map_err(|e| AlignError::ImageLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?,
        RasterFormat::Png => decode_as(path, ImageFormat::Png)?,
        RasterFormat::Tiff => decode_as(path, ImageFormat::Tiff)?,
    };
    let rgba = img.into_rgba8();
    let w = rgba.width() as i32;
    let h = rgba.height() as i32;
    let mut scores = Vec::with_capacity((w * h) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, _] = pixel.0;
        scores.push(LUMA_R * f64::from(r) + LUMA_G * f64::from(g) + LUMA_B * f64::from(b));
    }
    Ok(CostSurface::from_scores(w, h, scores))
}

fn decode_as(path: &Path, format: ImageFormat) -> Result<DynamicImage, AlignError> {
    let mut reader = ImageReader::open(path).map_err(|e| AlignError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    reader.set_format(format);
    reader.decode().map_err(|e| AlignError::ImageLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Render the surface and its strokes to an RGBA image.
pub fn render_surface(surface: &CostSurface) -> RgbaImage {
    let mut out = RgbaImage::new(surface.w as u32, surface.h as u32);
    for y in 0..surface.h {
        for x in 0..surface.w {
            let v = (surface.get(x, y) * 255.0).clamp(0.0, 255.0) as u8;
            out.put_pixel(x as u32, y as u32, Rgba([v, v, v, 255]));
        }
    }
    for stroke in &surface.strokes {
        let [r, g, b] = stroke.color;
        visit_line(stroke.seg.a, stroke.seg.b, |x, y| {
            if surface.in_bounds(WorldPoint::new(x, y)) {
                out.put_pixel(x as u32, y as u32, Rgba([r, g, b, 255]));
            }
        });
    }
    out
}

/// Render and write the surface as a PNG.
pub fn save_surface(surface: &CostSurface, path: &Path) -> Result<(), AlignError> {
    ensure_parent_dir(path)?;
    render_surface(surface)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AlignError::ImageSave {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AlignError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AlignError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Segment;
    use crate::surface::Stroke;

    #[test]
    fn render_maps_scores_to_gray_levels() {
        let mut surface = CostSurface::new(4, 4);
        surface.set(1, 2, 1.0);
        surface.set(3, 3, 0.5);
        let img = render_surface(&surface);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 2).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(3, 3).0[0], 127);
    }

    #[test]
    fn render_draws_strokes_over_the_gray_base() {
        let mut surface = CostSurface::new(8, 8);
        surface.strokes.push(Stroke {
            seg: Segment::new(WorldPoint::new(0, 4), WorldPoint::new(7, 4)),
            color: [255, 0, 0],
        });
        let img = render_surface(&surface);
        for x in 0..8 {
            assert_eq!(img.get_pixel(x, 4).0, [255, 0, 0, 255]);
        }
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}
