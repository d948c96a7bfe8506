//! Input vertex-sequence helpers: plain-text loading and resampling.

use crate::error::AlignError;
use crate::geometry::WorldPoint;
use log::warn;
use std::fs;
use std::path::Path;

/// Load whitespace-separated `x y` pairs, one vertex per line.
///
/// Blank lines are skipped; malformed lines are logged and ignored.
pub fn load_text(path: &Path) -> Result<Vec<WorldPoint>, AlignError> {
    let contents = fs::read_to_string(path).map_err(|e| AlignError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut points = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let x = tokens.next().and_then(|t| t.parse::<i32>().ok());
        let y = tokens.next().and_then(|t| t.parse::<i32>().ok());
        match (x, y) {
            (Some(x), Some(y)) => points.push(WorldPoint::new(x, y)),
            _ => warn!(
                "{}:{}: expected \"x y\" pair, got {:?}; ignoring",
                path.display(),
                lineno + 1,
                line
            ),
        }
    }
    Ok(points)
}

/// Keep every `stride`-th vertex, starting at vertex 0.
pub fn decimate(points: &[WorldPoint], stride: usize) -> Vec<WorldPoint> {
    if stride <= 1 {
        return points.to_vec();
    }
    points.iter().copied().step_by(stride).collect()
}

/// Insert `extra` evenly spaced vertices along every segment.
pub fn subdivide(points: &[WorldPoint], extra: usize) -> Vec<WorldPoint> {
    if extra == 0 || points.len() < 2 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len() + extra * (points.len() - 1));
    out.push(points[0]);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for k in 1..=extra {
            let t = k as f64 / (extra + 1) as f64;
            out.push(WorldPoint::new(
                (f64::from(a.x) + t * f64::from(b.x - a.x)) as i32,
                (f64::from(a.y) + t * f64::from(b.y - a.y)) as i32,
            ));
        }
        out.push(b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimate_keeps_every_nth_vertex() {
        let points: Vec<_> = (0..7).map(|i| WorldPoint::new(i, 0)).collect();
        let kept = decimate(&points, 2);
        assert_eq!(
            kept,
            vec![
                WorldPoint::new(0, 0),
                WorldPoint::new(2, 0),
                WorldPoint::new(4, 0),
                WorldPoint::new(6, 0)
            ]
        );
        assert_eq!(decimate(&points, 1), points);
    }

    #[test]
    fn subdivide_inserts_evenly_spaced_vertices() {
        let points = vec![WorldPoint::new(0, 0), WorldPoint::new(9, 0)];
        let dense = subdivide(&points, 2);
        assert_eq!(
            dense,
            vec![
                WorldPoint::new(0, 0),
                WorldPoint::new(3, 0),
                WorldPoint::new(6, 0),
                WorldPoint::new(9, 0)
            ]
        );
    }

    #[test]
    fn subdivide_zero_is_identity() {
        let points = vec![WorldPoint::new(1, 2), WorldPoint::new(5, 8)];
        assert_eq!(subdivide(&points, 0), points);
    }

    #[test]
    fn load_text_skips_malformed_lines() {
        let dir = std::env::temp_dir().join("raster-align-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("polyline.txt");
        std::fs::write(&path, "1 2\n\nnot a point\n3 4\n").unwrap();
        let points = load_text(&path).unwrap();
        assert_eq!(points, vec![WorldPoint::new(1, 2), WorldPoint::new(3, 4)]);
    }
}
