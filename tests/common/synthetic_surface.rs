use raster_align::CostSurface;

/// Surface with the same score everywhere.
pub fn uniform(w: i32, h: i32, score: f64) -> CostSurface {
    CostSurface::from_scores(w, h, vec![score; (w * h) as usize])
}

/// Bright-ish background with one fully dark horizontal row.
pub fn dark_row(w: i32, h: i32, background: f64, row: i32) -> CostSurface {
    let mut surface = uniform(w, h, background);
    for x in 0..w {
        surface.set(x, row, 0.0);
    }
    surface
}

/// Deterministic pseudo-random scores in [0, 0.9].
pub fn speckle(w: i32, h: i32) -> CostSurface {
    let mut surface = CostSurface::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = f64::from((x * 7 + y * 13 + x * y) % 31) / 31.0 * 0.9;
            surface.set(x, y, v);
        }
    }
    surface
}
