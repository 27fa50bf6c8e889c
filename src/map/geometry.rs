use glam::DVec2;

use crate::surface::LineStyle;

/// Walk a line using Bresenham's algorithm, calling `plot` for every pixel
pub fn walk_line(x0: i32, y0: i32, x1: i32, y1: i32, mut plot: impl FnMut(i32, i32)) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        plot(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Which dots of a line are inked, counted along the whole polyline
#[derive(Clone, Copy, Debug)]
pub struct DotPattern {
    style: LineStyle,
    step: usize,
}

impl DotPattern {
    pub fn new(style: LineStyle) -> Self {
        Self { style, step: 0 }
    }

    /// Advance one dot; true if it should be drawn
    pub fn next(&mut self) -> bool {
        let step = self.step;
        self.step += 1;
        match self.style {
            LineStyle::Solid => true,
            LineStyle::Dotted => step % 3 == 0,
            LineStyle::Dashed => step % 6 < 4,
        }
    }
}

/// Even-odd scanline fill of a polygon over a `width` x `height` grid of
/// unit cells; a cell is filled when its centre is inside
pub fn scanline_fill(points: &[DVec2], width: usize, height: usize, mut plot: impl FnMut(usize, usize)) {
    if points.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let (lo, hi) = points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    if !lo.is_finite() || !hi.is_finite() {
        return;
    }

    let row_start = (lo.y - 0.5).ceil().max(0.0) as usize;
    let row_end = ((hi.y - 0.5).floor() + 1.0).clamp(0.0, height as f64) as usize;
    let mut crossings = Vec::new();

    for row in row_start..row_end {
        let y = row as f64 + 0.5;
        crossings.clear();

        let mut j = points.len() - 1;
        for i in 0..points.len() {
            let (a, b) = (points[i], points[j]);
            if (a.y > y) != (b.y > y) {
                crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
            }
            j = i;
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            // Cells whose centre c + 0.5 lies in [x0, x1)
            let first = (pair[0] - 0.5).ceil().max(0.0);
            let last = ((pair[1] - 0.5).ceil()).min(width as f64);
            let mut col = first;
            while col < last {
                plot(col as usize, row);
                col += 1.0;
            }
        }
    }
}
