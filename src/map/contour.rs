//! Marching squares over a row-major grid.
//!
//! Segment endpoints are fractional grid indices `(i, j)`: column then row.

use glam::DVec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
}

/// Iso-line segments of `data` at `level`. Cells touching NaN are skipped.
pub fn march_squares(data: &[f64], width: usize, height: usize, level: f64) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            let corners = Corners { tl, tr, br, bl };
            cell_segments(cell_index, x as f64, y as f64, &corners, level, &mut segments);
        }
    }
    segments
}

struct Corners {
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
}

fn cell_segments(
    cell_index: u8,
    x: f64,
    y: f64,
    c: &Corners,
    level: f64,
    out: &mut Vec<Segment>,
) {
    let top = || interpolate_edge(DVec2::new(x, y), DVec2::new(x + 1.0, y), c.tl, c.tr, level);
    let right = || {
        interpolate_edge(DVec2::new(x + 1.0, y), DVec2::new(x + 1.0, y + 1.0), c.tr, c.br, level)
    };
    let bottom = || {
        interpolate_edge(DVec2::new(x, y + 1.0), DVec2::new(x + 1.0, y + 1.0), c.bl, c.br, level)
    };
    let left = || interpolate_edge(DVec2::new(x, y), DVec2::new(x, y + 1.0), c.tl, c.bl, level);
    let mut seg = |start: DVec2, end: DVec2| out.push(Segment { start, end });

    match cell_index {
        1 | 14 => seg(left(), top()),
        2 | 13 => seg(top(), right()),
        3 | 12 => seg(left(), right()),
        4 | 11 => seg(right(), bottom()),
        // Saddles
        5 => {
            seg(left(), top());
            seg(right(), bottom());
        }
        10 => {
            seg(top(), right());
            seg(left(), bottom());
        }
        6 | 9 => seg(top(), bottom()),
        7 | 8 => seg(left(), bottom()),
        _ => {}
    }
}

fn interpolate_edge(p1: DVec2, p2: DVec2, v1: f64, v2: f64, level: f64) -> DVec2 {
    if (v2 - v1).abs() < 1e-12 {
        return (p1 + p2) * 0.5;
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    p1 + (p2 - p1) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flat_field_has_no_segments() {
        assert!(march_squares(&[1.0; 9], 3, 3, 0.5).is_empty());
        assert!(march_squares(&[1.0; 9], 3, 3, 1.5).is_empty());
    }

    #[test]
    fn test_vertical_isoline() {
        // Values rise with the column index
        let data = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let segs = march_squares(&data, 3, 2, 1.5);
        assert_eq!(segs.len(), 1);
        assert_abs_diff_eq!(segs[0].start.x, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(segs[0].end.x, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!((segs[0].start.y - segs[0].end.y).abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_cells_skipped() {
        let data = [0.0, 2.0, f64::NAN, 0.0, 2.0, 2.0];
        let segs = march_squares(&data, 3, 2, 1.0);
        assert_eq!(segs.len(), 1);
        assert!(segs[0].start.x <= 1.0);
    }

    #[test]
    fn test_saddle_gives_two_segments() {
        let data = [1.0, 0.0, 0.0, 1.0];
        assert_eq!(march_squares(&data, 2, 2, 0.5).len(), 2);
    }

    #[test]
    fn test_bad_shape() {
        assert!(march_squares(&[0.0, 1.0, 2.0], 2, 2, 0.5).is_empty());
    }
}
