use glam::DVec2;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::geo::{format_lat, format_lon};
use crate::map::boundary::linspace;
use crate::map::frame::MapFrame;
use crate::map::projection::ProjectedPoint;
use crate::map::ticks::TickPlanner;

/// Default points per graticule line
pub const DEFAULT_LINE_SAMPLES: usize = 100;

/// Label separation as a fraction of the frame's larger extent
const LABEL_SEP_FRACTION: f64 = 0.01;

/// Tick mark length relative to the label separation
const TICK_LEN_FRACTION: f64 = 2.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Text placed at an anchor, rotated about the anchor (degrees, counterclockwise)
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub anchor: ProjectedPoint,
    pub rotation: f64,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraticuleKind {
    Parallel,
    Meridian,
}

/// One parallel or meridian with its label and frame tick mark
#[derive(Clone, Debug, PartialEq)]
pub struct GraticuleLine {
    pub kind: GraticuleKind,
    pub value: f64,
    pub points: Vec<ProjectedPoint>,
    pub label: Label,
    /// From the frame edge outwards
    pub tick: [ProjectedPoint; 2],
}

/// Sampling and spacing options. `None` distances scale with the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraticuleConfig {
    pub samples: usize,
    pub label_sep: Option<f64>,
    pub tick_len: Option<f64>,
}

impl Default for GraticuleConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_LINE_SAMPLES,
            label_sep: None,
            tick_len: None,
        }
    }
}

/// Builds projected parallels and meridians for a frame
pub struct GraticuleRenderer<'a> {
    frame: &'a MapFrame,
    samples: usize,
    label_sep: f64,
    tick_len: f64,
}

impl<'a> GraticuleRenderer<'a> {
    pub fn new(frame: &'a MapFrame, config: GraticuleConfig) -> Result<Self> {
        if config.samples < 2 {
            return Err(MapError::config(format!(
                "graticule lines need at least 2 samples, got {}",
                config.samples
            )));
        }

        let label_sep = config
            .label_sep
            .unwrap_or_else(|| LABEL_SEP_FRACTION * frame.boundary().extent());
        let tick_len = config.tick_len.unwrap_or(TICK_LEN_FRACTION * label_sep);
        if !(label_sep.is_finite() && label_sep >= 0.0 && tick_len.is_finite() && tick_len >= 0.0) {
            return Err(MapError::config(
                "label separation and tick length must be finite and non-negative",
            ));
        }

        Ok(Self {
            frame,
            samples: config.samples,
            label_sep,
            tick_len,
        })
    }

    pub fn label_sep(&self) -> f64 {
        self.label_sep
    }

    /// Round latitudes inside the window
    pub fn default_parallels(&self) -> Vec<f64> {
        let w = self.frame.window();
        TickPlanner::default().plan(w.lat_min, w.lat_max)
    }

    /// Round longitudes inside the window
    pub fn default_meridians(&self) -> Vec<f64> {
        let w = self.frame.window();
        TickPlanner::default().plan(w.lon_min, w.lon_max)
    }

    /// Lines of constant latitude, labelled on the western edge
    pub fn parallels(&self, lats: &[f64]) -> Result<Vec<GraticuleLine>> {
        let window = self.frame.window();
        let projection = self.frame.projection();
        let lons: Vec<f64> = linspace(window.lon_min, window.lon_max, self.samples).collect();

        let lines = lats
            .iter()
            .map(|&lat| {
                let points = projection.forward_many(&lons, &vec![lat; lons.len()])?;

                // Step back along the parallel, away from the frame
                let edge = projection.forward(window.lon_min, lat)?;
                let t = projection.lon_tangent(window.lon_min, lat);
                let label = Label {
                    anchor: edge - self.label_sep * t,
                    rotation: angle_deg(t),
                    h_align: HAlign::Right,
                    v_align: VAlign::Center,
                    text: format_lat(lat),
                };

                Ok(GraticuleLine {
                    kind: GraticuleKind::Parallel,
                    value: lat,
                    points,
                    label,
                    tick: [edge, edge - self.tick_len * t],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = lines.len(), "built parallels");
        Ok(lines)
    }

    /// Lines of constant longitude, labelled on the southern edge
    pub fn meridians(&self, lons: &[f64]) -> Result<Vec<GraticuleLine>> {
        let window = self.frame.window();
        let projection = self.frame.projection();
        let lats: Vec<f64> = linspace(window.lat_min, window.lat_max, self.samples).collect();

        let lines = lons
            .iter()
            .map(|&lon| {
                let points = projection.forward_many(&vec![lon; lats.len()], &lats)?;

                // Outward normal of the southern edge: tangent turned clockwise
                let edge = projection.forward(lon, window.lat_min)?;
                let t = projection.lon_tangent(lon, window.lat_min);
                let n = DVec2::new(t.y, -t.x);
                let label = Label {
                    anchor: edge + self.label_sep * n,
                    rotation: angle_deg(t),
                    h_align: HAlign::Center,
                    v_align: VAlign::Top,
                    text: format_lon(lon),
                };

                Ok(GraticuleLine {
                    kind: GraticuleKind::Meridian,
                    value: lon,
                    points,
                    label,
                    tick: [edge, edge + self.tick_len * n],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = lines.len(), "built meridians");
        Ok(lines)
    }
}

fn angle_deg(v: DVec2) -> f64 {
    v.y.atan2(v.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeographicWindow;
    use crate::map::projection::ProjectionParameters;
    use approx::assert_abs_diff_eq;

    fn polar_frame() -> MapFrame {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        MapFrame::new(window, ProjectionParameters::polar(None)).unwrap()
    }

    fn mercator_frame() -> MapFrame {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        MapFrame::new(window, ProjectionParameters::mercator()).unwrap()
    }

    #[test]
    fn test_default_values_follow_window() {
        let frame = polar_frame();
        let g = GraticuleRenderer::new(&frame, GraticuleConfig::default()).unwrap();
        assert_eq!(g.default_parallels(), vec![55.0, 60.0, 65.0, 70.0]);
        assert_eq!(g.default_meridians(), vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_parallel_geometry() {
        let frame = polar_frame();
        let g = GraticuleRenderer::new(&frame, GraticuleConfig::default()).unwrap();
        let lines = g.parallels(&[60.0]).unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.kind, GraticuleKind::Parallel);
        assert_eq!(line.points.len(), DEFAULT_LINE_SAMPLES);
        assert_eq!(line.points[0], frame.project(-10.0, 60.0).unwrap());
        assert_eq!(*line.points.last().unwrap(), frame.project(30.0, 60.0).unwrap());
    }

    #[test]
    fn test_polar_parallel_label() {
        let frame = polar_frame();
        let g = GraticuleRenderer::new(
            &frame,
            GraticuleConfig {
                label_sep: Some(0.003),
                ..GraticuleConfig::default()
            },
        )
        .unwrap();
        let label = &g.parallels(&[65.0]).unwrap()[0].label;

        // All parallel labels share the angle lon_min - vlon
        let angle = -20.0_f64;
        assert_abs_diff_eq!(label.rotation, angle, epsilon = 1e-9);
        let edge = frame.project(-10.0, 65.0).unwrap();
        let (sin, cos) = angle.to_radians().sin_cos();
        assert_abs_diff_eq!(label.anchor.x, edge.x - 0.003 * cos, epsilon = 1e-12);
        assert_abs_diff_eq!(label.anchor.y, edge.y - 0.003 * sin, epsilon = 1e-12);
        assert_eq!(label.h_align, HAlign::Right);
        assert_eq!(label.v_align, VAlign::Center);
        assert_eq!(label.text, "65°N");
    }

    #[test]
    fn test_polar_meridian_label() {
        let frame = polar_frame();
        let g = GraticuleRenderer::new(
            &frame,
            GraticuleConfig {
                label_sep: Some(0.003),
                ..GraticuleConfig::default()
            },
        )
        .unwrap();
        let lines = g.meridians(&[-10.0, 0.0, 20.0]).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.label.text.as_str()).collect();
        assert_eq!(texts, vec!["10°W", "0°", "20°E"]);

        let label = &lines[2].label;
        let angle = 20.0_f64 - 10.0;
        assert_abs_diff_eq!(label.rotation, angle, epsilon = 1e-9);
        let edge = frame.project(20.0, 54.0).unwrap();
        let (sin, cos) = angle.to_radians().sin_cos();
        assert_abs_diff_eq!(label.anchor.x, edge.x + 0.003 * sin, epsilon = 1e-12);
        assert_abs_diff_eq!(label.anchor.y, edge.y - 0.003 * cos, epsilon = 1e-12);
        assert_eq!(label.h_align, HAlign::Center);
        assert_eq!(label.v_align, VAlign::Top);
    }

    #[test]
    fn test_labels_sit_outside_frame() {
        let frame = polar_frame();
        let g = GraticuleRenderer::new(&frame, GraticuleConfig::default()).unwrap();
        for line in g.parallels(&g.default_parallels()).unwrap() {
            assert!(!frame.boundary().contains(line.label.anchor), "{}", line.label.text);
        }
        for line in g.meridians(&g.default_meridians()).unwrap() {
            assert!(!frame.boundary().contains(line.label.anchor), "{}", line.label.text);
        }
    }

    #[test]
    fn test_mercator_lines_are_straight_and_unrotated() {
        let frame = mercator_frame();
        let g = GraticuleRenderer::new(&frame, GraticuleConfig::default()).unwrap();
        for line in g.parallels(&[55.0, 70.0]).unwrap() {
            assert_eq!(line.label.rotation, 0.0);
            let y0 = line.points[0].y;
            assert!(line.points.iter().all(|p| p.y == y0));
        }
        for line in g.meridians(&[0.0, 10.0]).unwrap() {
            assert_eq!(line.label.rotation, 0.0);
            assert!(line.points.iter().all(|p| p.x == line.value));
            // Below the frame
            assert!(line.label.anchor.y < frame.project(line.value, 54.0).unwrap().y);
        }
    }

    #[test]
    fn test_tick_marks_point_outwards() {
        let frame = mercator_frame();
        let g = GraticuleRenderer::new(&frame, GraticuleConfig::default()).unwrap();
        let p = &g.parallels(&[60.0]).unwrap()[0];
        assert!(p.tick[1].x < p.tick[0].x);
        let m = &g.meridians(&[10.0]).unwrap()[0];
        assert!(m.tick[1].y < m.tick[0].y);
        assert_abs_diff_eq!(
            (m.tick[1] - m.tick[0]).length(),
            g.label_sep() * TICK_LEN_FRACTION,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_bad_config() {
        let frame = polar_frame();
        let bad_samples = GraticuleConfig {
            samples: 1,
            ..GraticuleConfig::default()
        };
        assert!(GraticuleRenderer::new(&frame, bad_samples).is_err());
        let bad_sep = GraticuleConfig {
            label_sep: Some(f64::NAN),
            ..GraticuleConfig::default()
        };
        assert!(GraticuleRenderer::new(&frame, bad_sep).is_err());
    }
}
