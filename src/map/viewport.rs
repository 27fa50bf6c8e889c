use glam::DVec2;

use crate::map::projection::ProjectedPoint;

const ZOOM_STEP: f64 = 1.5;
const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 100.0;

/// Visible part of the plot plane and its mapping to canvas pixels.
///
/// Pixel y grows downwards, plot y upwards. Braille dots are close to
/// square, so one scale serves both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Plot coordinates at the canvas centre
    pub center: ProjectedPoint,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Pixels per plot unit at zoom 1
    pub base_scale: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center: ProjectedPoint, base_scale: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom: 1.0,
            base_scale,
            width,
            height,
        }
    }

    /// Fit `bounds` into the canvas, leaving `margin` (fraction of each
    /// dimension) free on every side
    pub fn fit(bounds: (ProjectedPoint, ProjectedPoint), width: usize, height: usize, margin: f64) -> Self {
        let (min, max) = bounds;
        let span = max - min;
        let usable = DVec2::new(width as f64, height as f64) * (1.0 - 2.0 * margin).max(0.1);
        let scale = (usable.x / span.x).min(usable.y / span.y);
        let base_scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self::new((min + max) * 0.5, base_scale, width, height)
    }

    pub fn scale(&self) -> f64 {
        self.base_scale * self.zoom
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Plot coordinates to continuous pixel coordinates
    pub fn project(&self, p: ProjectedPoint) -> DVec2 {
        let s = self.scale();
        DVec2::new(
            (p.x - self.center.x) * s + self.width as f64 / 2.0,
            self.height as f64 / 2.0 - (p.y - self.center.y) * s,
        )
    }

    /// Plot coordinates to the pixel containing them
    pub fn project_px(&self, p: ProjectedPoint) -> (i32, i32) {
        let q = self.project(p);
        (q.x.floor() as i32, q.y.floor() as i32)
    }

    /// Continuous pixel coordinates back to plot coordinates
    pub fn unproject(&self, px: f64, py: f64) -> ProjectedPoint {
        let s = self.scale();
        DVec2::new(
            (px - self.width as f64 / 2.0) / s + self.center.x,
            (self.height as f64 / 2.0 - py) / s + self.center.y,
        )
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let s = self.scale();
        self.center.x += dx as f64 / s;
        self.center.y -= dy as f64 / s;
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor keeping the plot point under the pixel fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (px, py) = (px as f64, py as f64);
        let anchor = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let s = self.scale();
        self.center = DVec2::new(
            anchor.x - (px - self.width as f64 / 2.0) / s,
            anchor.y + (py - self.height as f64 / 2.0) / s,
        );
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
