use ratatui::style::Color;
use tracing::{debug, warn};

use tui_polarmap::data::Coastlines;
use tui_polarmap::error::Result;
use tui_polarmap::map::{
    BrailleSurface, ClippedDrawer, GraticuleStyle, MapFrame, MapLayers, ProjectionKind, Viewport,
};
use tui_polarmap::surface::{DrawStyle, LineStyle};

use crate::config::MapConfig;

/// Free space around the frame for graticule labels, per side
const LABEL_MARGIN: f64 = 0.08;

const SEA: Color = Color::Rgb(18, 36, 64);
const LAND: Color = Color::Rgb(72, 72, 72);
const COAST: Color = Color::Cyan;
const GRID: Color = Color::Gray;
const ANNOTATION: Color = Color::White;

/// Which layers are drawn
#[derive(Clone, Debug)]
pub struct LayerToggles {
    pub coastlines: bool,
    pub fill: bool,
    pub graticule: bool,
    pub labels: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            coastlines: true,
            fill: true,
            graticule: true,
            labels: true,
        }
    }
}

/// Application state
pub struct App {
    pub config: MapConfig,
    pub frame: MapFrame,
    pub coast: Coastlines,
    pub viewport: Viewport,
    pub layers: LayerToggles,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor read-out
    pub mouse_pos: Option<(u16, u16)>,
    /// Transient notice for the status bar
    pub message: Option<String>,
}

impl App {
    pub fn new(config: MapConfig, coast: Coastlines, width: usize, height: usize) -> Result<Self> {
        let frame = config.frame(config.projection)?;
        let (pw, ph) = map_pixels(width, height);
        let viewport = Viewport::fit(frame.boundary().bounds(), pw, ph, LABEL_MARGIN);

        Ok(Self {
            config,
            frame,
            coast,
            viewport,
            layers: LayerToggles::default(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            message: None,
        })
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = map_pixels(width, height);
        self.viewport.resize(pw, ph);
    }

    /// Fit the whole frame into the map area again
    pub fn reset_view(&mut self) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        self.viewport = Viewport::fit(self.frame.boundary().bounds(), w, h, LABEL_MARGIN);
        self.message = None;
    }

    /// Swap between polar stereographic and Mercator
    pub fn switch_projection(&mut self) {
        let next = match self.frame.projection().kind() {
            ProjectionKind::Mercator => ProjectionKind::PolarStereographic,
            ProjectionKind::PolarStereographic => ProjectionKind::Mercator,
        };
        match self.config.frame(next) {
            Ok(frame) => {
                debug!(projection = frame.projection().name(), "switched projection");
                self.frame = frame;
                self.reset_view();
            }
            Err(e) => {
                warn!(error = %e, "cannot switch projection");
                self.message = Some(e.to_string());
            }
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    /// Zoom in
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    /// Zoom out
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixels(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixels(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_coastlines(&mut self) {
        self.layers.coastlines = !self.layers.coastlines;
    }

    pub fn toggle_fill(&mut self) {
        self.layers.fill = !self.layers.fill;
    }

    pub fn toggle_graticule(&mut self) {
        self.layers.graticule = !self.layers.graticule;
    }

    pub fn toggle_labels(&mut self) {
        self.layers.labels = !self.layers.labels;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| to_pixels(col, row))
    }

    /// Geographic read-out under the mouse, empty outside the window
    pub fn cursor_readout(&self) -> String {
        self.mouse_pixel_pos()
            .map(|(px, py)| {
                let p = self.viewport.unproject(px as f64 + 0.5, py as f64 + 0.5);
                self.frame.format_coord(p)
            })
            .unwrap_or_default()
    }

    /// Draw the enabled layers and rasterize them for a `cols` x `rows` map area
    pub fn render_layers(&self, cols: usize, rows: usize) -> Result<MapLayers> {
        let surface = BrailleSurface::new(cols, rows, &self.viewport);
        let mut drawer = ClippedDrawer::new(&self.frame, surface);

        drawer.draw_frame(Some(&DrawStyle::background(SEA)), &outline_style())?;
        if self.layers.fill {
            drawer.fill_continents(&self.coast, &DrawStyle::fill(LAND, None).with_z_order(-1))?;
        }
        if self.layers.coastlines {
            drawer.draw_coastlines(&self.coast, &DrawStyle::line(COAST))?;
        }
        if self.layers.graticule {
            let style = GraticuleStyle {
                line: DrawStyle::line(GRID).with_line_style(LineStyle::Dotted),
                label: self.layers.labels.then(|| DrawStyle::line(ANNOTATION)),
                config: self.config.graticule,
            };
            drawer.draw_parallels(self.config.parallels.as_deref(), &style)?;
            drawer.draw_meridians(self.config.meridians.as_deref(), &style)?;
        }

        Ok(drawer.finish().rasterize())
    }
}

/// Frame outline, above coastlines and grid
fn outline_style() -> DrawStyle {
    DrawStyle::frame_outline().with_color(ANNOTATION).with_z_order(1)
}

/// Braille pixels of the map area inside the border and above the status bar
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to braille pixel, accounting for the 1-cell border
fn to_pixels(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let mut argv = vec!["tui-polarmap"];
        argv.extend_from_slice(extra);
        let config = MapConfig::from_args(&Args::try_parse_from(argv).unwrap()).unwrap();
        App::new(config, Coastlines::builtin(), 82, 43).unwrap()
    }

    #[test]
    fn test_viewport_fits_frame() {
        let app = app(&[]);
        assert_eq!((app.viewport.width, app.viewport.height), (160, 160));
        let (lo, hi) = app.frame.boundary().bounds();
        for corner in [lo, hi] {
            let (x, y) = app.viewport.project_px(corner);
            assert!((0..160).contains(&x) && (0..160).contains(&y));
        }
    }

    #[test]
    fn test_switch_projection_round_trip() {
        let mut app = app(&[]);
        assert_eq!(app.frame.projection().name(), "Polar Stereographic");
        app.switch_projection();
        assert_eq!(app.frame.projection().name(), "Mercator");
        app.switch_projection();
        assert_eq!(app.frame.projection().name(), "Polar Stereographic");
        assert!(app.message.is_none());
    }

    #[test]
    fn test_switch_rejected_for_polar_window() {
        let mut app = app(&["--lat-max", "90"]);
        app.switch_projection();
        assert_eq!(app.frame.projection().kind(), ProjectionKind::PolarStereographic);
        assert!(app.message.is_some());
    }

    #[test]
    fn test_render_layers_draws_map() {
        let app = app(&[]);
        let layers = app.render_layers(80, 40).unwrap();
        assert!(layers.background.iter().any(|c| *c == Some(SEA)));
        assert!(layers.background.iter().any(|c| *c == Some(LAND)));
        assert!(layers.dots.iter().any(|l| l.color == COAST && !l.canvas.is_blank()));
        let texts: Vec<&str> = layers.labels.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&"60°N"));
        assert!(texts.contains(&"10°E"));
    }

    #[test]
    fn test_toggles_remove_layers() {
        let mut app = app(&[]);
        app.toggle_fill();
        app.toggle_labels();
        app.toggle_coastlines();
        let layers = app.render_layers(80, 40).unwrap();
        assert!(!layers.background.iter().any(|c| *c == Some(LAND)));
        assert!(layers.labels.is_empty());
        assert!(!layers.dots.iter().any(|l| l.color == COAST));
    }

    #[test]
    fn test_cursor_readout() {
        let mut app = app(&[]);
        let center = app.viewport.project(app.frame.project(10.0, 63.0).unwrap());
        let col = (center.x / 2.0) as u16 + 1;
        let row = (center.y / 4.0) as u16 + 1;
        app.set_mouse_pos(col, row);
        assert!(app.cursor_readout().starts_with("lon="));
        app.set_mouse_pos(0, 0);
        assert_eq!(app.cursor_readout(), "");
    }
}
