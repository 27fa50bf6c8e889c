use glam::DVec2;
use ratatui::style::Color;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

use crate::braille::BrailleCanvas;
use crate::error::Result;
use crate::grid::ProjectedGrid;
use crate::map::boundary::BoundaryPolygon;
use crate::map::contour::march_squares;
use crate::map::geometry::{scanline_fill, walk_line, DotPattern};
use crate::map::graticule::{HAlign, Label, VAlign};
use crate::map::projection::ProjectedPoint;
use crate::map::viewport::Viewport;
use crate::surface::{Artifact, ArtifactId, DrawStyle, DrawSurface, RecordingSurface, Shape};

/// Braille pixels per character cell
const CELL: DVec2 = DVec2::new(2.0, 4.0);

/// Dots of one colour
#[derive(Clone, Debug)]
pub struct DotLayer {
    pub color: Color,
    pub canvas: BrailleCanvas,
}

/// Text placed at a character cell; may start off-canvas
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub col: i32,
    pub row: i32,
    pub text: String,
    pub color: Color,
}

/// Rasterized map, ready for the widget
#[derive(Clone, Debug)]
pub struct MapLayers {
    pub width: usize,
    pub height: usize,
    /// Per-cell background colour from fills
    pub background: Vec<Option<Color>>,
    /// Drawn bottom to top
    pub dots: Vec<DotLayer>,
    pub labels: Vec<TextLabel>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            background: vec![None; width * height],
            dots: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn background_at(&self, col: usize, row: usize) -> Option<Color> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.background[row * self.width + col]
    }

    fn paint(&mut self, col: usize, row: usize, color: Color) {
        if col < self.width && row < self.height {
            self.background[row * self.width + col] = Some(color);
        }
    }

    /// Topmost layer if it already has this colour, else a new one on top
    fn dot_layer(&mut self, color: Color) -> &mut BrailleCanvas {
        let reuse = self.dots.last().is_some_and(|l| l.color == color);
        if !reuse {
            self.dots.push(DotLayer {
                color,
                canvas: BrailleCanvas::new(self.width, self.height),
            });
        }
        let last = self.dots.len() - 1;
        &mut self.dots[last].canvas
    }
}

/// Inside test of a clip boundary sampled on a regular grid of pixels or cells
#[derive(Clone, Debug)]
pub struct ClipMask {
    width: usize,
    height: usize,
    inside: Vec<bool>,
}

impl ClipMask {
    /// Sample the boundary at the centre of every `step`-sized block of pixels
    pub fn build(boundary: &BoundaryPolygon, viewport: &Viewport, width: usize, height: usize, step: DVec2) -> Self {
        let (lo, hi) = boundary.bounds();
        let mut inside = vec![false; width * height];
        if width > 0 {
            inside.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    let p = viewport.unproject((x as f64 + 0.5) * step.x, (y as f64 + 0.5) * step.y);
                    *cell = p.cmpge(lo).all() && p.cmple(hi).all() && boundary.contains(p);
                }
            });
        }
        Self {
            width,
            height,
            inside,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.inside[y as usize * self.width + x as usize]
    }
}

/// Pixel and cell masks for one boundary
struct Masks {
    boundary: Arc<BoundaryPolygon>,
    pixels: ClipMask,
    cells: ClipMask,
}

/// Terminal drawing surface: records artifacts, then renders them into
/// Braille dot layers and cell backgrounds
#[derive(Clone, Debug)]
pub struct BrailleSurface {
    recorder: RecordingSurface,
    viewport: Viewport,
    cols: usize,
    rows: usize,
}

impl BrailleSurface {
    /// Surface of `cols` x `rows` character cells seen through `viewport`
    pub fn new(cols: usize, rows: usize, viewport: &Viewport) -> Self {
        let mut viewport = viewport.clone();
        viewport.resize(cols * 2, rows * 4);
        Self {
            recorder: RecordingSurface::new(),
            viewport,
            cols,
            rows,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn artifacts(&self) -> &[Artifact] {
        self.recorder.artifacts()
    }

    /// Render every artifact, lowest z-order first
    pub fn rasterize(&self) -> MapLayers {
        let mut layers = MapLayers::new(self.cols, self.rows);
        let mut masks: Vec<Masks> = Vec::new();

        let mut order: Vec<&Artifact> = self.recorder.artifacts().iter().collect();
        order.sort_by_key(|a| a.style.z_order);

        for artifact in order {
            let mask_index = match &artifact.clip {
                Some(clip) => match masks.iter().position(|m| Arc::ptr_eq(&m.boundary, clip)) {
                    Some(i) => Some(i),
                    None => {
                        masks.push(self.build_masks(clip));
                        Some(masks.len() - 1)
                    }
                },
                None => None,
            };
            self.draw_artifact(artifact, mask_index.map(|i| &masks[i]), &mut layers);
        }

        debug!(
            artifacts = self.recorder.len(),
            dot_layers = layers.dots.len(),
            labels = layers.labels.len(),
            "rasterized map"
        );
        layers
    }

    fn build_masks(&self, boundary: &Arc<BoundaryPolygon>) -> Masks {
        let vp = &self.viewport;
        Masks {
            boundary: Arc::clone(boundary),
            pixels: ClipMask::build(boundary, vp, vp.width, vp.height, DVec2::ONE),
            cells: ClipMask::build(boundary, vp, self.cols, self.rows, CELL),
        }
    }

    fn draw_artifact(&self, artifact: &Artifact, mask: Option<&Masks>, layers: &mut MapLayers) {
        let style = &artifact.style;
        match &artifact.shape {
            Shape::Polyline(points) => {
                self.stroke(points, style, style.color, mask, layers);
            }
            Shape::Polygon(points) => {
                if let Some(fill) = style.fill_color {
                    self.fill(points, fill, mask, layers);
                }
                if let Some(edge) = style.edge_color {
                    let mut ring = points.clone();
                    if let Some(&first) = points.first() {
                        ring.push(first);
                    }
                    self.stroke(&ring, style, edge, mask, layers);
                }
            }
            Shape::Contour { grid, levels } => {
                for &level in levels {
                    for seg in march_squares(grid.values(), grid.nx(), grid.ny(), level) {
                        let ends = [
                            grid.interpolate(seg.start.x, seg.start.y),
                            grid.interpolate(seg.end.x, seg.end.y),
                        ];
                        self.stroke(&ends, style, style.color, mask, layers);
                    }
                }
            }
            Shape::FilledContour {
                grid,
                levels,
                colors,
            } => self.fill_bands(grid, levels, colors, mask, layers),
            Shape::Text(label) => {
                if let Some(m) = mask {
                    let (x, y) = self.viewport.project_px(label.anchor);
                    if !m.pixels.contains(x, y) {
                        return;
                    }
                }
                layers.labels.push(self.place_label(label, style.color));
            }
        }
    }

    /// Draw a polyline with viewport culling, dash pattern and clip
    fn stroke(
        &self,
        points: &[ProjectedPoint],
        style: &DrawStyle,
        color: Color,
        mask: Option<&Masks>,
        layers: &mut MapLayers,
    ) {
        if points.len() < 2 {
            return;
        }

        let thick = style.line_width >= 1.5;
        let mut pattern = DotPattern::new(style.line_style);
        let canvas = layers.dot_layer(color);
        let mut plot = |x: i32, y: i32| {
            if !pattern.next() {
                return;
            }
            let offsets: &[(i32, i32)] = if thick { &[(0, 0), (1, 0), (0, 1)] } else { &[(0, 0)] };
            for &(ox, oy) in offsets {
                let (px, py) = (x + ox, y + oy);
                if mask.map_or(true, |m| m.pixels.contains(px, py)) {
                    canvas.set_pixel_signed(px, py);
                }
            }
        };

        let mut prev: Option<(i32, i32)> = None;
        for p in points {
            if !p.is_finite() {
                prev = None;
                continue;
            }
            let (px, py) = self.viewport.project_px(*p);
            if let Some((prev_x, prev_y)) = prev {
                if self.viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                    walk_line(prev_x, prev_y, px, py, &mut plot);
                }
            }
            prev = Some((px, py));
        }
    }

    /// Paint the polygon's cells with a background colour
    fn fill(&self, points: &[ProjectedPoint], color: Color, mask: Option<&Masks>, layers: &mut MapLayers) {
        let cells: Vec<DVec2> = points
            .iter()
            .map(|p| self.viewport.project(*p) / CELL)
            .collect();
        let (w, h) = (layers.width, layers.height);
        scanline_fill(&cells, w, h, |col, row| {
            if mask.map_or(true, |m| m.cells.contains(col as i32, row as i32)) {
                layers.paint(col, row, color);
            }
        });
    }

    /// Colour every grid quad by the band its mean value falls in
    fn fill_bands(
        &self,
        grid: &ProjectedGrid,
        levels: &[f64],
        colors: &[Color],
        mask: Option<&Masks>,
        layers: &mut MapLayers,
    ) {
        for j in 0..grid.ny().saturating_sub(1) {
            for i in 0..grid.nx().saturating_sub(1) {
                let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
                let values = corners.map(|(a, b)| grid.value(a, b));
                if values.iter().any(|v| !v.is_finite()) {
                    continue;
                }
                let mean = values.iter().sum::<f64>() / 4.0;
                let Some(band) = band_index(levels, mean) else {
                    continue;
                };
                let Some(&color) = colors.get(band) else {
                    continue;
                };
                let quad = corners.map(|(a, b)| grid.point(a, b));
                self.fill(&quad, color, mask, layers);
            }
        }
    }

    fn place_label(&self, label: &Label, color: Color) -> TextLabel {
        let anchor = self.viewport.project(label.anchor) / CELL;
        let len = label.text.chars().count() as f64;
        let col = match label.h_align {
            HAlign::Left => anchor.x.ceil(),
            HAlign::Center => (anchor.x - len / 2.0).round(),
            HAlign::Right => anchor.x.floor() - len,
        };
        let row = match label.v_align {
            VAlign::Top => anchor.y.ceil(),
            VAlign::Center => anchor.y.floor(),
            VAlign::Bottom => anchor.y.floor() - 1.0,
        };
        TextLabel {
            col: col as i32,
            row: row as i32,
            text: label.text.clone(),
            color,
        }
    }
}

/// Band `k` holds `[levels[k], levels[k + 1])`; the top level closes the last band
fn band_index(levels: &[f64], v: f64) -> Option<usize> {
    let last = *levels.last()?;
    if levels.len() < 2 || v < levels[0] || v > last {
        return None;
    }
    if v == last {
        return Some(levels.len() - 2);
    }
    Some(levels.partition_point(|l| *l <= v) - 1)
}

impl DrawSurface for BrailleSurface {
    fn polyline(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId> {
        self.recorder.polyline(points, style)
    }

    fn fill_polygon(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId> {
        self.recorder.fill_polygon(points, style)
    }

    fn contour(
        &mut self,
        grid: &ProjectedGrid,
        levels: &[f64],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        self.recorder.contour(grid, levels, style)
    }

    fn filled_contour(
        &mut self,
        grid: &ProjectedGrid,
        levels: &[f64],
        colors: &[Color],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        self.recorder.filled_contour(grid, levels, colors, style)
    }

    fn text(&mut self, label: &Label, style: &DrawStyle) -> Result<ArtifactId> {
        self.recorder.text(label, style)
    }

    fn set_clip(&mut self, artifact: ArtifactId, clip: &BoundaryPolygon) -> Result<()> {
        self.recorder.set_clip(artifact, clip)
    }
}
