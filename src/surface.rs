//! Drawing surface abstraction, per-draw style options and an in-memory
//! surface that records what was drawn.

use ratatui::style::Color;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::grid::ProjectedGrid;
use crate::map::boundary::BoundaryPolygon;
use crate::map::graticule::Label;
use crate::map::projection::ProjectedPoint;

/// Handle to an object drawn on a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactId(pub usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
}

/// Recognized options of a draw call
#[derive(Clone, Debug, PartialEq)]
pub struct DrawStyle {
    /// Line and text colour
    pub color: Color,
    pub line_style: LineStyle,
    pub line_width: f64,
    /// Interior colour of filled polygons
    pub fill_color: Option<Color>,
    /// Outline colour of filled polygons, none for no outline
    pub edge_color: Option<Color>,
    /// Drawing order, lower first
    pub z_order: i32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            color: Color::Black,
            line_style: LineStyle::Solid,
            line_width: 1.0,
            fill_color: None,
            edge_color: None,
            z_order: 0,
        }
    }
}

impl DrawStyle {
    /// Solid line in the given colour
    pub fn line(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Polygon fill with optional outline
    pub fn fill(fill: Color, edge: Option<Color>) -> Self {
        Self {
            fill_color: Some(fill),
            edge_color: edge,
            ..Self::default()
        }
    }

    pub fn coastline() -> Self {
        Self::line(Color::Black)
    }

    /// Grey land with a black coast
    pub fn continents() -> Self {
        Self::fill(Color::Gray, Some(Color::Black))
    }

    /// Dotted black grid lines
    pub fn graticule() -> Self {
        Self {
            line_style: LineStyle::Dotted,
            ..Self::line(Color::Black)
        }
    }

    /// Map background, drawn beneath everything else
    pub fn background(color: Color) -> Self {
        Self {
            z_order: -2,
            ..Self::fill(color, None)
        }
    }

    pub fn frame_outline() -> Self {
        Self {
            line_width: 2.0,
            ..Self::line(Color::Black)
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    /// Options for polylines, contour lines and text
    pub fn validate_line(&self) -> Result<()> {
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(MapError::config(format!(
                "line width must be positive, got {}",
                self.line_width
            )));
        }
        Ok(())
    }

    /// Options for filled polygons
    pub fn validate_fill(&self) -> Result<()> {
        if self.fill_color.is_none() {
            return Err(MapError::config("filled polygon needs a fill colour"));
        }
        if self.edge_color.is_some() {
            self.validate_line()?;
        }
        Ok(())
    }
}

/// Contour levels must be finite and strictly increasing
pub fn validate_levels(levels: &[f64], min_len: usize) -> Result<()> {
    if levels.len() < min_len {
        return Err(MapError::config(format!(
            "need at least {min_len} contour levels, got {}",
            levels.len()
        )));
    }
    if levels.iter().any(|l| !l.is_finite()) {
        return Err(MapError::config("contour levels must be finite"));
    }
    if levels.windows(2).any(|w| w[0] >= w[1]) {
        return Err(MapError::config("contour levels must be strictly increasing"));
    }
    Ok(())
}

/// What an artifact is, in plot coordinates
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polyline(Vec<ProjectedPoint>),
    Polygon(Vec<ProjectedPoint>),
    Contour {
        grid: ProjectedGrid,
        levels: Vec<f64>,
    },
    FilledContour {
        grid: ProjectedGrid,
        levels: Vec<f64>,
        colors: Vec<Color>,
    },
    Text(Label),
}

/// A drawn object with its style and clip region
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub shape: Shape,
    pub style: DrawStyle,
    pub clip: Option<Arc<BoundaryPolygon>>,
}

/// Primitives a map is drawn with.
///
/// Draw calls return a handle; `set_clip` restricts an already drawn
/// artifact to the interior of a boundary.
pub trait DrawSurface {
    fn polyline(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId>;

    fn fill_polygon(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId>;

    fn contour(&mut self, grid: &ProjectedGrid, levels: &[f64], style: &DrawStyle)
        -> Result<ArtifactId>;

    /// `colors[k]` fills values in `[levels[k], levels[k + 1])`
    fn filled_contour(
        &mut self,
        grid: &ProjectedGrid,
        levels: &[f64],
        colors: &[Color],
        style: &DrawStyle,
    ) -> Result<ArtifactId>;

    fn text(&mut self, label: &Label, style: &DrawStyle) -> Result<ArtifactId>;

    fn set_clip(&mut self, artifact: ArtifactId, clip: &BoundaryPolygon) -> Result<()>;
}

/// Surface that keeps every artifact in drawing order
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    artifacts: Vec<Artifact>,
    clips: Vec<Arc<BoundaryPolygon>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn get(&self, id: ArtifactId) -> Option<&Artifact> {
        self.artifacts.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    fn push(&mut self, shape: Shape, style: &DrawStyle) -> ArtifactId {
        self.artifacts.push(Artifact {
            shape,
            style: style.clone(),
            clip: None,
        });
        ArtifactId(self.artifacts.len() - 1)
    }

    /// Share one allocation per distinct boundary
    fn intern_clip(&mut self, clip: &BoundaryPolygon) -> Arc<BoundaryPolygon> {
        if let Some(existing) = self.clips.iter().find(|c| c.as_ref() == clip) {
            return Arc::clone(existing);
        }
        let clip = Arc::new(clip.clone());
        self.clips.push(Arc::clone(&clip));
        clip
    }
}

impl DrawSurface for RecordingSurface {
    fn polyline(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId> {
        Ok(self.push(Shape::Polyline(points.to_vec()), style))
    }

    fn fill_polygon(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId> {
        Ok(self.push(Shape::Polygon(points.to_vec()), style))
    }

    fn contour(
        &mut self,
        grid: &ProjectedGrid,
        levels: &[f64],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        let shape = Shape::Contour {
            grid: grid.clone(),
            levels: levels.to_vec(),
        };
        Ok(self.push(shape, style))
    }

    fn filled_contour(
        &mut self,
        grid: &ProjectedGrid,
        levels: &[f64],
        colors: &[Color],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        let shape = Shape::FilledContour {
            grid: grid.clone(),
            levels: levels.to_vec(),
            colors: colors.to_vec(),
        };
        Ok(self.push(shape, style))
    }

    fn text(&mut self, label: &Label, style: &DrawStyle) -> Result<ArtifactId> {
        Ok(self.push(Shape::Text(label.clone()), style))
    }

    fn set_clip(&mut self, artifact: ArtifactId, clip: &BoundaryPolygon) -> Result<()> {
        if artifact.0 >= self.artifacts.len() {
            return Err(MapError::config(format!("unknown artifact {}", artifact.0)));
        }
        let clip = self.intern_clip(clip);
        self.artifacts[artifact.0].clip = Some(clip);
        Ok(())
    }
}
