use ratatui::style::Color;
use tracing::debug;

use crate::data::Coastlines;
use crate::error::{MapError, Result};
use crate::grid::GeoGrid;
use crate::map::frame::MapFrame;
use crate::map::graticule::{GraticuleConfig, GraticuleLine, GraticuleRenderer};
use crate::map::projection::ProjectedPoint;
use crate::surface::{validate_levels, ArtifactId, DrawStyle, DrawSurface};

/// Artifacts of one graticule line
#[derive(Clone, Debug, PartialEq)]
pub struct GraticuleArtifacts {
    pub line: GraticuleLine,
    pub polyline: ArtifactId,
    pub label: Option<ArtifactId>,
    pub tick: Option<ArtifactId>,
}

/// Graticule values and styling for [`ClippedDrawer::draw_parallels`] and
/// [`ClippedDrawer::draw_meridians`]
#[derive(Clone, Debug)]
pub struct GraticuleStyle {
    pub line: DrawStyle,
    /// Style of labels and frame ticks, `None` to leave them out
    pub label: Option<DrawStyle>,
    pub config: GraticuleConfig,
}

impl Default for GraticuleStyle {
    fn default() -> Self {
        Self {
            line: DrawStyle::graticule(),
            label: Some(DrawStyle::line(Color::Black)),
            config: GraticuleConfig::default(),
        }
    }
}

/// Draws geographic content onto a surface, clipped to the frame boundary.
///
/// Every content draw is followed by `set_clip` with the frame's
/// boundary. Frame annotations (graticule labels and tick marks) sit
/// outside the boundary and are left unclipped.
pub struct ClippedDrawer<'f, S: DrawSurface> {
    frame: &'f MapFrame,
    surface: S,
}

impl<'f, S: DrawSurface> ClippedDrawer<'f, S> {
    pub fn new(frame: &'f MapFrame, surface: S) -> Self {
        Self { frame, surface }
    }

    pub fn frame(&self) -> &MapFrame {
        self.frame
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// End the drawing session and hand back the surface
    pub fn finish(self) -> S {
        self.surface
    }

    fn clip(&mut self, id: ArtifactId) -> Result<ArtifactId> {
        self.surface.set_clip(id, self.frame.boundary())?;
        Ok(id)
    }

    /// Polyline through geographic points
    pub fn draw_line(&mut self, lons: &[f64], lats: &[f64], style: &DrawStyle) -> Result<ArtifactId> {
        style.validate_line()?;
        let points = self.frame.projection().forward_many(lons, lats)?;
        self.draw_projected_line(&points, style)
    }

    /// Filled polygon through geographic points
    pub fn fill_polygon(&mut self, lons: &[f64], lats: &[f64], style: &DrawStyle) -> Result<ArtifactId> {
        style.validate_fill()?;
        let points = self.frame.projection().forward_many(lons, lats)?;
        self.fill_projected_polygon(&points, style)
    }

    /// Polyline already in plot coordinates
    pub fn draw_projected_line(&mut self, points: &[ProjectedPoint], style: &DrawStyle) -> Result<ArtifactId> {
        style.validate_line()?;
        let id = self.surface.polyline(points, style)?;
        self.clip(id)
    }

    /// Filled polygon already in plot coordinates
    pub fn fill_projected_polygon(
        &mut self,
        points: &[ProjectedPoint],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        style.validate_fill()?;
        let id = self.surface.fill_polygon(points, style)?;
        self.clip(id)
    }

    /// Contour lines of a gridded field at the given levels
    pub fn draw_contour(&mut self, grid: &GeoGrid, levels: &[f64], style: &DrawStyle) -> Result<ArtifactId> {
        style.validate_line()?;
        validate_levels(levels, 1)?;
        let projected = grid.project(self.frame.projection())?;
        let id = self.surface.contour(&projected, levels, style)?;
        self.clip(id)
    }

    /// Colour bands between consecutive levels; `colors[k]` fills
    /// `[levels[k], levels[k + 1])`
    pub fn draw_filled_contour(
        &mut self,
        grid: &GeoGrid,
        levels: &[f64],
        colors: &[Color],
        style: &DrawStyle,
    ) -> Result<ArtifactId> {
        validate_levels(levels, 2)?;
        if colors.len() != levels.len() - 1 {
            return Err(MapError::config(format!(
                "{} levels need {} colours, got {}",
                levels.len(),
                levels.len() - 1,
                colors.len()
            )));
        }
        let projected = grid.project(self.frame.projection())?;
        let id = self.surface.filled_contour(&projected, levels, colors, style)?;
        self.clip(id)
    }

    /// Outline of every coastline polygon that may reach into the window
    pub fn draw_coastlines(&mut self, coast: &Coastlines, style: &DrawStyle) -> Result<Vec<ArtifactId>> {
        style.validate_line()?;
        let rings = self.coast_rings(coast, 2);
        let ids = rings
            .iter()
            .map(|ring| self.draw_projected_line(ring, style))
            .collect::<Result<Vec<_>>>()?;
        debug!(drawn = ids.len(), total = coast.len(), "drew coastlines");
        Ok(ids)
    }

    /// Land fill for every coastline polygon that may reach into the window
    pub fn fill_continents(&mut self, coast: &Coastlines, style: &DrawStyle) -> Result<Vec<ArtifactId>> {
        style.validate_fill()?;
        let rings = self.coast_rings(coast, 3);
        let ids = rings
            .iter()
            .map(|ring| self.fill_projected_polygon(ring, style))
            .collect::<Result<Vec<_>>>()?;
        debug!(filled = ids.len(), total = coast.len(), "filled continents");
        Ok(ids)
    }

    /// Project the polygons near the window, shifted by whole turns towards it.
    /// Vertices outside the projection's domain (Mercator at the poles) are
    /// dropped; rings left with fewer than `min_points` are skipped.
    fn coast_rings(&self, coast: &Coastlines, min_points: usize) -> Vec<Vec<ProjectedPoint>> {
        let window = self.frame.window();
        let projection = self.frame.projection();
        let mut dropped = 0;

        let rings: Vec<_> = coast
            .polygons()
            .iter()
            .filter_map(|p| Some((p, p.window_shift(window)?)))
            .filter_map(|(p, shift)| {
                let ring: Vec<_> = p
                    .lons()
                    .iter()
                    .zip(p.lats())
                    .filter_map(|(&lon, &lat)| projection.forward(lon + shift, lat).ok())
                    .collect();
                dropped += p.len() - ring.len();
                (ring.len() >= min_points).then_some(ring)
            })
            .collect();

        if dropped > 0 {
            debug!(dropped, "skipped coastline vertices outside the projection domain");
        }
        rings
    }

    /// Background fill beneath the map and the frame outline on top.
    /// The outline runs along the clip edge itself, so it is left unclipped.
    pub fn draw_frame(&mut self, background: Option<&DrawStyle>, outline: &DrawStyle) -> Result<Vec<ArtifactId>> {
        outline.validate_line()?;
        let boundary = self.frame.boundary().points().to_vec();
        let mut ids = Vec::with_capacity(2);
        if let Some(bg) = background {
            ids.push(self.fill_projected_polygon(&boundary, bg)?);
        }
        ids.push(self.surface.polyline(&boundary, outline)?);
        Ok(ids)
    }

    /// Parallels at `lats`, or at round latitudes when `None`
    pub fn draw_parallels(&mut self, lats: Option<&[f64]>, style: &GraticuleStyle) -> Result<Vec<GraticuleArtifacts>> {
        let renderer = GraticuleRenderer::new(self.frame, style.config)?;
        let values = lats.map_or_else(|| renderer.default_parallels(), <[f64]>::to_vec);
        let lines = renderer.parallels(&values)?;
        self.draw_graticule(lines, style)
    }

    /// Meridians at `lons`, or at round longitudes when `None`
    pub fn draw_meridians(&mut self, lons: Option<&[f64]>, style: &GraticuleStyle) -> Result<Vec<GraticuleArtifacts>> {
        let renderer = GraticuleRenderer::new(self.frame, style.config)?;
        let values = lons.map_or_else(|| renderer.default_meridians(), <[f64]>::to_vec);
        let lines = renderer.meridians(&values)?;
        self.draw_graticule(lines, style)
    }

    fn draw_graticule(&mut self, lines: Vec<GraticuleLine>, style: &GraticuleStyle) -> Result<Vec<GraticuleArtifacts>> {
        style.line.validate_line()?;
        if let Some(label_style) = &style.label {
            label_style.validate_line()?;
        }

        lines
            .into_iter()
            .map(|line| {
                let polyline = self.draw_projected_line(&line.points, &style.line)?;
                let (label, tick) = match &style.label {
                    Some(label_style) => (
                        Some(self.surface.text(&line.label, label_style)?),
                        Some(self.surface.polyline(&line.tick, label_style)?),
                    ),
                    None => (None, None),
                };
                Ok(GraticuleArtifacts {
                    line,
                    polyline,
                    label,
                    tick,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Polygon;
    use crate::geo::GeographicWindow;
    use crate::map::projection::ProjectionParameters;
    use crate::map::renderer::{BrailleSurface, MapLayers};
    use crate::map::viewport::Viewport;
    use crate::surface::{RecordingSurface, Shape};

    fn frame(params: ProjectionParameters) -> MapFrame {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        MapFrame::new(window, params).unwrap()
    }

    #[test]
    fn test_draw_line_projects_and_clips() {
        let frame = frame(ProjectionParameters::polar(None));
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let id = drawer
            .draw_line(&[0.0, 10.0], &[60.0, 65.0], &DrawStyle::coastline())
            .unwrap();
        let surface = drawer.finish();

        let artifact = surface.get(id).unwrap();
        let expected = vec![frame.project(0.0, 60.0).unwrap(), frame.project(10.0, 65.0).unwrap()];
        assert_eq!(artifact.shape, Shape::Polyline(expected));
        assert_eq!(artifact.clip.as_deref(), Some(frame.boundary()));
    }

    #[test]
    fn test_shape_and_domain_errors_propagate() {
        let frame = frame(ProjectionParameters::mercator());
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let style = DrawStyle::coastline();
        assert!(matches!(
            drawer.draw_line(&[0.0, 1.0], &[60.0], &style),
            Err(MapError::Shape { .. })
        ));
        assert!(matches!(
            drawer.draw_line(&[0.0], &[90.0], &style),
            Err(MapError::Domain { .. })
        ));
        assert!(drawer.surface().is_empty());
    }

    #[test]
    fn test_invalid_styles_rejected() {
        let frame = frame(ProjectionParameters::mercator());
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let no_fill = DrawStyle::line(Color::Red);
        assert!(drawer.fill_polygon(&[0.0, 1.0, 1.0], &[60.0, 60.0, 61.0], &no_fill).is_err());
        let zero_width = DrawStyle {
            line_width: 0.0,
            ..DrawStyle::coastline()
        };
        assert!(drawer.draw_line(&[0.0, 1.0], &[60.0, 60.0], &zero_width).is_err());
        assert!(drawer.surface().is_empty());
    }

    #[test]
    fn test_contour_level_rules() {
        let frame = frame(ProjectionParameters::polar(None));
        let grid = GeoGrid::regular(&[0.0, 10.0], &[60.0, 65.0], vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let style = DrawStyle::line(Color::Blue);

        assert!(drawer.draw_contour(&grid, &[], &style).is_err());
        assert!(drawer.draw_contour(&grid, &[20.0, 10.0], &style).is_err());
        assert!(drawer
            .draw_filled_contour(&grid, &[10.0, 20.0, 40.0], &[Color::Blue], &style)
            .is_err());

        let lines = drawer.draw_contour(&grid, &[25.0], &style).unwrap();
        let bands = drawer
            .draw_filled_contour(&grid, &[10.0, 20.0, 40.0], &[Color::Blue, Color::Cyan], &style)
            .unwrap();
        let surface = drawer.finish();
        assert_eq!(surface.len(), 2);
        assert!(surface.get(lines).unwrap().clip.is_some());
        assert!(matches!(surface.get(bands).unwrap().shape, Shape::FilledContour { .. }));
    }

    #[test]
    fn test_all_coastline_polygons_drawn() {
        let frame = frame(ProjectionParameters::polar(None));
        let coast = Coastlines::new(vec![
            Polygon::from_points(&[(0.0, 60.0), (5.0, 60.0), (5.0, 62.0), (0.0, 60.0)]).unwrap(),
            Polygon::from_points(&[(10.0, 65.0), (15.0, 65.0), (15.0, 67.0), (10.0, 65.0)]).unwrap(),
            // Entirely outside the window
            Polygon::from_points(&[(100.0, 10.0), (101.0, 10.0), (101.0, 11.0)]).unwrap(),
        ]);
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let lines = drawer.draw_coastlines(&coast, &DrawStyle::coastline()).unwrap();
        let fills = drawer.fill_continents(&coast, &DrawStyle::continents()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(fills.len(), 2);
        assert_eq!(drawer.finish().len(), 4);
    }

    #[test]
    fn test_pole_vertices_do_not_fail_mercator_coastlines() {
        let window = GeographicWindow::new(-60.0, 0.0, -75.0, -55.0).unwrap();
        let frame = MapFrame::new(window, ProjectionParameters::mercator()).unwrap();
        let coast = Coastlines::new(vec![
            Polygon::from_points(&[(-50.0, -70.0), (-40.0, -70.0), (-40.0, -65.0), (-50.0, -70.0)]).unwrap(),
            // Antarctica-style ring closing along the pole
            Polygon::from_points(&[
                (-180.0, -90.0),
                (-60.0, -80.0),
                (-30.0, -72.0),
                (0.0, -70.0),
                (180.0, -90.0),
                (-180.0, -90.0),
            ])
            .unwrap(),
        ]);

        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let lines = drawer.draw_coastlines(&coast, &DrawStyle::coastline()).unwrap();
        let fills = drawer.fill_continents(&coast, &DrawStyle::continents()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(fills.len(), 2);

        let surface = drawer.finish();
        let Shape::Polyline(points) = &surface.get(lines[1]).unwrap().shape else {
            panic!("expected a polyline");
        };
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.is_finite()));

        // Plain geographic draws stay strict
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        assert!(matches!(
            drawer.draw_line(&[-180.0, 0.0], &[-90.0, -70.0], &DrawStyle::coastline()),
            Err(MapError::Domain { .. })
        ));
    }

    #[test]
    fn test_coastlines_across_dateline() {
        let window = GeographicWindow::new(160.0, 200.0, 55.0, 70.0).unwrap();
        let coast = Coastlines::new(vec![
            Polygon::from_points(&[(-170.0, 60.0), (-165.0, 60.0), (-165.0, 63.0), (-170.0, 60.0)]).unwrap(),
        ]);

        let polar = MapFrame::new(window, ProjectionParameters::polar(None)).unwrap();
        let mut drawer = ClippedDrawer::new(&polar, RecordingSurface::new());
        let ids = drawer.draw_coastlines(&coast, &DrawStyle::coastline()).unwrap();
        assert_eq!(ids.len(), 1);

        // Mercator is not periodic, so the outline is moved by a full turn
        let mercator = MapFrame::new(window, ProjectionParameters::mercator()).unwrap();
        let mut drawer = ClippedDrawer::new(&mercator, RecordingSurface::new());
        let ids = drawer.draw_coastlines(&coast, &DrawStyle::coastline()).unwrap();
        let surface = drawer.finish();
        let Shape::Polyline(points) = &surface.get(ids[0]).unwrap().shape else {
            panic!("expected a polyline");
        };
        assert_eq!(points[0], mercator.project(190.0, 60.0).unwrap());
        assert!(mercator.boundary().contains(points[0]));
    }

    #[test]
    fn test_frame_background_below_everything() {
        let frame = frame(ProjectionParameters::polar(None));
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let ids = drawer
            .draw_frame(Some(&DrawStyle::background(Color::LightBlue)), &DrawStyle::frame_outline())
            .unwrap();
        let surface = drawer.finish();
        assert_eq!(ids.len(), 2);
        let bg = surface.get(ids[0]).unwrap();
        assert_eq!(bg.style.z_order, -2);
        assert_eq!(bg.shape, Shape::Polygon(frame.boundary().points().to_vec()));
        assert!(bg.clip.is_some());
        assert!(surface.get(ids[1]).unwrap().clip.is_none());
    }

    #[test]
    fn test_frame_outline_keeps_its_dots() {
        let frame = frame(ProjectionParameters::mercator());
        let viewport = Viewport::fit(frame.boundary().bounds(), 160, 160, 0.08);

        let mut drawer = ClippedDrawer::new(&frame, BrailleSurface::new(80, 40, &viewport));
        drawer.draw_frame(None, &DrawStyle::frame_outline()).unwrap();
        let framed = drawer.finish().rasterize();

        let mut plain = BrailleSurface::new(80, 40, &viewport);
        plain
            .polyline(frame.boundary().points(), &DrawStyle::frame_outline())
            .unwrap();
        let reference = plain.rasterize();

        let count = |layers: &MapLayers| {
            let canvas = &layers.dots[0].canvas;
            (0..canvas.width() * 2)
                .flat_map(|x| (0..canvas.height() * 4).map(move |y| (x, y)))
                .filter(|&(x, y)| canvas.get_pixel(x, y))
                .count()
        };
        assert!(count(&reference) > 0);
        assert_eq!(count(&framed), count(&reference));
    }

    #[test]
    fn test_graticule_annotations_not_clipped() {
        let frame = frame(ProjectionParameters::polar(None));
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let parallels = drawer.draw_parallels(None, &GraticuleStyle::default()).unwrap();
        let meridians = drawer
            .draw_meridians(Some(&[0.0, 20.0]), &GraticuleStyle::default())
            .unwrap();
        let surface = drawer.finish();

        assert_eq!(parallels.len(), 4);
        assert_eq!(meridians.len(), 2);
        for g in parallels.iter().chain(&meridians) {
            assert!(surface.get(g.polyline).unwrap().clip.is_some());
            assert!(surface.get(g.label.unwrap()).unwrap().clip.is_none());
            assert!(surface.get(g.tick.unwrap()).unwrap().clip.is_none());
        }
        assert_eq!(surface.len(), 6 * 3);
    }

    #[test]
    fn test_graticule_without_labels() {
        let frame = frame(ProjectionParameters::mercator());
        let style = GraticuleStyle {
            label: None,
            ..GraticuleStyle::default()
        };
        let mut drawer = ClippedDrawer::new(&frame, RecordingSurface::new());
        let lines = drawer.draw_parallels(Some(&[60.0]), &style).unwrap();
        assert_eq!(lines[0].label, None);
        assert_eq!(drawer.finish().len(), 1);
    }
}
