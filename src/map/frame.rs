use tracing::debug;

use crate::error::Result;
use crate::geo::GeographicWindow;
use crate::map::boundary::{BoundaryBuilder, BoundaryPolygon};
use crate::map::projection::{ProjectedPoint, Projection, ProjectionParameters};

/// Window, projection and boundary of one map. Built once, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct MapFrame {
    window: GeographicWindow,
    projection: Projection,
    boundary: BoundaryPolygon,
}

impl MapFrame {
    /// Frame with the default boundary sampling
    pub fn new(window: GeographicWindow, params: ProjectionParameters) -> Result<Self> {
        Self::with_builder(window, params, BoundaryBuilder::default())
    }

    pub fn with_builder(
        window: GeographicWindow,
        params: ProjectionParameters,
        builder: BoundaryBuilder,
    ) -> Result<Self> {
        let projection = Projection::from_parameters(params, &window)?;
        let boundary = builder.build(&window, &projection)?;
        debug!(
            projection = projection.name(),
            lon_min = window.lon_min,
            lon_max = window.lon_max,
            lat_min = window.lat_min,
            lat_max = window.lat_max,
            "created map frame"
        );
        Ok(Self {
            window,
            projection,
            boundary,
        })
    }

    pub fn window(&self) -> &GeographicWindow {
        &self.window
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn boundary(&self) -> &BoundaryPolygon {
        &self.boundary
    }

    /// Project a geographic point with this frame's projection
    pub fn project(&self, lon: f64, lat: f64) -> Result<ProjectedPoint> {
        self.projection.forward(lon, lat)
    }

    /// Cursor read-out for a plot position
    pub fn format_coord(&self, p: ProjectedPoint) -> String {
        self.projection.format_coord(p.x, p.y, &self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    #[test]
    fn test_polar_frame_defaults_vlon_to_midpoint() {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        let frame = MapFrame::new(window, ProjectionParameters::polar(None)).unwrap();
        assert_eq!(*frame.projection(), Projection::PolarStereographic { vlon: 10.0 });
        assert_eq!(frame.boundary().points().len(), 101);
    }

    #[test]
    fn test_mercator_frame_rejects_polar_window() {
        let window = GeographicWindow::new(-10.0, 30.0, 80.0, 90.0).unwrap();
        let err = MapFrame::new(window, ProjectionParameters::mercator()).unwrap_err();
        assert!(matches!(err, MapError::Domain { .. }));
        // The same window is fine on a polar map
        assert!(MapFrame::new(window, ProjectionParameters::polar(None)).is_ok());
    }

    #[test]
    fn test_format_coord_through_frame() {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        let frame = MapFrame::new(window, ProjectionParameters::mercator()).unwrap();
        let p = frame.project(0.0, 60.0).unwrap();
        assert!(frame.format_coord(p).contains("60.000000"));
        assert_eq!(frame.format_coord(ProjectedPoint::new(100.0, 0.0)), "");
    }
}
