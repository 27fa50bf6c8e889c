use tracing::debug;

use crate::error::{MapError, Result};
use crate::geo::GeographicWindow;
use crate::map::projection::{ProjectedPoint, Projection};

/// Default number of samples along each curved edge of the frame
pub const DEFAULT_EDGE_SAMPLES: usize = 50;

/// Closed outline of the visible map region in plot coordinates.
/// First and last points coincide.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryPolygon {
    points: Vec<ProjectedPoint>,
}

impl BoundaryPolygon {
    pub fn points(&self) -> &[ProjectedPoint] {
        &self.points
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (ProjectedPoint, ProjectedPoint) {
        let mut min = ProjectedPoint::splat(f64::INFINITY);
        let mut max = ProjectedPoint::splat(f64::NEG_INFINITY);
        for p in &self.points {
            min = min.min(*p);
            max = max.max(*p);
        }
        (min, max)
    }

    /// Larger side of the bounding box
    pub fn extent(&self) -> f64 {
        let (min, max) = self.bounds();
        (max - min).max_element()
    }

    /// Even-odd point-in-polygon test
    pub fn contains(&self, p: ProjectedPoint) -> bool {
        point_in_ring(p, &self.points)
    }
}

/// Even-odd ray crossing test against a (closed or open) ring
pub fn point_in_ring(p: ProjectedPoint, ring: &[ProjectedPoint]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Samples the geographic rectangle of a window and projects it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryBuilder {
    samples: usize,
}

impl Default for BoundaryBuilder {
    fn default() -> Self {
        Self {
            samples: DEFAULT_EDGE_SAMPLES,
        }
    }
}

impl BoundaryBuilder {
    /// `samples` points per curved edge; Mercator is fine with 2,
    /// polar maps need about 50 to look smooth.
    pub fn new(samples: usize) -> Result<Self> {
        if samples < 2 {
            return Err(MapError::config(format!(
                "boundary needs at least 2 samples per edge, got {samples}"
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Bottom edge west to east, top edge east to west, then back to the start.
    /// The meridian sides are straight in both projections.
    pub fn build(&self, window: &GeographicWindow, projection: &Projection) -> Result<BoundaryPolygon> {
        let n = self.samples;
        let mut lons = Vec::with_capacity(2 * n + 1);
        let mut lats = Vec::with_capacity(2 * n + 1);

        lons.extend(linspace(window.lon_min, window.lon_max, n));
        lats.extend(std::iter::repeat(window.lat_min).take(n));
        lons.extend(linspace(window.lon_max, window.lon_min, n));
        lats.extend(std::iter::repeat(window.lat_max).take(n));
        lons.push(window.lon_min);
        lats.push(window.lat_min);

        let points = projection.forward_many(&lons, &lats)?;
        debug!(
            projection = projection.name(),
            points = points.len(),
            "built map boundary"
        );
        Ok(BoundaryPolygon { points })
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 { (end - start) / (n - 1) as f64 } else { 0.0 };
    (0..n).map(move |i| if i + 1 == n && n > 1 { end } else { start + step * i as f64 })
}
