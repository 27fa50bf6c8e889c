use glam::DVec2;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::error::{MapError, Result};
use crate::geo::GeographicWindow;

/// Degrees to radians
const RAD: f64 = PI / 180.0;

/// Batches at least this long are projected on the rayon pool
const PAR_THRESHOLD: usize = 4096;

/// A point in planar plot coordinates
pub type ProjectedPoint = DVec2;

/// Which projection a map uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Mercator,
    PolarStereographic,
}

/// Projection kind plus the optional polar reference longitude
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParameters {
    pub kind: ProjectionKind,
    /// Rotation origin of the polar projection. Defaults to the window midpoint.
    pub vlon: Option<f64>,
}

impl ProjectionParameters {
    pub fn mercator() -> Self {
        Self {
            kind: ProjectionKind::Mercator,
            vlon: None,
        }
    }

    pub fn polar(vlon: Option<f64>) -> Self {
        Self {
            kind: ProjectionKind::PolarStereographic,
            vlon,
        }
    }
}

/// Resolved, immutable projection.
///
/// `PolarStereographic` projects the sphere from the south pole onto the
/// equatorial plane, so the north pole lands on the origin and the equator
/// on the unit circle. `vlon` is the meridian pointing straight down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Mercator,
    PolarStereographic { vlon: f64 },
}

impl Projection {
    /// Resolve parameters against the map window
    pub fn from_parameters(params: ProjectionParameters, window: &GeographicWindow) -> Result<Self> {
        match params.kind {
            ProjectionKind::Mercator => Ok(Projection::Mercator),
            ProjectionKind::PolarStereographic => {
                let vlon = params.vlon.unwrap_or_else(|| window.mid_lon());
                if !vlon.is_finite() {
                    return Err(MapError::config("vlon must be finite"));
                }
                Ok(Projection::PolarStereographic { vlon })
            }
        }
    }

    pub fn kind(&self) -> ProjectionKind {
        match self {
            Projection::Mercator => ProjectionKind::Mercator,
            Projection::PolarStereographic { .. } => ProjectionKind::PolarStereographic,
        }
    }

    /// Short name for status displays
    pub fn name(&self) -> &'static str {
        match self {
            Projection::Mercator => "Mercator",
            Projection::PolarStereographic { .. } => "Polar Stereographic",
        }
    }

    /// Project a geographic point (degrees) to plot coordinates
    pub fn forward(&self, lon: f64, lat: f64) -> Result<ProjectedPoint> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(MapError::Domain {
                lon,
                lat,
                reason: "coordinates must be finite",
            });
        }

        match *self {
            Projection::Mercator => {
                if lat.abs() >= 90.0 {
                    return Err(MapError::Domain {
                        lon,
                        lat,
                        reason: "Mercator diverges at the poles",
                    });
                }
                Ok(DVec2::new(lon, merc(lat)))
            }
            Projection::PolarStereographic { vlon } => {
                let m = ((45.0 - 0.5 * lat) * RAD).tan();
                let a = (lon - vlon) * RAD;
                Ok(DVec2::new(m * a.sin(), -m * a.cos()))
            }
        }
    }

    /// Map plot coordinates back to (lon, lat) in degrees.
    /// Polar longitudes come back within 180 degrees of `vlon`.
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MapError::Domain {
                lon: x,
                lat: y,
                reason: "plot coordinates must be finite",
            });
        }

        match *self {
            Projection::Mercator => {
                let lat = 2.0 * (y * RAD).exp().atan() / RAD - 90.0;
                Ok((x, lat))
            }
            Projection::PolarStereographic { vlon } => {
                let rho = (x * x + y * y).sqrt();
                let lon = vlon + x.atan2(-y) / RAD;
                let lat = 90.0 - 2.0 * rho.atan() / RAD;
                Ok((lon, lat))
            }
        }
    }

    /// Elementwise forward transform over equal-length coordinate arrays
    pub fn forward_many(&self, lons: &[f64], lats: &[f64]) -> Result<Vec<ProjectedPoint>> {
        if lons.len() != lats.len() {
            return Err(MapError::shape("forward_many", lons.len(), lats.len()));
        }

        if lons.len() >= PAR_THRESHOLD {
            lons.par_iter()
                .zip(lats.par_iter())
                .map(|(&lon, &lat)| self.forward(lon, lat))
                .collect()
        } else {
            lons.iter()
                .zip(lats)
                .map(|(&lon, &lat)| self.forward(lon, lat))
                .collect()
        }
    }

    /// Elementwise inverse transform over equal-length coordinate arrays
    pub fn inverse_many(&self, xs: &[f64], ys: &[f64]) -> Result<Vec<(f64, f64)>> {
        if xs.len() != ys.len() {
            return Err(MapError::shape("inverse_many", xs.len(), ys.len()));
        }

        if xs.len() >= PAR_THRESHOLD {
            xs.par_iter()
                .zip(ys.par_iter())
                .map(|(&x, &y)| self.inverse(x, y))
                .collect()
        } else {
            xs.iter().zip(ys).map(|(&x, &y)| self.inverse(x, y)).collect()
        }
    }

    /// Unit direction in which a parallel runs (eastwards) through (lon, lat).
    /// Derivative of `forward` with respect to longitude, normalized.
    pub fn lon_tangent(&self, lon: f64, _lat: f64) -> DVec2 {
        match *self {
            Projection::Mercator => DVec2::X,
            Projection::PolarStereographic { vlon } => {
                let a = (lon - vlon) * RAD;
                DVec2::new(a.cos(), a.sin())
            }
        }
    }

    /// Cursor read-out: "lon=... lat=..." inside the window, empty outside
    pub fn format_coord(&self, x: f64, y: f64, window: &GeographicWindow) -> String {
        match self.inverse(x, y) {
            Ok((lon, lat)) if window.contains(lon, lat) => {
                format!("lon={lon:11.6} lat={lat:10.6}")
            }
            _ => String::new(),
        }
    }
}

/// Mercator ordinate in degrees for a latitude in degrees
#[inline(always)]
pub fn merc(lat: f64) -> f64 {
    ((45.0 + 0.5 * lat) * RAD).tan().ln() / RAD
}
