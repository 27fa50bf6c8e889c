use crate::error::{MapError, Result};

/// Degree sign used in graticule labels
pub const DEGREE: char = '\u{00B0}';

/// Wrap a longitude difference into [-180, 180)
#[inline(always)]
pub fn wrap_lon(dlon: f64) -> f64 {
    (dlon + 180.0).rem_euclid(360.0) - 180.0
}

/// Longitude/latitude bounding box of a map
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeographicWindow {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl GeographicWindow {
    /// Validate and build a window.
    /// Rejects non-finite bounds, empty ranges, latitudes beyond the poles
    /// and longitude spans wider than the globe.
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Result<Self> {
        if ![lon_min, lon_max, lat_min, lat_max].iter().all(|v| v.is_finite()) {
            return Err(MapError::config("window bounds must be finite"));
        }
        if lon_min >= lon_max {
            return Err(MapError::config(format!(
                "lon_min ({lon_min}) must be less than lon_max ({lon_max})"
            )));
        }
        if lat_min >= lat_max {
            return Err(MapError::config(format!(
                "lat_min ({lat_min}) must be less than lat_max ({lat_max})"
            )));
        }
        if lat_min < -90.0 || lat_max > 90.0 {
            return Err(MapError::config(format!(
                "latitudes [{lat_min}, {lat_max}] fall outside [-90, 90]"
            )));
        }
        if lon_max - lon_min > 360.0 {
            return Err(MapError::config(format!(
                "longitude span {} exceeds 360 degrees",
                lon_max - lon_min
            )));
        }

        Ok(Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        })
    }

    /// Longitude midpoint, the default reference longitude of a polar map
    pub fn mid_lon(&self) -> f64 {
        0.5 * (self.lon_min + self.lon_max)
    }

    /// Inclusive containment test
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.lon_min <= lon && lon <= self.lon_max && self.lat_min <= lat && lat <= self.lat_max
    }
}

/// Label for a parallel: 60°N, 30°S, 0°
pub fn format_lat(lat: f64) -> String {
    if lat > 0.0 {
        format!("{lat}{DEGREE}N")
    } else if lat < 0.0 {
        format!("{}{DEGREE}S", -lat)
    } else {
        format!("0{DEGREE}")
    }
}

/// Label for a meridian: 10°E, 10°W, 0°
pub fn format_lon(lon: f64) -> String {
    if lon > 0.0 {
        format!("{lon}{DEGREE}E")
    } else if lon < 0.0 {
        format!("{}{DEGREE}W", -lon)
    } else {
        format!("0{DEGREE}")
    }
}
