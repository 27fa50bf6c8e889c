//! Error types for map frame construction, projection and drawing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MapError`].
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised by the projection and graticule engine.
///
/// None of these are transient: they indicate bad input or configuration
/// and are returned to the caller as-is.
#[derive(Error, Debug)]
pub enum MapError {
    /// Geographic input outside the projection's valid domain.
    #[error("lon={lon}, lat={lat} is outside the projection domain: {reason}")]
    Domain {
        lon: f64,
        lat: f64,
        reason: &'static str,
    },

    /// Coordinate arrays of mismatched length or grid dimensions.
    #[error("shape mismatch in {what}: expected {expected} elements, got {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Degenerate window, bad sampling density or invalid draw options.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An external source (coastline file, grid provider) could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MapError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        MapError::Configuration(msg.into())
    }

    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        MapError::Shape {
            what,
            expected,
            actual,
        }
    }

    pub(crate) fn resource(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        MapError::Resource {
            path: path.into(),
            source: source.into(),
        }
    }
}
