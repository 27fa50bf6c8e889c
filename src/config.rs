//! Command line options and the validated map configuration built from them.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use tui_polarmap::error::{MapError, Result};
use tui_polarmap::geo::GeographicWindow;
use tui_polarmap::map::boundary::DEFAULT_EDGE_SAMPLES;
use tui_polarmap::map::graticule::DEFAULT_LINE_SAMPLES;
use tui_polarmap::map::{BoundaryBuilder, GraticuleConfig, MapFrame, ProjectionKind, ProjectionParameters};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProjectionArg {
    Polar,
    Mercator,
}

impl From<ProjectionArg> for ProjectionKind {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Polar => ProjectionKind::PolarStereographic,
            ProjectionArg::Mercator => ProjectionKind::Mercator,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tui-polarmap")]
#[command(about = "Terminal map of high-latitude regions with labelled graticule")]
pub struct Args {
    /// Map projection
    #[arg(long, value_enum, env = "POLARMAP_PROJECTION", default_value = "polar")]
    pub projection: ProjectionArg,

    /// Western edge of the map (degrees)
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    pub lon_min: f64,

    /// Eastern edge of the map (degrees)
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    pub lon_max: f64,

    /// Southern edge of the map (degrees)
    #[arg(long, default_value_t = 54.0, allow_negative_numbers = true)]
    pub lat_min: f64,

    /// Northern edge of the map (degrees)
    #[arg(long, default_value_t = 72.0, allow_negative_numbers = true)]
    pub lat_max: f64,

    /// Longitude pointing straight down on a polar map (default: window midpoint)
    #[arg(long, allow_negative_numbers = true)]
    pub vlon: Option<f64>,

    /// Coastline GeoJSON file (default: first Natural Earth file in --data-dir)
    #[arg(long, env = "POLARMAP_COAST")]
    pub coast: Option<PathBuf>,

    /// Directory searched for Natural Earth coastline files
    #[arg(long, env = "POLARMAP_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Parallels to draw, comma separated (default: round latitudes)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub parallels: Vec<f64>,

    /// Meridians to draw, comma separated (default: round longitudes)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub meridians: Vec<f64>,

    /// Points per edge of the frame boundary
    #[arg(long, default_value_t = DEFAULT_EDGE_SAMPLES)]
    pub boundary_samples: usize,

    /// Points per graticule line
    #[arg(long, default_value_t = DEFAULT_LINE_SAMPLES)]
    pub graticule_samples: usize,

    /// Log filter, e.g. "debug" or "tui_polarmap=trace"
    #[arg(long, env = "POLARMAP_LOG", default_value = "warn")]
    pub log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Validated map settings
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub window: GeographicWindow,
    pub projection: ProjectionKind,
    pub vlon: Option<f64>,
    pub boundary: BoundaryBuilder,
    pub graticule: GraticuleConfig,
    pub parallels: Option<Vec<f64>>,
    pub meridians: Option<Vec<f64>>,
    pub coast: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl MapConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let window = GeographicWindow::new(args.lon_min, args.lon_max, args.lat_min, args.lat_max)?;
        let boundary = BoundaryBuilder::new(args.boundary_samples)?;
        if args.graticule_samples < 2 {
            return Err(MapError::Configuration(format!(
                "graticule lines need at least 2 samples, got {}",
                args.graticule_samples
            )));
        }
        if args.vlon.is_some_and(|v| !v.is_finite()) {
            return Err(MapError::Configuration("vlon must be finite".into()));
        }

        Ok(Self {
            window,
            projection: args.projection.into(),
            vlon: args.vlon,
            boundary,
            graticule: GraticuleConfig {
                samples: args.graticule_samples,
                ..GraticuleConfig::default()
            },
            parallels: finite_values("parallels", &args.parallels)?,
            meridians: finite_values("meridians", &args.meridians)?,
            coast: args.coast.clone(),
            data_dir: args.data_dir.clone(),
        })
    }

    pub fn parameters(&self, kind: ProjectionKind) -> ProjectionParameters {
        match kind {
            ProjectionKind::Mercator => ProjectionParameters::mercator(),
            ProjectionKind::PolarStereographic => ProjectionParameters::polar(self.vlon),
        }
    }

    /// Frame of the configured window in the given projection
    pub fn frame(&self, kind: ProjectionKind) -> Result<MapFrame> {
        MapFrame::with_builder(self.window, self.parameters(kind), self.boundary)
    }
}

/// Empty lists mean "choose round values"
fn finite_values(what: &str, values: &[f64]) -> Result<Option<Vec<f64>>> {
    if values.is_empty() {
        return Ok(None);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MapError::Configuration(format!("{what} must be finite")));
    }
    Ok(Some(values.to_vec()))
}
