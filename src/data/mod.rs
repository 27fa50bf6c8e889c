use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::geo::GeographicWindow;

/// Natural Earth files tried by [`Coastlines::load_first_available`], best first
pub const KNOWN_FILES: [&str; 5] = [
    "ne_50m_land.json",
    "ne_50m_coastline.json",
    "ne_110m_land.json",
    "ne_110m_coastline.json",
    "natural-earth.json",
];

/// A closed outline in geographic degrees
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl Polygon {
    pub fn new(lons: Vec<f64>, lats: Vec<f64>) -> Result<Self> {
        if lons.len() != lats.len() {
            return Err(MapError::shape("polygon latitudes", lons.len(), lats.len()));
        }
        if lons.len() < 2 {
            return Err(MapError::config(format!(
                "polygon needs at least 2 points, got {}",
                lons.len()
            )));
        }
        Ok(Self { lons, lats })
    }

    pub fn from_points(points: &[(f64, f64)]) -> Result<Self> {
        let (lons, lats) = points.iter().copied().unzip();
        Self::new(lons, lats)
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    /// (lon_min, lat_min, lon_max, lat_max)
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let fold = |v: &[f64]| {
            v.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
        };
        let (lon_min, lon_max) = fold(&self.lons);
        let (lat_min, lat_max) = fold(&self.lats);
        (lon_min, lat_min, lon_max, lat_max)
    }

    /// Bounding boxes overlap; cheap pre-filter before projecting
    pub fn may_intersect(&self, window: &GeographicWindow) -> bool {
        self.window_shift(window).is_some()
    }

    /// Multiple of 360° to add to the longitudes so the bounding box
    /// overlaps the window, `None` if no shift does.
    /// Windows may run past ±180 while outlines are stored in [-180, 180].
    pub fn window_shift(&self, window: &GeographicWindow) -> Option<f64> {
        let (lon_min, lat_min, lon_max, lat_max) = self.bbox();
        if lat_max < window.lat_min || lat_min > window.lat_max {
            return None;
        }
        let turns = ((window.mid_lon() - (lon_min + lon_max) / 2.0) / 360.0).round();
        [turns, turns - 1.0, turns + 1.0]
            .into_iter()
            .map(|k| k * 360.0)
            .find(|shift| lon_max + shift >= window.lon_min && lon_min + shift <= window.lon_max)
    }
}

/// Immutable collection of coastline outlines
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coastlines {
    polygons: Vec<Polygon>,
}

impl Coastlines {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Read a GeoJSON file of polygons or lines
    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = fs::read(path).map_err(|e| MapError::resource(path, e))?;
        let geojson: GeoJson =
            simd_json::serde::from_slice(&mut bytes).map_err(|e| MapError::resource(path, e))?;
        let coast = Self::from_geojson(&geojson);
        debug!(path = %path.display(), polygons = coast.len(), "loaded coastlines");
        Ok(coast)
    }

    pub fn from_geojson(geojson: &GeoJson) -> Self {
        let mut polygons = Vec::new();
        process_geojson_rings(geojson, |ring| {
            // Degenerate rings carry nothing to draw
            if let Ok(polygon) = Polygon::from_points(&ring) {
                polygons.push(polygon);
            }
        });
        Self { polygons }
    }

    /// First readable file from [`KNOWN_FILES`] in `data_dir`, else the builtin set
    pub fn load_first_available(data_dir: &Path) -> Self {
        for name in KNOWN_FILES {
            let path = data_dir.join(name);
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(coast) => return coast,
                Err(e) => warn!(error = %e, "skipping coastline file"),
            }
        }
        warn!(dir = %data_dir.display(), "no coastline data found, using builtin outlines");
        Self::builtin()
    }

    /// Coarse outlines of the North Atlantic and northern Europe
    pub fn builtin() -> Self {
        let polygons = BUILTIN_OUTLINES
            .iter()
            .filter_map(|points| Polygon::from_points(points).ok())
            .collect();
        Self { polygons }
    }
}

/// Process GeoJSON and extract outline rings
fn process_geojson_rings<F>(geojson: &GeoJson, mut add_ring: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_rings(geometry, &mut add_ring);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_rings(geometry, &mut add_ring);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_rings(geometry, &mut add_ring);
        }
    }
}

fn process_geometry_rings<F>(geometry: &Geometry, add_ring: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_ring = |coords: &[Vec<f64>]| -> Vec<(f64, f64)> {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_ring(to_ring(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_ring(to_ring(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_ring(to_ring(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_ring(to_ring(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_rings(g, add_ring);
            }
        }
        _ => {}
    }
}

const BUILTIN_OUTLINES: &[&[(f64, f64)]] = &[
    // Fennoscandia and the Kola peninsula
    &[
        (5.0, 58.0), (5.5, 59.5), (5.0, 61.0), (5.5, 62.5), (8.0, 63.5),
        (10.5, 64.5), (12.5, 66.0), (14.5, 67.5), (16.0, 68.5), (18.5, 69.8),
        (21.0, 70.2), (24.0, 71.0), (26.0, 70.9), (28.5, 70.9), (31.0, 70.3),
        (33.0, 69.4), (36.0, 69.0), (40.0, 67.8), (41.0, 66.5), (38.0, 66.0),
        (34.5, 65.5), (34.8, 64.3), (36.0, 62.0), (36.0, 60.5), (30.2, 60.0),
        (28.0, 60.5), (25.0, 60.2), (22.5, 60.0), (21.5, 61.0), (21.3, 63.0),
        (23.0, 64.0), (25.0, 65.0), (24.0, 65.8), (21.5, 65.0), (20.5, 63.5),
        (17.5, 62.3), (17.2, 60.7), (18.8, 59.8), (18.0, 59.0), (16.5, 57.0),
        (16.0, 56.2), (14.5, 56.0), (13.0, 55.4), (12.8, 56.5), (11.9, 57.7),
        (11.2, 59.0), (10.5, 59.5), (10.0, 59.0), (8.0, 58.1), (6.5, 58.1),
        (5.0, 58.0),
    ],
    // Continental coast from the Gulf of Finland to Brittany
    &[
        (30.0, 59.9), (28.0, 59.5), (24.0, 59.4), (23.5, 58.5), (24.3, 57.2),
        (21.0, 57.0), (21.0, 56.0), (21.2, 55.2), (19.5, 54.4), (14.5, 53.9),
        (11.0, 54.0), (10.0, 54.5), (9.9, 55.0), (10.3, 56.5), (10.6, 57.7),
        (8.1, 56.8), (8.1, 55.5), (8.6, 54.0), (7.0, 53.5), (5.0, 53.4),
        (4.0, 52.0), (2.5, 51.1), (1.6, 50.9), (-1.5, 49.7), (-4.7, 48.4),
        (-1.5, 46.5), (-1.5, 43.5), (10.0, 44.0), (20.0, 45.0), (40.0, 45.0),
        (40.0, 59.0), (30.0, 59.9),
    ],
    // Great Britain
    &[
        (-5.7, 50.0), (-3.0, 50.6), (1.4, 51.2), (1.7, 52.7), (0.2, 53.5),
        (-1.5, 55.0), (-2.0, 56.0), (-1.8, 57.6), (-3.0, 58.6), (-5.0, 58.6),
        (-6.2, 57.5), (-5.6, 56.4), (-5.0, 55.0), (-3.0, 54.9), (-3.2, 53.4),
        (-4.6, 53.3), (-4.2, 52.3), (-5.2, 51.7), (-3.2, 51.4), (-5.7, 50.0),
    ],
    // Ireland
    &[
        (-6.0, 52.2), (-6.1, 53.5), (-5.6, 54.6), (-6.2, 55.2), (-7.5, 55.3),
        (-8.5, 54.5), (-10.0, 54.2), (-9.9, 53.4), (-9.3, 53.0), (-10.3, 52.0),
        (-9.5, 51.5), (-8.0, 51.8), (-6.0, 52.2),
    ],
    // Iceland
    &[
        (-22.0, 63.8), (-18.0, 63.4), (-14.5, 64.4), (-13.5, 65.2), (-15.0, 66.3),
        (-18.0, 66.2), (-22.5, 66.4), (-24.0, 65.5), (-22.0, 64.8), (-22.0, 63.8),
    ],
    // Svalbard
    &[
        (11.0, 78.5), (14.0, 77.5), (16.5, 76.6), (21.0, 77.5), (27.0, 78.8),
        (22.0, 79.8), (16.0, 80.0), (11.0, 79.7), (11.0, 78.5),
    ],
    // Greenland
    &[
        (-73.0, 78.0), (-60.0, 82.0), (-30.0, 83.5), (-12.0, 81.5), (-18.0, 75.0),
        (-22.0, 70.0), (-32.0, 68.0), (-42.0, 60.0), (-50.0, 64.0), (-54.0, 67.0),
        (-56.0, 72.0), (-68.0, 76.0), (-73.0, 78.0),
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [
                [[0, 60], [10, 60], [10, 65], [0, 60]],
                [[2, 61], [3, 61], [3, 62], [2, 61]]
             ]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[20, 55], [25, 55], [25, 58], [20, 55]]],
                [[[-5, 56], [-4, 56], [-4, 57], [-5, 56]]]
             ]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[1, 70], [2, 71]]}}
        ]
    }"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_exterior_rings_and_lines() {
        let file = write_temp(SAMPLE);
        let coast = Coastlines::load(file.path()).unwrap();
        // Holes are skipped, every polygon of a multipolygon is kept
        assert_eq!(coast.len(), 4);
        assert_eq!(coast.polygons()[0].lons(), &[0.0, 10.0, 10.0, 0.0]);
        assert_eq!(coast.polygons()[2].lats(), &[56.0, 56.0, 57.0, 56.0]);
        assert_eq!(coast.polygons()[3].len(), 2);
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match Coastlines::load(&path) {
            Err(MapError::Resource { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected resource error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_is_resource_error() {
        let file = write_temp("{ not json");
        let err = Coastlines::load(file.path()).unwrap_err();
        assert!(matches!(err, MapError::Resource { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_first_available_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Coastlines::load_first_available(dir.path()), Coastlines::builtin());

        fs::write(dir.path().join("ne_110m_land.json"), SAMPLE).unwrap();
        assert_eq!(Coastlines::load_first_available(dir.path()).len(), 4);

        // A broken preferred file is skipped
        fs::write(dir.path().join("ne_50m_land.json"), "[").unwrap();
        assert_eq!(Coastlines::load_first_available(dir.path()).len(), 4);
    }

    #[test]
    fn test_builtin_outlines_are_closed() {
        let coast = Coastlines::builtin();
        assert_eq!(coast.len(), BUILTIN_OUTLINES.len());
        for p in coast.polygons() {
            assert_eq!(p.lons().first(), p.lons().last());
            assert_eq!(p.lats().first(), p.lats().last());
        }
    }

    #[test]
    fn test_window_prefilter() {
        let window = GeographicWindow::new(-10.0, 30.0, 54.0, 72.0).unwrap();
        let coast = Coastlines::builtin();
        let visible: Vec<_> = coast
            .polygons()
            .iter()
            .filter(|p| p.may_intersect(&window))
            .collect();
        // Iceland, Svalbard and Greenland lie outside
        assert_eq!(visible.len(), 4);
    }

    #[test]
    fn test_window_across_dateline() {
        let window = GeographicWindow::new(160.0, 200.0, 55.0, 70.0).unwrap();
        let east = Polygon::from_points(&[(-170.0, 60.0), (-165.0, 60.0), (-165.0, 63.0)]).unwrap();
        let west = Polygon::from_points(&[(170.0, 60.0), (175.0, 60.0), (175.0, 63.0)]).unwrap();
        let far = Polygon::from_points(&[(0.0, 60.0), (5.0, 60.0), (5.0, 63.0)]).unwrap();
        assert_eq!(east.window_shift(&window), Some(360.0));
        assert_eq!(west.window_shift(&window), Some(0.0));
        assert_eq!(far.window_shift(&window), None);

        let shifted = GeographicWindow::new(-200.0, -160.0, 55.0, 70.0).unwrap();
        assert_eq!(west.window_shift(&shifted), Some(-360.0));
    }

    #[test]
    fn test_polygon_validation() {
        assert!(Polygon::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(Polygon::from_points(&[(0.0, 0.0)]).is_err());
        let p = Polygon::from_points(&[(0.0, 50.0), (5.0, 55.0), (-2.0, 52.0)]).unwrap();
        assert_eq!(p.bbox(), (-2.0, 50.0, 5.0, 55.0));
    }
}
