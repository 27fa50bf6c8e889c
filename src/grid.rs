//! Gridded scalar fields (topography, bathymetry) on geographic and
//! projected coordinates.
//!
//! Values are row-major with latitude rows and longitude columns, the
//! layout of a `topo(lat, lon)` variable. NaN marks missing data.

use crate::error::{MapError, Result};
use crate::map::projection::{ProjectedPoint, Projection};

/// Field on a (possibly curvilinear) longitude/latitude mesh
#[derive(Clone, Debug, PartialEq)]
pub struct GeoGrid {
    nx: usize,
    ny: usize,
    lons: Vec<f64>,
    lats: Vec<f64>,
    values: Vec<f64>,
}

impl GeoGrid {
    /// Regular grid from 1-D `lon` (columns) and `lat` (rows) vectors
    pub fn regular(lon: &[f64], lat: &[f64], values: Vec<f64>) -> Result<Self> {
        let (nx, ny) = (lon.len(), lat.len());
        if values.len() != nx * ny {
            return Err(MapError::shape("grid values", nx * ny, values.len()));
        }

        let mut lons = Vec::with_capacity(nx * ny);
        let mut lats = Vec::with_capacity(nx * ny);
        for &y in lat {
            lons.extend_from_slice(lon);
            lats.extend(std::iter::repeat(y).take(nx));
        }

        Self::curvilinear(nx, ny, lons, lats, values)
    }

    /// Grid with explicit coordinates for every node (model grids)
    pub fn curvilinear(
        nx: usize,
        ny: usize,
        lons: Vec<f64>,
        lats: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if nx < 2 || ny < 2 {
            return Err(MapError::config(format!(
                "grid must be at least 2x2, got {nx}x{ny}"
            )));
        }
        let n = nx * ny;
        if lons.len() != n {
            return Err(MapError::shape("grid longitudes", n, lons.len()));
        }
        if lats.len() != n {
            return Err(MapError::shape("grid latitudes", n, lats.len()));
        }
        if values.len() != n {
            return Err(MapError::shape("grid values", n, values.len()));
        }

        Ok(Self {
            nx,
            ny,
            lons,
            lats,
            values,
        })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Transform every value, e.g. topography to positive depth with land masked
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        for v in &mut self.values {
            *v = f(*v);
        }
        self
    }

    /// Smallest and largest finite value
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Project every node
    pub fn project(&self, projection: &Projection) -> Result<ProjectedGrid> {
        let points = projection.forward_many(&self.lons, &self.lats)?;
        Ok(ProjectedGrid {
            nx: self.nx,
            ny: self.ny,
            points,
            values: self.values.clone(),
        })
    }
}

/// Field on projected nodes, same layout as [`GeoGrid`]
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedGrid {
    nx: usize,
    ny: usize,
    points: Vec<ProjectedPoint>,
    values: Vec<f64>,
}

impl ProjectedGrid {
    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn point(&self, i: usize, j: usize) -> ProjectedPoint {
        self.points[j * self.nx + i]
    }

    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx + i]
    }

    /// Plot position at fractional grid indices (bilinear between nodes)
    pub fn interpolate(&self, fi: f64, fj: f64) -> ProjectedPoint {
        let i0 = (fi.floor().max(0.0) as usize).min(self.nx - 2);
        let j0 = (fj.floor().max(0.0) as usize).min(self.ny - 2);
        let u = fi - i0 as f64;
        let v = fj - j0 as f64;

        let p00 = self.point(i0, j0);
        let p10 = self.point(i0 + 1, j0);
        let p01 = self.point(i0, j0 + 1);
        let p11 = self.point(i0 + 1, j0 + 1);
        p00 * ((1.0 - u) * (1.0 - v)) + p10 * (u * (1.0 - v)) + p01 * ((1.0 - u) * v) + p11 * (u * v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_regular_meshgrid_layout() {
        let grid = GeoGrid::regular(&[0.0, 10.0, 20.0], &[60.0, 70.0], (0..6).map(f64::from).collect())
            .unwrap();
        assert_eq!(grid.nx(), 3);
        assert_eq!(grid.ny(), 2);
        let pg = grid.project(&Projection::Mercator).unwrap();
        assert_eq!(pg.point(2, 0).x, 20.0);
        assert_eq!(pg.point(0, 1).y, crate::map::projection::merc(70.0));
        assert_eq!(pg.value(1, 1), 4.0);
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(
            GeoGrid::regular(&[0.0, 1.0], &[0.0, 1.0], vec![0.0; 3]),
            Err(MapError::Shape { expected: 4, actual: 3, .. })
        ));
        assert!(matches!(
            GeoGrid::curvilinear(2, 2, vec![0.0; 4], vec![0.0; 5], vec![0.0; 4]),
            Err(MapError::Shape { .. })
        ));
        assert!(GeoGrid::regular(&[0.0], &[0.0, 1.0], vec![0.0; 2]).is_err());
    }

    #[test]
    fn test_depth_from_topography() {
        let grid = GeoGrid::regular(&[0.0, 1.0], &[60.0, 61.0], vec![-100.0, 20.0, -1000.0, 0.0])
            .unwrap()
            .map_values(|t| if t >= 0.0 { f64::NAN } else { -t });
        assert!(grid.values()[1].is_nan());
        assert!(grid.values()[3].is_nan());
        assert_eq!(grid.value_range(), Some((100.0, 1000.0)));
    }

    #[test]
    fn test_interpolate_nodes_and_center() {
        let grid = GeoGrid::regular(&[0.0, 10.0], &[0.0, 10.0], vec![0.0; 4]).unwrap();
        let pg = grid.project(&Projection::Mercator).unwrap();
        assert_eq!(pg.interpolate(0.0, 0.0), pg.point(0, 0));
        assert_eq!(pg.interpolate(1.0, 1.0), pg.point(1, 1));
        let mid = pg.interpolate(0.5, 0.0);
        assert_abs_diff_eq!(mid.x, 5.0, epsilon = 1e-12);
    }
}
