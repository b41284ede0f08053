use anyhow::{Context, Result, anyhow};
use geo::{Coord, Euclidean, Length, MapCoords, MultiLineString};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use super::Crs;

/// Coordinate transformation between two supported systems.
pub(crate) struct Reprojector {
    from_crs: Crs,
    to_crs: Crs,
    from: Proj4,
    to: Proj4,
}

impl Reprojector {
    pub(crate) fn new(from_crs: Crs, to_crs: Crs) -> Result<Self> {
        let build = |crs: &Crs| Proj4::from_proj_string(crs.proj4)
            .with_context(|| anyhow!("failed to build PROJ.4 for EPSG:{}: {}", crs.epsg, crs.proj4));

        Ok(Self { from: build(&from_crs)?, to: build(&to_crs)?, from_crs, to_crs })
    }

    /// Transform every vertex. Geographic axes are degrees on both ends;
    /// projected axes stay in each system's own unit.
    pub(crate) fn apply(&self, lines: &MultiLineString<f64>) -> Result<MultiLineString<f64>> {
        let (from, to) = (&self.from, &self.to);
        let from_degrees = self.from_crs.is_geographic();
        let to_degrees = self.to_crs.is_geographic();

        lines.try_map_coords(|coord: Coord<f64>| {
            let mut point = if from_degrees {
                (coord.x.to_radians(), coord.y.to_radians(), 0.0)
            } else {
                (coord.x, coord.y, 0.0)
            };
            transform(from, to, &mut point)
                .map_err(|err| anyhow!("CRS transform failed at ({}, {}): {err}", coord.x, coord.y))?;
            Ok(if to_degrees {
                Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
            } else {
                Coord { x: point.0, y: point.1 }
            })
        })
    }
}

/// Planar length of all parts, in coordinate units.
#[inline]
pub(crate) fn planar_length(lines: &MultiLineString<f64>) -> f64 {
    Euclidean.length(lines)
}
