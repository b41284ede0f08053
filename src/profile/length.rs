use anyhow::{Context, Result, bail};
use tracing::info;

use crate::{
    common::round_to,
    corridor::{RoadSegment, SegmentSet},
    geom::{Crs, Reprojector, planar_length},
};

/// A segment with its length in statute miles, rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredSegment {
    pub segment: RoadSegment,
    pub length_miles: f64,
}

/// Measure every segment in the `target` projected CRS. Geometries are always
/// reprojected, even when the source is already projected; the source
/// geometry is kept on the segment.
pub(crate) fn measure_segments(set: SegmentSet, target: Crs) -> Result<Vec<MeasuredSegment>> {
    let Some(miles_per_unit) = target.unit.miles_per_unit() else {
        bail!("length CRS EPSG:{} must be projected", target.epsg);
    };

    if set.crs.is_projected() {
        info!("using projected source CRS {} but reprojecting to EPSG:{} for lengths", set.crs.name(), target.epsg);
    } else {
        info!("CRS is not projected; reprojecting to EPSG:{} ({}) for lengths", target.epsg, target.name());
    }

    let reprojector = Reprojector::new(set.crs, target)?;
    set.segments.into_iter()
        .map(|segment| {
            let projected = reprojector.apply(&segment.geometry)
                .with_context(|| format!("Failed to reproject segment on {}", segment.highway_code))?;
            let length_miles = round_to(planar_length(&projected) * miles_per_unit, 1);
            Ok(MeasuredSegment { segment, length_miles })
        })
        .collect()
}
