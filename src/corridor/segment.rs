use std::path::Path;

use anyhow::{Context, Result, anyhow};
use geo::MultiLineString;
use tracing::{debug, info, warn};

use super::Registry;
use crate::{
    error::ProfileError,
    geom::Crs,
    io::{FeatureTable, SpatialRef, read_feature_table, shp::read_shapefile_table},
};

/// Segment columns that must be present.
pub(crate) const SEGMENT_COLUMNS: [&str; 7] = [
    "HWY",
    "Annual_Average_Daily_Traffic",
    "Truck_AADT",
    "Truck_Tonnage",
    "Roadway_Cross_Section",
    "Number_Of_Crashes",
    "Number_Of_Fatal_Crashes",
];

/// One roadway segment with its traffic and safety attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub highway_code: String,
    /// Linear geometry in the source CRS; empty when the feature has none.
    pub geometry: MultiLineString<f64>,
    pub cross_section_class: Option<String>,
    /// AADT
    pub traffic_volume: Option<f64>,
    pub truck_volume: Option<f64>,
    /// Tons
    pub truck_tonnage: Option<f64>,
    pub crash_count: Option<i64>,
    pub fatal_crash_count: Option<i64>,
}

/// Segments sharing one coordinate system.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    pub crs: Crs,
    pub srs: SpatialRef,
    pub segments: Vec<RoadSegment>,
}

impl SegmentSet {
    /// Load segments from a GeoPackage (first feature layer) or a `.shp` file.
    pub fn load(path: &Path) -> Result<Self> {
        let is_shapefile = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));
        let table = if is_shapefile {
            read_shapefile_table(path)?
        } else {
            read_feature_table(path, None)?
        };
        info!("loaded {} segments from {}", table.len(), path.display());

        Self::from_feature_table(&path.display().to_string(), &table)
            .with_context(|| format!("Invalid segment layer in {}", path.display()))
    }

    pub fn from_feature_table(source_name: &str, table: &FeatureTable) -> Result<Self> {
        ProfileError::check_columns(source_name, &table.column_names(), &SEGMENT_COLUMNS)?;

        let srs = table.srs.clone()
            .ok_or_else(|| anyhow!("{source_name} has no coordinate reference system"))?;
        let epsg = srs.epsg()
            .ok_or_else(|| anyhow!("{source_name} uses a non-EPSG coordinate reference system ({})", srs.name))?;
        let crs = Crs::from_epsg(epsg)?;

        /// Column lookup after the required-column check.
        fn column<T>(values: Option<Vec<T>>, name: &str) -> Result<Vec<T>> {
            values.ok_or_else(|| anyhow!("missing column {name}"))
        }

        let codes = column(table.text_column("HWY"), "HWY")?;
        let classes = column(table.text_column("Roadway_Cross_Section"), "Roadway_Cross_Section")?;
        let aadt = column(table.f64_column("Annual_Average_Daily_Traffic"), "Annual_Average_Daily_Traffic")?;
        let trucks = column(table.f64_column("Truck_AADT"), "Truck_AADT")?;
        let tons = column(table.f64_column("Truck_Tonnage"), "Truck_Tonnage")?;
        let crashes = column(table.f64_column("Number_Of_Crashes"), "Number_Of_Crashes")?;
        let fatal = column(table.f64_column("Number_Of_Fatal_Crashes"), "Number_Of_Fatal_Crashes")?;

        let mut skipped = 0;
        let segments = codes.into_iter().enumerate()
            .filter_map(|(i, code)| {
                let Some(highway_code) = code else {
                    skipped += 1;
                    return None;
                };
                Some(RoadSegment {
                    highway_code,
                    geometry: table.geometries[i].clone().unwrap_or_else(|| MultiLineString::new(vec![])),
                    cross_section_class: classes[i].clone(),
                    traffic_volume: aadt[i],
                    truck_volume: trucks[i],
                    truck_tonnage: tons[i],
                    crash_count: crashes[i].map(|v| v.round() as i64),
                    fatal_crash_count: fatal[i].map(|v| v.round() as i64),
                })
            })
            .collect::<Vec<_>>();

        if skipped > 0 {
            warn!("{skipped} segments in {source_name} have no HWY value and were skipped");
        }

        Ok(Self { crs, srs, segments })
    }

    #[inline] pub fn len(&self) -> usize { self.segments.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    /// Keep only segments whose highway code is a registry label.
    pub fn filter_to_registry(mut self, registry: &Registry) -> Self {
        let before = self.segments.len();
        self.segments.retain(|segment| registry.contains(&segment.highway_code));
        debug!("kept {} of {before} segments on registry corridors", self.segments.len());
        info!("filtered to {} segments matching target highways", self.segments.len());
        self
    }
}

#[cfg(test)]
mod tests {
    use geo::LineString;
    use rusqlite::types::Value;

    use super::*;
    use crate::{corridor::CorridorDefinition, io::{Field, FieldKind}};

    fn segment_table(epsg: u32) -> FeatureTable {
        let mut fields = SEGMENT_COLUMNS.iter()
            .map(|&name| match name {
                "HWY" | "Roadway_Cross_Section" => Field::new(name, FieldKind::Text),
                _ => Field::new(name, FieldKind::Real),
            })
            .collect::<Vec<_>>();
        fields.push(Field::new("District", FieldKind::Text));

        let mut table = FeatureTable::new("raptor", Some(SpatialRef::from_epsg(epsg).unwrap()), fields);
        let line = MultiLineString::new(vec![LineString::from(vec![(0.0, 0.0), (5280.0, 0.0)])]);
        table.push(vec![
            Value::Text("IH0035W".into()), Value::Real(40_000.0), Value::Real(4_000.0), Value::Null,
            Value::Text("4D+".into()), Value::Real(3.0), Value::Real(0.0), Value::Text("FTW".into()),
        ], Some(line.clone())).unwrap();
        table.push(vec![
            Value::Null, Value::Null, Value::Null, Value::Null,
            Value::Null, Value::Null, Value::Null, Value::Null,
        ], Some(line.clone())).unwrap();
        table.push(vec![
            Value::Text("US0287".into()), Value::Integer(9_000), Value::Null, Value::Null,
            Value::Null, Value::Null, Value::Null, Value::Null,
        ], None).unwrap();
        table
    }

    #[test]
    fn reads_typed_segments_and_skips_blank_codes() {
        let set = SegmentSet::from_feature_table("test", &segment_table(2276)).unwrap();
        assert_eq!(set.crs.epsg, 2276);
        assert_eq!(set.len(), 2);

        let first = &set.segments[0];
        assert_eq!(first.cross_section_class.as_deref(), Some("4D+"));
        assert_eq!(first.truck_tonnage, None);
        assert_eq!(first.crash_count, Some(3));

        let second = &set.segments[1];
        assert_eq!(second.traffic_volume, Some(9_000.0));
        assert!(second.geometry.0.is_empty());
    }

    #[test]
    fn filter_keeps_registry_corridors() {
        let set = SegmentSet::from_feature_table("test", &segment_table(2276)).unwrap();
        let registry = Registry::new("test", vec![CorridorDefinition {
            label: "IH0035W".into(),
            code: None,
            order: Some(1.0),
            description: None,
            shield_reference: None,
            corridor_name: None,
        }]).unwrap();

        let filtered = set.filter_to_registry(&registry);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.segments[0].highway_code, "IH0035W");
    }

    #[test]
    fn missing_segment_columns_are_reported() {
        let table = FeatureTable::new("raptor", None, vec![Field::new("HWY", FieldKind::Text)]);
        let err = SegmentSet::from_feature_table("test", &table).unwrap_err();
        match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::MissingColumns { missing, available, .. }) => {
                assert_eq!(missing.len(), 6);
                assert_eq!(available, &["HWY"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn utm_layers_are_accepted() {
        let mut table = segment_table(2276);
        table.srs = Some(SpatialRef { organization_id: 32614, srs_id: 32614, ..table.srs.clone().unwrap() });
        let set = SegmentSet::from_feature_table("test", &table).unwrap();
        assert_eq!(set.crs.epsg, 32614);
        assert!(set.crs.is_projected());
    }

    #[test]
    fn unsupported_crs_is_reported() {
        let mut table = segment_table(2276);
        table.srs = Some(SpatialRef { organization_id: 1, srs_id: 1, ..table.srs.clone().unwrap() });
        let err = SegmentSet::from_feature_table("test", &table).unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::UnsupportedCrs(1))));
    }
}
