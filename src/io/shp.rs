//! Shapefile segment input.

use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiLineString};
use rusqlite::types::Value;
use shapefile::{Reader, Shape, dbase::FieldValue};
use tracing::{debug, warn};

use crate::{
    common::require_exists,
    error::ProfileError,
    geom::{Crs, epsg_from_wkt},
    io::{FeatureTable, Field, FieldKind, SpatialRef},
};

/// Read a polyline shapefile into a feature table. Attribute columns are
/// ordered by name; the spatial reference comes from the sidecar `.prj`.
pub(crate) fn read_shapefile_table(path: &Path) -> Result<FeatureTable> {
    require_exists(path)?;
    let source_name = path.display().to_string();

    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;
        items.push((shape, record));
    }

    let fields = match items.first() {
        Some((_, record)) => {
            let mut fields = record.clone().into_iter()
                .map(|(name, value)| Field::new(name, field_kind(&value)))
                .collect::<Vec<_>>();
            fields.sort_by(|a, b| a.name.cmp(&b.name));
            fields
        }
        None => Vec::new(),
    };

    let layer = path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut table = FeatureTable::new(layer, spatial_ref_from_prj(path), fields);

    for (shape, record) in items {
        let geometry = shape_to_lines(shape)
            .map_err(|detail| ProfileError::UnsupportedGeometry { source_name: source_name.clone(), detail })?;
        let row = table.fields.iter()
            .map(|field| record.get(&field.name).map_or(Value::Null, field_value))
            .collect();
        table.push(row, geometry)?;
    }

    debug!("read {} shapes from {}", table.len(), path.display());
    Ok(table)
}

/// Spatial reference from the `.prj` next to a shapefile, if one is present and recognised.
fn spatial_ref_from_prj(path: &Path) -> Option<SpatialRef> {
    let prj = path.with_extension("prj");
    let wkt = match std::fs::read_to_string(&prj) {
        Ok(wkt) => wkt,
        Err(_) => {
            warn!("no projection file for {}; coordinate system unknown", path.display());
            return None;
        }
    };

    let Some(epsg) = epsg_from_wkt(&wkt) else {
        warn!("could not identify coordinate system in {}", prj.display());
        return None;
    };

    Some(SpatialRef {
        srs_id: epsg as i32,
        name: Crs::from_epsg(epsg).map_or_else(|_| format!("EPSG:{epsg}"), |crs| crs.name()),
        organization: "EPSG".into(),
        organization_id: epsg as i32,
        definition: wkt.trim().to_string(),
    })
}

/// Convert polyline shapes to MultiLineStrings; a null shape has no geometry.
fn shape_to_lines(shape: Shape) -> Result<Option<MultiLineString<f64>>, String> {
    fn to_lines<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiLineString<f64> {
        MultiLineString::new(parts.iter()
            .filter(|part| !part.is_empty())
            .map(|part| LineString::from(part.iter().map(&xy).collect::<Vec<_>>()))
            .collect())
    }

    let lines = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Polyline(line) => to_lines(line.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineM(line) => to_lines(line.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineZ(line) => to_lines(line.parts(), |p| Coord { x: p.x, y: p.y }),
        other => return Err(format!("expected polyline shapes, found {:?}", other.shapetype())),
    };
    Ok((!lines.0.is_empty()).then_some(lines))
}

fn field_kind(value: &FieldValue) -> FieldKind {
    match value {
        FieldValue::Integer(_) => FieldKind::Integer,
        FieldValue::Numeric(_) | FieldValue::Float(_) | FieldValue::Double(_) | FieldValue::Currency(_) => FieldKind::Real,
        _ => FieldKind::Text,
    }
}

fn field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Value::Text(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => Value::Real(*n),
        FieldValue::Float(Some(f)) => Value::Real(*f as f64),
        FieldValue::Integer(i) => Value::Integer(*i as i64),
        FieldValue::Logical(Some(b)) => Value::Text(if *b { "T" } else { "F" }.into()),
        FieldValue::Date(Some(d)) => Value::Text(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        FieldValue::DateTime(dt) => Value::Text(format!("{dt:?}")),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use shapefile::{Point, Polyline};

    use super::*;

    #[test]
    fn polyline_parts_become_lines() {
        let shape = Shape::Polyline(Polyline::with_parts(vec![
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            vec![Point::new(1.0, 0.0), Point::new(1.0, 2.0)],
        ]));
        let lines = shape_to_lines(shape).unwrap().unwrap();
        assert_eq!(lines.0.len(), 2);
        assert_eq!(lines.0[1].0[1], Coord { x: 1.0, y: 2.0 });
    }

    #[test]
    fn null_shape_has_no_geometry() {
        assert_eq!(shape_to_lines(Shape::NullShape).unwrap(), None);
    }

    #[test]
    fn points_are_rejected() {
        assert!(shape_to_lines(Shape::Point(Point::new(1.0, 1.0))).is_err());
    }

    #[test]
    fn field_values_map_to_sql_values() {
        assert_eq!(field_value(&FieldValue::Character(Some(" IH0035W ".into()))), Value::Text("IH0035W".into()));
        assert_eq!(field_value(&FieldValue::Numeric(Some(4200.0))), Value::Real(4200.0));
        assert_eq!(field_value(&FieldValue::Numeric(None)), Value::Null);
        assert_eq!(field_kind(&FieldValue::Integer(3)), FieldKind::Integer);
        assert_eq!(field_kind(&FieldValue::Character(None)), FieldKind::Text);
    }

    #[test]
    fn missing_shapefile_is_reported() {
        let err = read_shapefile_table(Path::new("/no/such/segments.shp")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::MissingFile(_))));
    }
}
