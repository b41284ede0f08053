use std::fmt::Write;

use anyhow::{Result, ensure};
use geo::MultiLineString;
use polars::prelude::{Column, DataFrame};
use rusqlite::types::Value;

use crate::geom::Crs;

/// Storage class of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

impl FieldKind {
    /// SQLite column type used when writing a GeoPackage table.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Integer => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::Text => "TEXT",
        }
    }

    /// Map a declared column type (`PRAGMA table_info`) to a storage class.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") || declared == "BOOLEAN" {
            FieldKind::Integer
        } else if ["REAL", "DOUBLE", "FLOAT", "NUMERIC", "DECIMAL"].iter().any(|ty| declared.contains(ty)) {
            FieldKind::Real
        } else {
            FieldKind::Text
        }
    }
}

/// A named attribute column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// A row of `gpkg_spatial_ref_sys`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRef {
    pub srs_id: i32,
    pub name: String,
    pub organization: String,
    pub organization_id: i32,
    pub definition: String,
}

impl SpatialRef {
    /// Spatial reference for a supported EPSG code, without a WKT definition.
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        let crs = Crs::from_epsg(epsg)?;
        Ok(Self {
            srs_id: epsg as i32,
            name: crs.name(),
            organization: "EPSG".into(),
            organization_id: epsg as i32,
            definition: "undefined".into(),
        })
    }

    /// EPSG code, if the spatial reference is EPSG-registered.
    pub fn epsg(&self) -> Option<u32> {
        (self.organization.eq_ignore_ascii_case("EPSG") && self.organization_id > 0)
            .then_some(self.organization_id as u32)
    }
}

/// An attribute table with one (possibly missing) linear geometry per row,
/// as stored in a single-layer geospatial container.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub layer: String,
    pub srs: Option<SpatialRef>,
    pub fields: Vec<Field>,
    pub rows: Vec<Vec<Value>>,
    pub geometries: Vec<Option<MultiLineString<f64>>>,
}

impl FeatureTable {
    pub fn new(layer: impl Into<String>, srs: Option<SpatialRef>, fields: Vec<Field>) -> Self {
        Self { layer: layer.into(), srs, fields, rows: Vec::new(), geometries: Vec::new() }
    }

    /// Append a feature; the row must have one value per field.
    pub fn push(&mut self, row: Vec<Value>, geometry: Option<MultiLineString<f64>>) -> Result<()> {
        ensure!(row.len() == self.fields.len(),
            "row has {} values, layer {:?} has {} fields", row.len(), self.layer, self.fields.len());
        self.rows.push(row);
        self.geometries.push(geometry);
        Ok(())
    }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.srs.as_ref().and_then(SpatialRef::epsg) }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Values of a column coerced to numbers; `None` if the column is absent.
    pub fn f64_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|row| value_as_f64(&row[i])).collect())
    }

    /// Values of a column coerced to trimmed, non-empty text; `None` if the column is absent.
    pub fn text_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|row| value_as_text(&row[i])).collect())
    }

    /// Attribute columns plus the geometry as WKT in a trailing `geometry_column`.
    pub(crate) fn to_dataframe(&self, geometry_column: &str) -> Result<DataFrame> {
        let mut columns = self.fields.iter().enumerate()
            .map(|(i, field)| {
                let name = field.name.as_str().into();
                match field.kind {
                    FieldKind::Integer => Column::new(name, self.rows.iter()
                        .map(|row| match &row[i] {
                            Value::Integer(n) => Some(*n),
                            other => value_as_f64(other).map(|v| v.round() as i64),
                        })
                        .collect::<Vec<_>>()),
                    FieldKind::Real => Column::new(name, self.rows.iter()
                        .map(|row| value_as_f64(&row[i]))
                        .collect::<Vec<_>>()),
                    FieldKind::Text => Column::new(name, self.rows.iter()
                        .map(|row| value_as_text(&row[i]))
                        .collect::<Vec<_>>()),
                }
            })
            .collect::<Vec<_>>();

        columns.push(Column::new(geometry_column.into(), self.geometries.iter()
            .map(|geometry| geometry.as_ref().map(to_wkt))
            .collect::<Vec<_>>()));

        Ok(DataFrame::new(columns)?)
    }
}

/// Numeric view of an attribute value; text is parsed, NaN is treated as missing.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Real(v) if v.is_finite() => Some(*v),
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Text view of an attribute value; whole numbers print without a fraction.
pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string),
        Value::Integer(n) => Some(n.to_string()),
        Value::Real(v) if v.is_finite() && v.fract() == 0.0 => Some(format!("{}", *v as i64)),
        Value::Real(v) if v.is_finite() => Some(v.to_string()),
        _ => None,
    }
}

/// Well-Known Text for a MultiLineString.
pub(crate) fn to_wkt(lines: &MultiLineString<f64>) -> String {
    if lines.0.is_empty() { return "MULTILINESTRING EMPTY".into() }

    let mut out = String::from("MULTILINESTRING (");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 { out.push_str(", ") }
        out.push('(');
        for (j, coord) in line.coords().enumerate() {
            if j > 0 { out.push_str(", ") }
            let _ = write!(out, "{} {}", coord.x, coord.y);
        }
        out.push(')');
    }
    out.push(')');
    out
}
