use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OpenFlags, OptionalExtension, types::Value};
use tracing::debug;

use super::{decode_geometry, quote_ident};
use crate::{common::require_exists, io::{FeatureTable, Field, FieldKind, SpatialRef}};

/// Read a feature layer from a GeoPackage. With no `layer` name the first
/// feature layer (by table name) is read.
pub fn read_feature_table(path: &Path, layer: Option<&str>) -> Result<FeatureTable> {
    require_exists(path)?;
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        .with_context(|| format!("[io::gpkg::read] Failed to open GeoPackage {}", path.display()))?;

    let layers = feature_layers(&conn)
        .with_context(|| format!("[io::gpkg::read] {} is not a readable GeoPackage", path.display()))?;
    let (table, geometry_column, srs_id) = match layer {
        Some(name) => layers.iter().find(|(table, ..)| table == name),
        None => layers.first(),
    }
    .cloned()
    .ok_or_else(|| {
        let names = layers.iter().map(|(table, ..)| table.as_str()).collect::<Vec<_>>();
        anyhow!("[io::gpkg::read] Layer {:?} not found in {} (available layers: {:?})",
            layer.unwrap_or("<first>"), path.display(), names)
    })?;

    let srs = match srs_id {
        Some(id) => spatial_ref(&conn, id)?,
        None => None,
    };

    let fields = attribute_fields(&conn, &table, &geometry_column)?;
    debug!("[io::gpkg::read] layer {table:?}: {} attribute columns, geometry {geometry_column:?}", fields.len());

    let mut columns = fields.iter().map(|f| quote_ident(&f.name)).collect::<Vec<_>>();
    columns.push(quote_ident(&geometry_column));
    let sql = format!("SELECT {} FROM {} ORDER BY rowid", columns.join(", "), quote_ident(&table));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = FeatureTable::new(table.clone(), srs, fields);
    let width = out.fields.len();

    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let geometry = match row.get::<_, Option<Vec<u8>>>(width)? {
            Some(blob) => decode_geometry(&blob)
                .with_context(|| format!("[io::gpkg::read] Bad geometry in layer {table:?}"))?,
            None => None,
        };
        out.push(values, geometry)?;
    }

    Ok(out)
}

/// `(table, geometry column, srs_id)` for every feature layer, sorted by table name.
fn feature_layers(conn: &Connection) -> Result<Vec<(String, String, Option<i64>)>> {
    let mut stmt = conn.prepare(
        "SELECT c.table_name, g.column_name, g.srs_id \
         FROM gpkg_contents c JOIN gpkg_geometry_columns g ON g.table_name = c.table_name \
         WHERE c.data_type = 'features' ORDER BY c.table_name",
    )?;
    let layers = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(layers)
}

fn spatial_ref(conn: &Connection, srs_id: i64) -> Result<Option<SpatialRef>> {
    let srs = conn.query_row(
        "SELECT srs_name, organization, organization_coordsys_id, definition \
         FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
        [srs_id],
        |row| Ok(SpatialRef {
            srs_id: srs_id as i32,
            name: row.get(0)?,
            organization: row.get(1)?,
            organization_id: row.get(2)?,
            definition: row.get(3)?,
        }),
    ).optional()?;
    Ok(srs)
}

/// Attribute columns in table order, excluding the primary key and geometry.
fn attribute_fields(conn: &Connection, table: &str, geometry_column: &str) -> Result<Vec<Field>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let fields = stmt.query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: String = row.get(2)?;
            let pk: i64 = row.get(5)?;
            Ok((name, declared, pk))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .filter(|(name, _, pk)| *pk == 0 && !name.eq_ignore_ascii_case(geometry_column))
        .map(|(name, declared, _)| Field::new(name, FieldKind::from_declared(&declared)))
        .collect();
    Ok(fields)
}
