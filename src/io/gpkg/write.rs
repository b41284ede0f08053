use std::path::Path;

use anyhow::{Context, Result, ensure};
use geo::{BoundingRect, Rect};
use rusqlite::{Connection, params, params_from_iter, types::Value};
use tracing::debug;

use super::{APPLICATION_ID, GEOMETRY_COLUMN, USER_VERSION, encode_geometry, quote_ident};
use crate::{common::{finalize_atomic_write, open_for_atomic_write}, io::{FeatureTable, SpatialRef}};

const WGS84_WKT: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,\
AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],\
UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]";

const METADATA_TABLES: &str = "
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
";

/// Spatial reference rows every GeoPackage must carry.
fn default_spatial_refs() -> [SpatialRef; 3] {
    [
        SpatialRef {
            srs_id: -1,
            name: "Undefined cartesian SRS".into(),
            organization: "NONE".into(),
            organization_id: -1,
            definition: "undefined".into(),
        },
        SpatialRef {
            srs_id: 0,
            name: "Undefined geographic SRS".into(),
            organization: "NONE".into(),
            organization_id: 0,
            definition: "undefined".into(),
        },
        SpatialRef {
            srs_id: 4326,
            name: "WGS 84 geodetic".into(),
            organization: "EPSG".into(),
            organization_id: 4326,
            definition: WGS84_WKT.into(),
        },
    ]
}

/// Write a single-layer GeoPackage, replacing any existing file at `path`.
/// The file only appears once fully written.
pub fn write_feature_table(table: &FeatureTable, path: &Path) -> Result<()> {
    ensure!(!table.layer.is_empty(), "[io::gpkg::write] Layer name must not be empty");
    ensure!(table.fields.iter().all(|f| !f.name.eq_ignore_ascii_case("fid") && !f.name.eq_ignore_ascii_case(GEOMETRY_COLUMN)),
        "[io::gpkg::write] Attribute columns may not be named fid or {GEOMETRY_COLUMN}");

    let pending = open_for_atomic_write(path)?;
    let mut conn = Connection::open(pending.path())
        .with_context(|| format!("[io::gpkg::write] Failed to create GeoPackage for {}", path.display()))?;

    conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    conn.pragma_update(None, "user_version", USER_VERSION)?;

    let srs_id = table.srs.as_ref().map_or(-1, |srs| srs.srs_id);
    let tx = conn.transaction()?;
    tx.execute_batch(METADATA_TABLES)?;

    for srs in default_spatial_refs().iter().chain(table.srs.as_ref()) {
        tx.execute(
            "INSERT OR IGNORE INTO gpkg_spatial_ref_sys \
             (srs_name, srs_id, organization, organization_coordsys_id, definition) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![srs.name, srs.srs_id, srs.organization, srs.organization_id, srs.definition],
        )?;
    }

    let layer = quote_ident(&table.layer);
    let mut columns = vec!["fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string()];
    columns.extend(table.fields.iter().map(|f| format!("{} {}", quote_ident(&f.name), f.kind.sql_type())));
    columns.push(format!("{} MULTILINESTRING", quote_ident(GEOMETRY_COLUMN)));
    tx.execute_batch(&format!("CREATE TABLE {layer} ({});", columns.join(", ")))?;

    let extent = table.geometries.iter()
        .flatten()
        .filter_map(|lines| lines.bounding_rect())
        .reduce(|a, b| Rect::new(
            (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
            (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
        ));
    tx.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id) \
         VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            table.layer,
            extent.map(|r| r.min().x),
            extent.map(|r| r.min().y),
            extent.map(|r| r.max().x),
            extent.map(|r| r.max().y),
            srs_id,
        ],
    )?;
    tx.execute(
        "INSERT INTO gpkg_geometry_columns (table_name, column_name, geometry_type_name, srs_id, z, m) \
         VALUES (?1, ?2, 'MULTILINESTRING', ?3, 0, 0)",
        params![table.layer, GEOMETRY_COLUMN, srs_id],
    )?;

    {
        let mut names = table.fields.iter().map(|f| quote_ident(&f.name)).collect::<Vec<_>>();
        names.push(quote_ident(GEOMETRY_COLUMN));
        let placeholders = (1..=names.len()).map(|i| format!("?{i}")).collect::<Vec<_>>();
        let mut insert = tx.prepare(&format!("INSERT INTO {layer} ({}) VALUES ({})", names.join(", "), placeholders.join(", ")))?;

        for (row, geometry) in table.rows.iter().zip(&table.geometries) {
            let blob = match geometry {
                Some(lines) => Value::Blob(encode_geometry(lines, srs_id)?),
                None => Value::Null,
            };
            insert.execute(params_from_iter(row.iter().cloned().chain(std::iter::once(blob))))?;
        }
    }

    tx.commit()?;
    conn.close().map_err(|(_, err)| err)
        .context("[io::gpkg::write] Failed to close GeoPackage")?;

    finalize_atomic_write(pending)?;
    debug!("[io::gpkg::write] wrote {} features to layer {:?} in {}", table.len(), table.layer, path.display());
    Ok(())
}
