//! GeoPackage (SQLite) feature layers with linear geometry.

mod read;
mod write;

pub use read::read_feature_table;
pub use write::write_feature_table;

use anyhow::{Result, bail, ensure};
use geo::{BoundingRect, MultiLineString};

use crate::io::wkb::{lines_from_wkb, multilinestring_to_wkb};

/// `PRAGMA application_id` of a GeoPackage ("GPKG").
pub(crate) const APPLICATION_ID: i32 = 0x4750_4B47;
/// `PRAGMA user_version` for GeoPackage 1.2.
pub(crate) const USER_VERSION: i32 = 10200;
/// Name of the geometry column in layers we write.
pub(crate) const GEOMETRY_COLUMN: &str = "geom";

const MAGIC: &[u8; 2] = b"GP";
const FLAG_LE: u8 = 0b0000_0001;
const FLAG_EMPTY: u8 = 0b0001_0000;
/// Envelope indicator 1: [minx, maxx, miny, maxy].
const ENVELOPE_XY: u8 = 1;

/// Quote an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Encode a geometry as a GeoPackage binary blob (header, XY envelope, WKB).
pub(crate) fn encode_geometry(lines: &MultiLineString<f64>, srs_id: i32) -> Result<Vec<u8>> {
    let mut blob = Vec::with_capacity(40 + 9);
    blob.extend_from_slice(MAGIC);
    blob.push(0);

    match lines.bounding_rect() {
        Some(rect) => {
            blob.push(FLAG_LE | (ENVELOPE_XY << 1));
            blob.extend_from_slice(&srs_id.to_le_bytes());
            for v in [rect.min().x, rect.max().x, rect.min().y, rect.max().y] {
                blob.extend_from_slice(&v.to_le_bytes());
            }
        }
        None => {
            blob.push(FLAG_LE | FLAG_EMPTY);
            blob.extend_from_slice(&srs_id.to_le_bytes());
        }
    }

    blob.extend_from_slice(&multilinestring_to_wkb(lines)?);
    Ok(blob)
}

/// Decode a GeoPackage binary blob; an empty geometry decodes to `None`.
pub(crate) fn decode_geometry(blob: &[u8]) -> Result<Option<MultiLineString<f64>>> {
    ensure!(blob.len() >= 8 && &blob[..2] == MAGIC, "[io::gpkg] Not a GeoPackage geometry blob");

    let flags = blob[3];
    let envelope_len = match (flags >> 1) & 0b111 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        other => bail!("[io::gpkg] Invalid envelope indicator {}", other),
    };
    if flags & FLAG_EMPTY != 0 { return Ok(None) }

    let offset = 8 + envelope_len;
    ensure!(blob.len() > offset, "[io::gpkg] Geometry blob truncated");
    let lines = lines_from_wkb(&blob[offset..])?;
    Ok((!lines.0.is_empty()).then_some(lines))
}

#[cfg(test)]
mod tests {
    use geo::LineString;

    use super::*;

    #[test]
    fn blob_header_carries_srs_and_envelope() {
        let lines = MultiLineString::new(vec![LineString::from(vec![(1.0, 2.0), (5.0, -3.0)])]);
        let blob = encode_geometry(&lines, 2276).unwrap();

        assert_eq!(&blob[..2], b"GP");
        assert_eq!(blob[3], 0b0000_0011);
        assert_eq!(i32::from_le_bytes(blob[4..8].try_into().unwrap()), 2276);
        assert_eq!(f64::from_le_bytes(blob[8..16].try_into().unwrap()), 1.0);
        assert_eq!(f64::from_le_bytes(blob[16..24].try_into().unwrap()), 5.0);
        assert_eq!(f64::from_le_bytes(blob[24..32].try_into().unwrap()), -3.0);
        assert_eq!(decode_geometry(&blob).unwrap(), Some(lines));
    }

    #[test]
    fn empty_geometry_decodes_to_none() {
        let blob = encode_geometry(&MultiLineString::new(vec![]), 4326).unwrap();
        assert_eq!(blob[3] & FLAG_EMPTY, FLAG_EMPTY);
        assert_eq!(decode_geometry(&blob).unwrap(), None);
    }

    #[test]
    fn rejects_foreign_blobs() {
        assert!(decode_geometry(b"\x01\x02\x00\x00\x00").is_err());
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("Truck \"AADT\""), "\"Truck \"\"AADT\"\"\"");
    }
}
