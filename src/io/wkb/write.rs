//! WKB writing operations.

use std::io::Write;

use anyhow::Result;
use geo::MultiLineString;

use super::{WKB_LE, WKB_LINESTRING, WKB_MULTILINESTRING};

/// Write a MultiLineString to little-endian 2D WKB.
pub(crate) fn multilinestring_to_wkb(lines: &MultiLineString<f64>) -> Result<Vec<u8>> {
    let mut wkb = Vec::new();

    wkb.write_all(&[WKB_LE])?;
    wkb.write_all(&WKB_MULTILINESTRING.to_le_bytes())?;
    wkb.write_all(&(lines.0.len() as u32).to_le_bytes())?;

    for line in lines {
        wkb.write_all(&[WKB_LE])?;
        wkb.write_all(&WKB_LINESTRING.to_le_bytes())?;
        wkb.write_all(&(line.0.len() as u32).to_le_bytes())?;
        for coord in line.coords() {
            wkb.write_all(&coord.x.to_le_bytes())?;
            wkb.write_all(&coord.y.to_le_bytes())?;
        }
    }

    Ok(wkb)
}
