//! WKB reading operations.

use std::io::{Cursor, Read};

use anyhow::{Context, Result, bail};
use geo::{Coord, LineString, MultiLineString};

use super::{WKB_LE, WKB_LINESTRING, WKB_MULTILINESTRING};

/// EWKB dimension and SRID flags.
const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Header of one WKB geometry: base type, extra ordinates per point.
struct GeometryHeader {
    is_le: bool,
    base_type: u32,
    extra_dims: usize,
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf).context("[io::wkb::read] Unexpected end of WKB")?;
    Ok(buf[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<u32> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf).context("[io::wkb::read] Unexpected end of WKB")?;
    Ok(if is_le { u32::from_le_bytes(buf) } else { u32::from_be_bytes(buf) })
}

fn read_f64(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<f64> {
    let mut buf = [0u8; 8];
    cursor.read_exact(&mut buf).context("[io::wkb::read] Unexpected end of WKB")?;
    Ok(if is_le { f64::from_le_bytes(buf) } else { f64::from_be_bytes(buf) })
}

/// Read byte order and geometry type, accepting ISO (`1000`s) and EWKB (flag bit) dimensions.
fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<GeometryHeader> {
    let is_le = read_u8(cursor)? == WKB_LE;
    let raw = read_u32(cursor, is_le)?;

    let mut extra_dims = (raw & EWKB_Z != 0) as usize + (raw & EWKB_M != 0) as usize;
    if raw & EWKB_SRID != 0 {
        read_u32(cursor, is_le)?;
    }

    let iso = raw & 0x0FFF_FFFF;
    let base_type = iso % 1000;
    extra_dims += match iso / 1000 {
        0 => 0,
        1 | 2 => 1,
        3 => 2,
        other => bail!("[io::wkb::read] Unsupported WKB dimension code {}", other),
    };

    Ok(GeometryHeader { is_le, base_type, extra_dims })
}

/// Read the body of a LineString; Z and M ordinates are dropped.
fn read_linestring_body(cursor: &mut Cursor<&[u8]>, header: &GeometryHeader) -> Result<LineString<f64>> {
    let num_points = read_u32(cursor, header.is_le)?;
    let mut coords = Vec::with_capacity(num_points.min(1 << 16) as usize);
    for _ in 0..num_points {
        let x = read_f64(cursor, header.is_le)?;
        let y = read_f64(cursor, header.is_le)?;
        for _ in 0..header.extra_dims {
            read_f64(cursor, header.is_le)?;
        }
        coords.push(Coord { x, y });
    }
    Ok(LineString::from(coords))
}

/// Read a LineString or MultiLineString from WKB as a MultiLineString.
/// Empty parts are dropped.
pub(crate) fn lines_from_wkb(wkb_bytes: &[u8]) -> Result<MultiLineString<f64>> {
    let mut cursor = Cursor::new(wkb_bytes);
    let header = read_header(&mut cursor)?;

    let parts = match header.base_type {
        WKB_LINESTRING => vec![read_linestring_body(&mut cursor, &header)?],
        WKB_MULTILINESTRING => {
            let num_lines = read_u32(&mut cursor, header.is_le)?;
            let mut parts = Vec::with_capacity(num_lines.min(1 << 12) as usize);
            for _ in 0..num_lines {
                let part = read_header(&mut cursor)?;
                if part.base_type != WKB_LINESTRING {
                    bail!("[io::wkb::read] Expected LineString inside MultiLineString, got {}", part.base_type);
                }
                parts.push(read_linestring_body(&mut cursor, &part)?);
            }
            parts
        }
        other => bail!("[io::wkb::read] Expected linear geometry type, got {}", other),
    };

    Ok(MultiLineString::new(parts.into_iter().filter(|line| !line.0.is_empty()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_linestring_z() -> Vec<u8> {
        let mut wkb = vec![0u8];
        wkb.extend_from_slice(&1002u32.to_be_bytes());
        wkb.extend_from_slice(&2u32.to_be_bytes());
        for v in [0.0f64, 0.0, 9.0, 3.0, 4.0, 9.0] {
            wkb.extend_from_slice(&v.to_be_bytes());
        }
        wkb
    }

    #[test]
    fn reads_big_endian_linestring_with_z() {
        let lines = lines_from_wkb(&be_linestring_z()).unwrap();
        assert_eq!(lines.0.len(), 1);
        assert_eq!(lines.0[0].0, vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 3.0, y: 4.0 }]);
    }

    #[test]
    fn reads_ewkb_with_srid() {
        let mut wkb = vec![1u8];
        wkb.extend_from_slice(&(WKB_LINESTRING | EWKB_SRID).to_le_bytes());
        wkb.extend_from_slice(&2276u32.to_le_bytes());
        wkb.extend_from_slice(&2u32.to_le_bytes());
        for v in [1.0f64, 2.0, 3.0, 4.0] {
            wkb.extend_from_slice(&v.to_le_bytes());
        }
        let lines = lines_from_wkb(&wkb).unwrap();
        assert_eq!(lines.0[0].0[1], Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn rejects_polygons_and_truncated_input() {
        let mut polygon = vec![1u8];
        polygon.extend_from_slice(&3u32.to_le_bytes());
        polygon.extend_from_slice(&0u32.to_le_bytes());
        assert!(lines_from_wkb(&polygon).is_err());

        let truncated = &be_linestring_z()[..20];
        assert!(lines_from_wkb(truncated).is_err());
    }
}
