//! Well-Known Binary encoding for linear geometry.

mod read;
mod write;

pub(crate) use read::*;
pub(crate) use write::*;

/// WKB geometry type for LineString
const WKB_LINESTRING: u32 = 2;
/// WKB geometry type for MultiLineString
const WKB_MULTILINESTRING: u32 = 5;
/// WKB byte order: little endian
const WKB_LE: u8 = 1;
