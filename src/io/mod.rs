//! IO module for format-specific reading and writing operations.
//!
//! Each format module handles reading and writing for a specific file format.
//!
//! # Format Modules
//!
//! - `csv` - CSV format for workbook sheets and tabular exports
//! - `gpkg` - GeoPackage (SQLite) feature layers
//! - `shp` - Shapefile segment input
//! - `wkb` - Well-Known Binary linear geometry
//! - `sheet` - workbook abstraction over CSV sheet exports

pub(crate) mod csv;
pub(crate) mod gpkg;
pub(crate) mod shp;
pub(crate) mod wkb;

mod feature;
mod sheet;

pub use feature::{FeatureTable, Field, FieldKind, SpatialRef};
pub use gpkg::{read_feature_table, write_feature_table};
pub use sheet::{CsvWorkbook, MemWorkbook, SheetSource};
pub(crate) use sheet::{read_first_sheet, read_sheet};
