//! CSV reading operations.

use std::io::Cursor;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, CsvReader, DataType}};

/// Read a sheet from CSV bytes, skipping `skip_rows` lines above the header.
/// Every column is read as text; numeric parsing happens per column on demand.
pub(crate) fn read_csv_bytes(bytes: &[u8], skip_rows: usize) -> Result<DataFrame> {
    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(skip_rows)
        .with_infer_schema_length(Some(0));

    CsvReader::new(Cursor::new(bytes))
        .with_options(options)
        .finish()
        .context("[io::csv::read] Failed to read CSV from bytes")
}

/// Column names of a frame, in order.
pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().into_iter().map(|name| name.to_string()).collect()
}

/// Trimmed text values of a column; blanks become `None`.
pub(crate) fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)
        .with_context(|| format!("[io::csv::read] Missing column {name:?}"))?
        .cast(&DataType::String)?;

    Ok(column.str()?.into_iter()
        .map(|value| value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

/// Numeric values of a column; blanks and unparsable cells become `None`.
pub(crate) fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(str_values(df, name)?.iter()
        .map(|value| value.as_deref().and_then(parse_number))
        .collect())
}

/// Parse a spreadsheet number, tolerating currency symbols and thousands separators.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect::<String>();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
