use std::{collections::HashMap, fmt::Write, path::PathBuf};

use thiserror::Error;

/// Validation failures that end a run before anything is written.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("sheet {sheet:?} not found in {source_name} (available sheets: {available:?})")]
    MissingSheet {
        source_name: String,
        sheet: String,
        available: Vec<String>,
    },

    #[error("{}", missing_columns_report(.source_name, .missing, .required, .available))]
    MissingColumns {
        source_name: String,
        missing: Vec<String>,
        required: Vec<String>,
        available: Vec<String>,
    },

    #[error("{}", duplicate_keys_report(.source_name, .column, .duplicates))]
    DuplicateKeys {
        source_name: String,
        column: String,
        /// Offending keys with their occurrence counts, in first-seen order.
        duplicates: Vec<(String, usize)>,
    },

    #[error("unsupported coordinate reference system: EPSG:{0}")]
    UnsupportedCrs(u32),

    #[error("unsupported geometry in {source_name}: {detail}")]
    UnsupportedGeometry { source_name: String, detail: String },
}

impl ProfileError {
    /// Error unless every `required` column is among `available`.
    pub(crate) fn check_columns(source_name: &str, available: &[String], required: &[&str]) -> Result<(), Self> {
        let missing = required.iter()
            .filter(|&&col| !available.iter().any(|a| a == col))
            .map(|col| col.to_string())
            .collect::<Vec<_>>();

        if missing.is_empty() { return Ok(()) }

        let mut available = available.to_vec();
        available.sort();
        Err(Self::MissingColumns {
            source_name: source_name.to_string(),
            missing,
            required: required.iter().map(|col| col.to_string()).collect(),
            available,
        })
    }

    /// Error if any key occurs more than once; every occurrence is counted.
    pub(crate) fn check_unique<'a>(source_name: &str, column: &str, keys: impl IntoIterator<Item = &'a str>) -> Result<(), Self> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for key in keys {
            let count = counts.entry(key).or_insert(0);
            if *count == 0 { order.push(key) }
            *count += 1;
        }

        let duplicates = order.into_iter()
            .filter(|key| counts[key] > 1)
            .map(|key| (key.to_string(), counts[key]))
            .collect::<Vec<_>>();

        if duplicates.is_empty() { return Ok(()) }

        Err(Self::DuplicateKeys {
            source_name: source_name.to_string(),
            column: column.to_string(),
            duplicates,
        })
    }
}

fn missing_columns_report(source_name: &str, missing: &[String], required: &[String], available: &[String]) -> String {
    let mut out = format!("missing required columns in {source_name}\n");
    let _ = writeln!(out, "  missing columns: {missing:?}");
    let _ = writeln!(out, "  required columns: {required:?}");
    out.push_str("  available columns:");
    for col in available {
        let _ = write!(out, "\n    - {col}");
    }
    out
}

fn duplicate_keys_report(source_name: &str, column: &str, duplicates: &[(String, usize)]) -> String {
    let mut out = format!("duplicate {column} values in {source_name}:");
    for (key, count) in duplicates {
        let _ = write!(out, "\n  - {key} (appears {count} times)");
    }
    out.push_str(&format!("\neach {column} must be unique; remove or consolidate the duplicate entries"));
    out
}

#[cfg(test)]
mod tests {
    use super::ProfileError;

    fn names(cols: &[&str]) -> Vec<String> { cols.iter().map(|c| c.to_string()).collect() }

    #[test]
    fn check_columns_passes_with_extra_columns() {
        let available = names(&["HWY", "Extra", "AADT"]);
        assert!(ProfileError::check_columns("segments", &available, &["HWY", "AADT"]).is_ok());
    }

    #[test]
    fn check_columns_lists_missing_and_sorted_available() {
        let available = names(&["b", "a"]);
        let err = ProfileError::check_columns("registry", &available, &["a", "c", "d"]).unwrap_err();
        match &err {
            ProfileError::MissingColumns { missing, available, required, .. } => {
                assert_eq!(missing, &names(&["c", "d"]));
                assert_eq!(available, &names(&["a", "b"]));
                assert_eq!(required.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let text = err.to_string();
        assert!(text.contains("registry"));
        assert!(text.contains("- a\n    - b"));
    }

    #[test]
    fn check_unique_reports_every_duplicate_with_count() {
        let keys = ["0902-01-001", "0902-01-002", "0902-01-001", "0008-13-100", "0008-13-100", "0008-13-100"];
        let err = ProfileError::check_unique("tracker", "CSJ", keys).unwrap_err();
        match &err {
            ProfileError::DuplicateKeys { duplicates, .. } => assert_eq!(duplicates, &vec![
                ("0902-01-001".to_string(), 2),
                ("0008-13-100".to_string(), 3),
            ]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("0902-01-001 (appears 2 times)"));
    }

    #[test]
    fn check_unique_accepts_distinct_keys() {
        assert!(ProfileError::check_unique("tracker", "CSJ", ["a", "b", "c"]).is_ok());
    }
}
