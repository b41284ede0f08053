use std::{collections::BTreeMap, path::{Path, PathBuf}, sync::Arc};

use anyhow::{Context, Result, bail};
use polars::frame::DataFrame;
use walkdir::WalkDir;

use crate::{common::read_with_copy_fallback, error::ProfileError, io::csv::read_csv_bytes};

/// Read-only access to the named sheets of a workbook, each as CSV bytes.
pub trait SheetSource: Send + Sync {
    /// Human-readable location, used in error messages.
    fn location(&self) -> String;

    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_bytes(&self, name: &str) -> Result<Arc<[u8]>>;
}

/// A workbook exported to disk as CSV: either a single `.csv` file (one sheet,
/// named after the file stem) or a directory of `<Sheet>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
    sheets: BTreeMap<String, PathBuf>,
}

impl CsvWorkbook {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !root.exists() {
            return Err(ProfileError::MissingFile(root).into());
        }

        let mut sheets = BTreeMap::new();
        if root.is_dir() {
            for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
                let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
                if entry.file_type().is_file() && is_csv(entry.path()) {
                    if let Some(stem) = entry.path().file_stem() {
                        sheets.insert(stem.to_string_lossy().into_owned(), entry.path().to_path_buf());
                    }
                }
            }
            if sheets.is_empty() {
                bail!("No CSV sheets found in workbook directory {}", root.display());
            }
        } else {
            let stem = root.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            sheets.insert(stem, root.clone());
        }

        Ok(Self { root, sheets })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

impl SheetSource for CsvWorkbook {
    fn location(&self) -> String { self.root.display().to_string() }

    fn sheet_names(&self) -> Vec<String> { self.sheets.keys().cloned().collect() }

    fn sheet_bytes(&self, name: &str) -> Result<Arc<[u8]>> {
        let path = self.sheets.get(name)
            .ok_or_else(|| self.missing_sheet(name))?;
        Ok(Arc::from(read_with_copy_fallback(path, |p| std::fs::read(p))?))
    }
}

/// Simple in-memory workbook.
#[derive(Debug, Default, Clone)]
pub struct MemWorkbook {
    name: String,
    sheets: Vec<(String, Arc<[u8]>)>,
}

impl MemWorkbook {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), sheets: Vec::new() } }

    /// Add (or replace) a sheet from CSV text.
    pub fn with_sheet(mut self, name: impl Into<String>, csv: &str) -> Self {
        let name = name.into();
        let bytes = Arc::from(csv.as_bytes().to_vec());
        match self.sheets.iter_mut().find(|(sheet, _)| *sheet == name) {
            Some(slot) => slot.1 = bytes,
            None => self.sheets.push((name, bytes)),
        }
        self
    }
}

impl SheetSource for MemWorkbook {
    fn location(&self) -> String { self.name.clone() }

    fn sheet_names(&self) -> Vec<String> { self.sheets.iter().map(|(name, _)| name.clone()).collect() }

    fn sheet_bytes(&self, name: &str) -> Result<Arc<[u8]>> {
        self.sheets.iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| self.missing_sheet(name))
    }
}

trait MissingSheet {
    fn missing_sheet(&self, name: &str) -> anyhow::Error;
}

impl<T: SheetSource + ?Sized> MissingSheet for T {
    fn missing_sheet(&self, name: &str) -> anyhow::Error {
        ProfileError::MissingSheet {
            source_name: self.location(),
            sheet: name.to_string(),
            available: self.sheet_names(),
        }.into()
    }
}

/// Read a named sheet whose header sits on zero-based row `header_row`.
pub(crate) fn read_sheet(source: &dyn SheetSource, name: &str, header_row: usize) -> Result<DataFrame> {
    if !source.sheet_names().iter().any(|sheet| sheet == name) {
        return Err(source.missing_sheet(name));
    }
    let bytes = source.sheet_bytes(name)?;
    read_csv_bytes(&bytes, header_row)
        .with_context(|| format!("Failed to read sheet {name:?} of {}", source.location()))
}

/// Read the first sheet of a workbook, header on the first row.
pub(crate) fn read_first_sheet(source: &dyn SheetSource) -> Result<DataFrame> {
    let Some(first) = source.sheet_names().into_iter().next() else {
        bail!("Workbook {} has no sheets", source.location());
    };
    read_sheet(source, &first, 0)
}
