use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::{
    common::{ensure_dir_exists, require_exists},
    io::{csv::write_csv, read_feature_table},
};

/// Result of dumping a layer to CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub path: PathBuf,
    pub rows: usize,
    /// Attribute columns plus the geometry column.
    pub columns: usize,
}

/// Default CSV directory: `_ignore` beside the GeoPackage's parent directory.
fn default_output_dir(gpkg: &Path) -> PathBuf {
    gpkg.parent()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""))
        .join("_ignore")
}

/// Dump the first feature layer of a GeoPackage to `<stem>.csv`, geometry as WKT.
pub fn export_layer_to_csv(gpkg: &Path, output_dir: Option<&Path>) -> Result<CsvExport> {
    require_exists(gpkg)?;
    if !gpkg.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gpkg")) {
        bail!("File is not a GeoPackage (.gpkg): {}", gpkg.display());
    }

    let output_dir = output_dir.map_or_else(|| default_output_dir(gpkg), Path::to_path_buf);
    ensure_dir_exists(&output_dir)?;

    let table = read_feature_table(gpkg, None)?;
    let mut df = table.to_dataframe("geometry")
        .with_context(|| format!("Failed to tabulate layer {:?}", table.layer))?;

    let stem = gpkg.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let path = output_dir.join(format!("{stem}.csv"));
    write_csv(&mut df, &path)?;

    let names = df.get_column_names();
    let preview = names.iter().take(5).map(|n| n.as_str()).collect::<Vec<_>>().join(", ");
    info!("exported {}", path.display());
    info!("  rows: {}", df.height());
    info!("  columns: {}", df.width());
    info!("  column names: {preview}{}", if names.len() > 5 { "..." } else { "" });

    Ok(CsvExport { path, rows: df.height(), columns: df.width() })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::ProfileError;

    #[test]
    fn default_dir_sits_beside_parent() {
        assert_eq!(default_output_dir(Path::new("project/Output_Files/out.gpkg")), PathBuf::from("project/_ignore"));
        assert_eq!(default_output_dir(Path::new("out.gpkg")), PathBuf::from("_ignore"));
    }

    #[test]
    fn rejects_non_geopackage_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.csv");
        fs::write(&path, "a\n1\n").unwrap();
        assert!(export_layer_to_csv(&path, None).is_err());
    }

    #[test]
    fn missing_input_is_reported() {
        let err = export_layer_to_csv(Path::new("/no/such/file.gpkg"), None).unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::MissingFile(_))));
    }
}
