use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame};
use tracing::{debug, info};

use super::{
    columns::{AADT, ColumnData, ColumnRole, DisplayColumn, TOTAL_MILES, TRUCK_AADT, display_columns},
    format,
    summary::{append_summary, summary_row},
};
use crate::{
    common::{ensure_dir_exists, require_exists},
    io::{csv::write_csv, read_feature_table},
};

const RAW_FILE: &str = "Raw_Data.csv";
const FORMATTED_FILE: &str = "Formatted_Display.csv";

/// Files written by [`validate_dashboard`] and the summary row's numeric values.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    /// Corridor rows, not counting the summary row.
    pub corridors: usize,
    pub raw_csv: PathBuf,
    pub formatted_csv: PathBuf,
    /// Display column name and summary value, for numeric columns.
    pub summary: Vec<(String, Option<f64>)>,
}

impl DashboardReport {
    pub fn summary_value(&self, column: &str) -> Option<f64> {
        self.summary.iter().find(|(name, _)| name == column).and_then(|(_, value)| *value)
    }
}

fn raw_frame(columns: &[DisplayColumn]) -> Result<DataFrame> {
    let columns = columns.iter()
        .map(|column| match &column.data {
            ColumnData::Text(values) => Column::new(column.name.into(), values.clone()),
            ColumnData::Number(values) => Column::new(column.name.into(), values.clone()),
        })
        .collect::<Vec<_>>();
    Ok(DataFrame::new(columns)?)
}

fn formatted_frame(columns: &[DisplayColumn]) -> Result<DataFrame> {
    let columns = columns.iter()
        .map(|column| {
            let cells = match &column.data {
                ColumnData::Text(values) => values.iter().map(|v| v.clone().unwrap_or_default()).collect::<Vec<_>>(),
                ColumnData::Number(values) => {
                    let display: fn(Option<f64>) -> String = match column.role {
                        ColumnRole::Miles => format::miles,
                        ColumnRole::Volume => format::volume,
                        ColumnRole::TruckPercentage => format::percent,
                        ColumnRole::Tons => format::compact_number,
                        ColumnRole::Cost => format::currency,
                        ColumnRole::Count | ColumnRole::Corridor | ColumnRole::CorridorName => format::count,
                    };
                    values.iter().copied().map(display).collect()
                }
            };
            Column::new(column.name.into(), cells)
        })
        .collect::<Vec<_>>();
    Ok(DataFrame::new(columns)?)
}

fn log_summary(report: &DashboardReport) {
    let value = |name: &str| report.summary_value(name);
    info!("dashboard summary for {} corridors", report.corridors);
    info!("  total corridor length: {}", format::miles(value(TOTAL_MILES)));
    info!("  weighted AADT: {}", format::volume(value(AADT)));
    info!("  weighted truck AADT: {}", format::volume(value(TRUCK_AADT)));
    info!("  truck percentage: {}", format::percent(value("Truck_Percentage")));
    info!("  crashes: {} ({} fatal)",
        format::count(value("Number_of_Crashes")), format::count(value("Number_of_Fatal_Crashes")));
    for bucket in ["Construction", "Funded", "PartialFunded", "Unfunded"] {
        info!("  {bucket}: {} projects, {}",
            format::count(value(&format!("{bucket}_Num_Projects"))),
            format::currency(value(&format!("{bucket}_Est_Cost"))));
    }
}

/// Read a profile GeoPackage and write the dashboard's raw and formatted
/// tables, each ending with an "all corridors" summary row.
///
/// Outputs go to `output_dir`, or beside the GeoPackage when none is given.
pub fn validate_dashboard(gpkg: &Path, output_dir: Option<&Path>) -> Result<DashboardReport> {
    require_exists(gpkg)?;
    let output_dir = output_dir.map_or_else(
        || gpkg.parent().unwrap_or(Path::new("")).to_path_buf(),
        Path::to_path_buf);
    if !output_dir.as_os_str().is_empty() {
        ensure_dir_exists(&output_dir)?;
    }

    let table = read_feature_table(gpkg, None)?;
    info!("loaded {} corridors from {}", table.len(), gpkg.display());
    let mut available = table.column_names();
    available.sort();
    debug!("available columns: {}", available.join(", "));

    let mut columns = display_columns(&table);
    let summary = summary_row(&columns);
    append_summary(&mut columns, summary);

    let raw_csv = output_dir.join(RAW_FILE);
    let mut raw = raw_frame(&columns)?;
    write_csv(&mut raw, &raw_csv).context("Failed to write raw dashboard data")?;
    info!("wrote {}", raw_csv.display());

    let formatted_csv = output_dir.join(FORMATTED_FILE);
    let mut formatted = formatted_frame(&columns)?;
    write_csv(&mut formatted, &formatted_csv).context("Failed to write formatted dashboard data")?;
    info!("wrote {}", formatted_csv.display());

    let summary = columns.iter()
        .filter_map(|column| column.numbers().map(|values| (column.name.to_string(), values.last().copied().flatten())))
        .collect();
    let report = DashboardReport { corridors: table.len(), raw_csv, formatted_csv, summary };
    log_summary(&report);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusqlite::types::Value;

    use super::*;
    use crate::io::{FeatureTable, Field, FieldKind, write_feature_table};

    fn profile_layer(path: &Path) {
        let fields = [
            ("HWY", FieldKind::Text), ("Corridor", FieldKind::Text), ("Order", FieldKind::Real),
            ("Total_Miles", FieldKind::Real), ("AADT", FieldKind::Real), ("Truck_AADT", FieldKind::Real),
            ("Projects_Funded", FieldKind::Real), ("Project_Cost_Funded", FieldKind::Real),
        ];
        let mut table = FeatureTable::new("profiles", None,
            fields.iter().map(|&(name, kind)| Field::new(name, kind)).collect());
        table.push(vec![
            Value::Text("US0287".into()), Value::Text("US 287".into()), Value::Real(2.0),
            Value::Real(30.0), Value::Real(10_000.0), Value::Real(1_000.0), Value::Real(0.0), Value::Real(0.0),
        ], None).unwrap();
        table.push(vec![
            Value::Text("IH0035W".into()), Value::Text("I-35W".into()), Value::Real(1.0),
            Value::Real(10.0), Value::Real(20_000.0), Value::Real(4_000.0), Value::Real(1.0), Value::Real(1_500_000.0),
        ], None).unwrap();
        write_feature_table(&table, path).unwrap();
    }

    #[test]
    fn writes_raw_and_formatted_tables() {
        let dir = tempfile::tempdir().unwrap();
        let gpkg = dir.path().join("profiles.gpkg");
        profile_layer(&gpkg);

        let report = validate_dashboard(&gpkg, None).unwrap();
        assert_eq!(report.corridors, 2);
        assert_eq!(report.raw_csv, dir.path().join(RAW_FILE));
        assert_eq!(report.summary_value(TOTAL_MILES), Some(40.0));
        assert_eq!(report.summary_value(AADT), Some(12_500.0));
        assert_eq!(report.summary_value("Truck_Percentage"), Some(14.0));
        assert_eq!(report.summary_value("Funded_Num_Projects"), Some(1.0));

        let formatted = fs::read_to_string(&report.formatted_csv).unwrap();
        let lines = formatted.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Corridor,Corridor_Name,Total_Corridor_Length_mi,AADT,Truck_AADT"));
        assert!(lines[1].starts_with("IH0035W,I-35W,10.0 mi"));
        assert!(lines[1].contains("$1.5M"));
        assert!(lines[3].starts_with("TOTAL (All Corridors),All Corridors Summary,40.0 mi"));
    }

    #[test]
    fn missing_geopackage_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_dashboard(&dir.path().join("none.gpkg"), Some(dir.path())).is_err());
        assert!(!dir.path().join(RAW_FILE).exists());
    }
}
