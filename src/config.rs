use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Inputs, output and sheet layout for one pipeline run.
/// Every field has a default, so a config file only names what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Corridor registry workbook (first sheet is read).
    pub registry: PathBuf,
    /// Segment layer: GeoPackage or shapefile.
    pub segments: PathBuf,
    /// Funding tracker workbook.
    pub funding: PathBuf,
    /// Output GeoPackage.
    pub output: PathBuf,
    /// Output layer name.
    pub layer: String,
    /// Projected CRS used for segment lengths.
    pub length_epsg: u32,
    pub construction_sheet: String,
    pub utp_sheet: String,
    /// Zero-based row holding the UTP sheet's header.
    pub utp_header_row: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("Input_Files/FTW_Corridors.csv"),
            segments: PathBuf::from("Input_Files/raptor_results_FTW.gpkg"),
            funding: PathBuf::from("Input_Files/FTW District Project Tracker - Master"),
            output: PathBuf::from("Output_Files/FTW_Corridor_Profiles.gpkg"),
            layer: "FTW_Corridor_Profiles".to_string(),
            length_epsg: 2276,
            construction_sheet: "Under_Construction_June2025".to_string(),
            utp_sheet: "UTP2026_TxC_Projects_Review".to_string(),
            utp_header_row: 1,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid pipeline config")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = PipelineConfig::from_json_str(r#"{ "layer": "Profiles", "utp_header_row": 0 }"#).unwrap();
        assert_eq!(config.layer, "Profiles");
        assert_eq!(config.utp_header_row, 0);
        assert_eq!(config.length_epsg, 2276);
        assert_eq!(config.construction_sheet, "Under_Construction_June2025");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(PipelineConfig::from_json_str("{ layer: }").is_err());
    }
}
