use ahash::AHashMap;
use anyhow::{Context, Result};
use polars::frame::DataFrame;
use tracing::{info, warn};

use crate::{
    error::ProfileError,
    io::{SheetSource, csv::{column_names, f64_values, str_values}, read_first_sheet},
};

/// Registry columns that must be present.
pub(crate) const REGISTRY_COLUMNS: [&str; 6] = ["Order", "HWY_Code", "HWY_Description", "Corridor", "HWY_Label", "HWY_Shield"];

/// One target corridor from the registry sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorDefinition {
    /// Unique key; matches a segment's highway code.
    pub label: String,
    pub code: Option<String>,
    /// Display sort key.
    pub order: Option<f64>,
    pub description: Option<String>,
    /// Highway shield image URL.
    pub shield_reference: Option<String>,
    /// Display grouping, also the funding tracker's "Highway" name.
    pub corridor_name: Option<String>,
}

/// The corridor registry, keyed by label.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    corridors: Vec<CorridorDefinition>,
    index: AHashMap<String, usize>,
    names: AHashMap<String, String>,
}

impl Registry {
    /// Build a registry; labels must be unique. A corridor name claimed by
    /// several labels maps to the last one.
    pub fn new(source_name: &str, corridors: Vec<CorridorDefinition>) -> Result<Self> {
        ProfileError::check_unique(source_name, "HWY_Label", corridors.iter().map(|c| c.label.as_str()))?;

        let index = corridors.iter().enumerate()
            .map(|(i, c)| (c.label.clone(), i))
            .collect();

        let mut names = AHashMap::new();
        for corridor in &corridors {
            let Some(name) = &corridor.corridor_name else { continue };
            if let Some(previous) = names.insert(name.clone(), corridor.label.clone()) {
                if previous != corridor.label {
                    warn!("corridor {name:?} maps to both {previous:?} and {:?}; using {:?}", corridor.label, corridor.label);
                }
            }
        }

        Ok(Self { corridors, index, names })
    }

    /// Load the registry from the first sheet of a workbook.
    pub fn from_workbook(source: &dyn SheetSource) -> Result<Self> {
        let df = read_first_sheet(source)
            .with_context(|| format!("Failed to read corridor registry {}", source.location()))?;
        let registry = Self::from_dataframe(&source.location(), &df)?;
        info!("found {} target corridors", registry.len());
        Ok(registry)
    }

    fn from_dataframe(source_name: &str, df: &DataFrame) -> Result<Self> {
        ProfileError::check_columns(source_name, &column_names(df), &REGISTRY_COLUMNS)?;

        let labels = str_values(df, "HWY_Label")?;
        let codes = str_values(df, "HWY_Code")?;
        let orders = f64_values(df, "Order")?;
        let descriptions = str_values(df, "HWY_Description")?;
        let shields = str_values(df, "HWY_Shield")?;
        let names = str_values(df, "Corridor")?;

        let corridors = (0..df.height())
            .filter_map(|i| {
                let label = labels[i].clone()?;
                Some(CorridorDefinition {
                    label,
                    code: codes[i].clone(),
                    order: orders[i],
                    description: descriptions[i].clone(),
                    shield_reference: shields[i].clone(),
                    corridor_name: names[i].clone(),
                })
            })
            .collect();

        Self::new(source_name, corridors)
    }

    #[inline] pub fn len(&self) -> usize { self.corridors.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.corridors.is_empty() }

    pub fn corridors(&self) -> &[CorridorDefinition] { &self.corridors }

    pub fn get(&self, label: &str) -> Option<&CorridorDefinition> {
        self.index.get(label).map(|&i| &self.corridors[i])
    }

    #[inline] pub fn contains(&self, label: &str) -> bool { self.index.contains_key(label) }

    /// Corridor label for a funding tracker "Highway" name.
    pub fn label_for_corridor(&self, corridor_name: &str) -> Option<&str> {
        self.names.get(corridor_name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemWorkbook;

    const REGISTRY: &str = "\
Order,HWY_Code,HWY_Description,Corridor,HWY_Label,HWY_Shield
2,IH 35W,Interstate 35W,IH 35W,IH0035W,https://example.org/i35w.svg
1,SH 114,State Highway 114,SH 114,SH0114,
,,,,,
";

    #[test]
    fn loads_first_sheet() {
        let workbook = MemWorkbook::new("registry").with_sheet("Sheet1", REGISTRY);
        let registry = Registry::from_workbook(&workbook).unwrap();

        assert_eq!(registry.len(), 2);
        let sh114 = registry.get("SH0114").unwrap();
        assert_eq!(sh114.order, Some(1.0));
        assert_eq!(sh114.shield_reference, None);
        assert_eq!(registry.label_for_corridor("IH 35W"), Some("IH0035W"));
        assert!(!registry.contains("US0287"));
    }

    #[test]
    fn missing_columns_are_reported() {
        let workbook = MemWorkbook::new("registry").with_sheet("Sheet1", "Order,HWY_Label\n1,IH0035W\n");
        let err = Registry::from_workbook(&workbook).unwrap_err();
        match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, &["HWY_Code", "HWY_Description", "Corridor", "HWY_Shield"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let csv = "Order,HWY_Code,HWY_Description,Corridor,HWY_Label,HWY_Shield\n1,a,a,A,X,\n2,b,b,B,X,\n";
        let workbook = MemWorkbook::new("registry").with_sheet("Sheet1", csv);
        let err = Registry::from_workbook(&workbook).unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::DuplicateKeys { .. })));
    }

    #[test]
    fn shared_corridor_name_maps_to_last_label() {
        let corridor = |label: &str| CorridorDefinition {
            label: label.to_string(),
            code: None,
            order: None,
            description: None,
            shield_reference: None,
            corridor_name: Some("Loop 820".to_string()),
        };
        let registry = Registry::new("test", vec![corridor("IH0820N"), corridor("IH0820S")]).unwrap();
        assert_eq!(registry.label_for_corridor("Loop 820"), Some("IH0820S"));
    }
}
