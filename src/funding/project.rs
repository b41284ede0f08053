use anyhow::{Context, Result};
use polars::frame::DataFrame;
use tracing::info;

use super::FundingBucket;
use crate::{
    error::ProfileError,
    io::{SheetSource, csv::{column_names, f64_values, str_values}, read_sheet},
};

pub(crate) const CONSTRUCTION_COLUMNS: [&str; 3] = ["Highway", "CSJ", "Construction Cost/Estimate"];
pub(crate) const UTP_COLUMNS: [&str; 5] = ["Highway", "CSJ", "Funding Status (UTP 2026)", "Construction Cost", "Funding Gap"];

/// Long header the UTP sheet uses for its CSJ column.
const UTP_CSJ_ALIAS: &str = "TxDOT CONNECT CSJ (highlighted projects are in UTP)";

/// One funding tracker row.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingProject {
    /// Control-section-job number; blank on some tracker rows.
    pub csj: Option<String>,
    /// Tracker "Highway" name, mapped to a corridor through the registry.
    pub corridor_name: Option<String>,
    /// `None` when the status matches no bucket.
    pub bucket: Option<FundingBucket>,
    pub cost: Option<f64>,
    pub funding_gap: Option<f64>,
}

/// Read both tracker sheets: projects under construction and the UTP review.
pub(crate) fn load_funding_projects(
    source: &dyn SheetSource,
    construction_sheet: &str,
    utp_sheet: &str,
    utp_header_row: usize,
) -> Result<Vec<FundingProject>> {
    let name = |sheet: &str| format!("{} [{sheet}]", source.location());

    info!("reading {construction_sheet} sheet");
    let df = read_sheet(source, construction_sheet, 0)?;
    let mut projects = construction_projects(&name(construction_sheet), &df)?;
    info!("found {} projects under construction", projects.len());

    info!("reading {utp_sheet} sheet");
    let mut df = read_sheet(source, utp_sheet, utp_header_row)?;
    let utp = utp_projects(&name(utp_sheet), &mut df)?;
    info!("found {} UTP projects", utp.len());

    projects.extend(utp);
    Ok(projects)
}

/// Error on any CSJ repeated within one sheet; blank CSJs are ignored.
fn check_unique_csj(source_name: &str, csjs: &[Option<String>]) -> Result<(), ProfileError> {
    ProfileError::check_unique(source_name, "CSJ", csjs.iter().flatten().map(String::as_str))
}

fn construction_projects(source_name: &str, df: &DataFrame) -> Result<Vec<FundingProject>> {
    ProfileError::check_columns(source_name, &column_names(df), &CONSTRUCTION_COLUMNS)?;

    let csjs = str_values(df, "CSJ")?;
    check_unique_csj(source_name, &csjs)?;
    let highways = str_values(df, "Highway")?;
    let costs = f64_values(df, "Construction Cost/Estimate")?;

    Ok(csjs.into_iter().zip(highways).zip(costs)
        .map(|((csj, corridor_name), cost)| FundingProject {
            csj,
            corridor_name,
            bucket: Some(FundingBucket::Construction),
            cost,
            funding_gap: None,
        })
        .collect())
}

fn utp_projects(source_name: &str, df: &mut DataFrame) -> Result<Vec<FundingProject>> {
    let columns = column_names(df);
    if columns.iter().any(|c| c == UTP_CSJ_ALIAS) && !columns.iter().any(|c| c == "CSJ") {
        df.rename(UTP_CSJ_ALIAS, "CSJ".into())
            .context("Failed to rename UTP CSJ column")?;
    }
    ProfileError::check_columns(source_name, &column_names(df), &UTP_COLUMNS)?;

    let csjs = str_values(df, "CSJ")?;
    check_unique_csj(source_name, &csjs)?;
    let highways = str_values(df, "Highway")?;
    let statuses = str_values(df, "Funding Status (UTP 2026)")?;
    let costs = f64_values(df, "Construction Cost")?;
    let gaps = f64_values(df, "Funding Gap")?;

    Ok(csjs.into_iter().enumerate()
        .map(|(i, csj)| FundingProject {
            csj,
            corridor_name: highways[i].clone(),
            bucket: statuses[i].as_deref().and_then(FundingBucket::from_status),
            cost: costs[i],
            funding_gap: gaps[i],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemWorkbook;

    const CONSTRUCTION: &str = "\
Highway,CSJ,Construction Cost/Estimate
IH 35W,0014-16-001,12.5
SH 114,,3.0
";

    const UTP: &str = "\
UTP 2026 review,,,,
Highway,TxDOT CONNECT CSJ (highlighted projects are in UTP),Funding Status (UTP 2026),Construction Cost,Funding Gap
IH 35W,0014-16-002, Funded ,5.0,0
IH 35W,0014-16-003,Partially Funded,8.0,2.5
";

    fn tracker(construction: &str) -> MemWorkbook {
        MemWorkbook::new("tracker")
            .with_sheet("Under_Construction_June2025", construction)
            .with_sheet("UTP2026_TxC_Projects_Review", UTP)
    }

    #[test]
    fn reads_both_sheets() {
        let projects = load_funding_projects(&tracker(CONSTRUCTION), "Under_Construction_June2025", "UTP2026_TxC_Projects_Review", 1).unwrap();

        assert_eq!(projects.len(), 4);
        assert_eq!(projects[0].bucket, Some(FundingBucket::Construction));
        assert_eq!(projects[0].cost, Some(12.5));
        // Rows without a CSJ are kept so their cost still counts.
        assert_eq!(projects[1].csj, None);
        assert_eq!(projects[1].cost, Some(3.0));
        assert_eq!(projects[2].csj.as_deref(), Some("0014-16-002"));
        assert_eq!(projects[2].bucket, Some(FundingBucket::Funded));
        assert_eq!(projects[3].bucket, Some(FundingBucket::PartiallyFunded));
        assert_eq!(projects[3].funding_gap, Some(2.5));
    }

    #[test]
    fn duplicate_csj_names_key_and_count() {
        let construction = "Highway,CSJ,Construction Cost/Estimate\nIH 35W,0014-16-001,1\nSH 114,0014-16-001,2\n";
        let err = load_funding_projects(&tracker(construction), "Under_Construction_June2025", "UTP2026_TxC_Projects_Review", 1).unwrap_err();
        match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::DuplicateKeys { column, duplicates, .. }) => {
                assert_eq!(column, "CSJ");
                assert_eq!(duplicates, &vec![("0014-16-001".to_string(), 2)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let workbook = MemWorkbook::new("tracker").with_sheet("Under_Construction_June2025", CONSTRUCTION);
        let err = load_funding_projects(&workbook, "Under_Construction_June2025", "UTP2026_TxC_Projects_Review", 1).unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::MissingSheet { .. })));
    }

    #[test]
    fn missing_utp_columns_are_reported() {
        let workbook = MemWorkbook::new("tracker")
            .with_sheet("Under_Construction_June2025", CONSTRUCTION)
            .with_sheet("UTP2026_TxC_Projects_Review", "title\nHighway,CSJ\nIH 35W,1\n");
        let err = load_funding_projects(&workbook, "Under_Construction_June2025", "UTP2026_TxC_Projects_Review", 1).unwrap_err();
        match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, &["Funding Status (UTP 2026)", "Construction Cost", "Funding Gap"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
