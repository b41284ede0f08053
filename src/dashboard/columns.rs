use std::cmp::Ordering;

use tracing::warn;

use crate::io::FeatureTable;

/// How a display column is summarized and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnRole {
    Corridor,
    CorridorName,
    Miles,
    Volume,
    TruckPercentage,
    Tons,
    Count,
    Cost,
}

/// Profile layer column, dashboard display name, role.
pub(crate) const DISPLAY_COLUMNS: [(&str, &str, ColumnRole); 21] = [
    ("HWY", "Corridor", ColumnRole::Corridor),
    ("Corridor", "Corridor_Name", ColumnRole::CorridorName),
    ("Total_Miles", TOTAL_MILES, ColumnRole::Miles),
    ("two_L_miles", "2_Lanes_mi", ColumnRole::Miles),
    ("four_U_plus_miles", "4_Lanes_Undivided_mi", ColumnRole::Miles),
    ("four_D_plus_miles", "4+_Lanes_Divided_mi", ColumnRole::Miles),
    ("AADT", AADT, ColumnRole::Volume),
    ("Truck_AADT", TRUCK_AADT, ColumnRole::Volume),
    ("Truck_percentage", "Truck_Percentage", ColumnRole::TruckPercentage),
    ("Tons", "Tons", ColumnRole::Tons),
    ("Number_Of_Crashes", "Number_of_Crashes", ColumnRole::Count),
    ("Number_Of_Fatal_Crashes", "Number_of_Fatal_Crashes", ColumnRole::Count),
    ("Projects_Construction", "Construction_Num_Projects", ColumnRole::Count),
    ("Project_Cost_Construction", "Construction_Est_Cost", ColumnRole::Cost),
    ("Projects_Funded", "Funded_Num_Projects", ColumnRole::Count),
    ("Project_Cost_Funded", "Funded_Est_Cost", ColumnRole::Cost),
    ("Projects_PartialFunded", "PartialFunded_Num_Projects", ColumnRole::Count),
    ("Project_Cost_PartialFunded", "PartialFunded_Est_Cost", ColumnRole::Cost),
    ("Project_FundingGap_PartialFunded", "PartialFunded_Funding_Gap", ColumnRole::Cost),
    ("Projects_Unfunded", "Unfunded_Num_Projects", ColumnRole::Count),
    ("Project_Cost_Unfunded", "Unfunded_Est_Cost", ColumnRole::Cost),
];

pub(crate) const TOTAL_MILES: &str = "Total_Corridor_Length_mi";
pub(crate) const AADT: &str = "AADT";
pub(crate) const TRUCK_AADT: &str = "Truck_AADT";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

/// One dashboard column, rows in display order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DisplayColumn {
    pub name: &'static str,
    pub role: ColumnRole,
    pub data: ColumnData,
}

impl DisplayColumn {
    pub(crate) fn numbers(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Number(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }
}

/// Find a display column by name.
pub(crate) fn find<'a>(columns: &'a [DisplayColumn], name: &str) -> Option<&'a DisplayColumn> {
    columns.iter().find(|c| c.name == name)
}

/// Map profile columns to display columns, warning about any that are
/// missing, and order rows by `Order` (or corridor when there is none).
pub(crate) fn display_columns(table: &FeatureTable) -> Vec<DisplayColumn> {
    let missing = DISPLAY_COLUMNS.iter()
        .filter(|(source, ..)| table.column_index(source).is_none())
        .map(|(source, ..)| *source)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        warn!("profile layer is missing columns: {}", missing.join(", "));
    }

    let mut columns = DISPLAY_COLUMNS.iter()
        .filter_map(|&(source, name, role)| {
            let data = match role {
                ColumnRole::Corridor | ColumnRole::CorridorName => ColumnData::Text(table.text_column(source)?),
                _ => ColumnData::Number(table.f64_column(source)?),
            };
            Some(DisplayColumn { name, role, data })
        })
        .collect::<Vec<_>>();

    if find(&columns, "Corridor").is_some() {
        let order = match table.f64_column("Order") {
            Some(order) => sort_permutation(&order, |a, b| cmp_nulls_last(a, b, |x, y| x.total_cmp(y))),
            None => {
                let names = table.text_column("HWY").unwrap_or_default();
                sort_permutation(&names, |a, b| cmp_nulls_last(a, b, |x, y| x.cmp(y)))
            }
        };
        for column in &mut columns {
            column.data = match &column.data {
                ColumnData::Text(values) => ColumnData::Text(order.iter().map(|&i| values[i].clone()).collect()),
                ColumnData::Number(values) => ColumnData::Number(order.iter().map(|&i| values[i]).collect()),
            };
        }
    }

    columns
}

fn cmp_nulls_last<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sorting permutation of `keys`.
fn sort_permutation<T>(keys: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<usize> {
    let mut order = (0..keys.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| cmp(&keys[a], &keys[b]));
    order
}
