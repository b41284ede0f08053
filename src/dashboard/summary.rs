use tracing::debug;

use super::columns::{AADT, ColumnData, ColumnRole, DisplayColumn, TOTAL_MILES, TRUCK_AADT, find};
use crate::common::round_to;

pub(crate) const SUMMARY_CORRIDOR: &str = "TOTAL (All Corridors)";
pub(crate) const SUMMARY_NAME: &str = "All Corridors Summary";

/// A single summary cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SummaryCell {
    Text(&'static str),
    Number(Option<f64>),
}

fn sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Mean of `values` weighted by `miles` over rows where `include` holds;
/// zero when no row qualifies.
fn weighted_mean(values: &[Option<f64>], miles: &[Option<f64>], include: impl Fn(usize) -> bool) -> f64 {
    let (weighted, total) = values.iter().zip(miles).enumerate()
        .filter(|&(i, _)| include(i))
        .fold((0.0, 0.0), |(weighted, total), (_, (value, miles))| {
            let miles = miles.unwrap_or(0.0);
            (weighted + value.unwrap_or(0.0) * miles, total + miles)
        });
    if total > 0.0 { weighted / total } else { 0.0 }
}

fn positive(values: &[Option<f64>], i: usize) -> bool {
    values[i].is_some_and(|v| v > 0.0)
}

/// Length-weighted volume over segments with a positive value and length.
fn weighted_volume(values: &[Option<f64>], miles: &[Option<f64>]) -> f64 {
    round_to(weighted_mean(values, miles, |i| positive(values, i) && positive(miles, i)), 0)
}

/// Summary cell for every display column, in column order.
pub(crate) fn summary_row(columns: &[DisplayColumn]) -> Vec<SummaryCell> {
    let numbers = |name: &str| find(columns, name).and_then(DisplayColumn::numbers);
    let miles = numbers(TOTAL_MILES);

    let aadt = miles.zip(numbers(AADT)).map(|(miles, values)| weighted_volume(values, miles));
    let truck = miles.zip(numbers(TRUCK_AADT)).map(|(miles, values)| weighted_volume(values, miles));
    let truck_percentage = aadt.zip(truck)
        .map(|(aadt, truck)| if aadt > 0.0 { round_to(truck / aadt * 100.0, 1) } else { 0.0 });

    columns.iter()
        .map(|column| {
            let values = match &column.data {
                ColumnData::Number(values) => values.as_slice(),
                ColumnData::Text(_) => &[],
            };
            match column.role {
                ColumnRole::Corridor => SummaryCell::Text(SUMMARY_CORRIDOR),
                ColumnRole::CorridorName => SummaryCell::Text(SUMMARY_NAME),
                ColumnRole::Miles | ColumnRole::Cost => SummaryCell::Number(Some(round_to(sum(values), 1))),
                ColumnRole::Count => SummaryCell::Number(Some(sum(values).trunc())),
                ColumnRole::Volume if column.name == AADT => SummaryCell::Number(aadt),
                ColumnRole::Volume => SummaryCell::Number(truck),
                ColumnRole::TruckPercentage => SummaryCell::Number(truck_percentage),
                ColumnRole::Tons => SummaryCell::Number(miles.map(|miles| {
                    let Some(truck) = numbers(TRUCK_AADT) else { return 0.0 };
                    round_to(weighted_mean(values, miles, |i| positive(truck, i) && positive(miles, i)), 1)
                })),
            }
        })
        .inspect(|cell| debug!("summary cell: {cell:?}"))
        .collect()
}

/// Append the summary row to every column.
pub(crate) fn append_summary(columns: &mut [DisplayColumn], row: Vec<SummaryCell>) {
    for (column, cell) in columns.iter_mut().zip(row) {
        match (&mut column.data, cell) {
            (ColumnData::Text(values), SummaryCell::Text(text)) => values.push(Some(text.to_string())),
            (ColumnData::Number(values), SummaryCell::Number(value)) => values.push(value),
            (ColumnData::Text(values), SummaryCell::Number(value)) => values.push(value.map(|v| v.to_string())),
            (ColumnData::Number(values), SummaryCell::Text(_)) => values.push(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(name: &'static str, role: ColumnRole, values: &[Option<f64>]) -> DisplayColumn {
        DisplayColumn { name, role, data: ColumnData::Number(values.to_vec()) }
    }

    fn columns() -> Vec<DisplayColumn> {
        vec![
            DisplayColumn {
                name: "Corridor",
                role: ColumnRole::Corridor,
                data: ColumnData::Text(vec![Some("IH0035W".into()), Some("US0287".into()), Some("SH0114".into())]),
            },
            number(TOTAL_MILES, ColumnRole::Miles, &[Some(10.0), Some(30.0), Some(5.0)]),
            number(AADT, ColumnRole::Volume, &[Some(20_000.0), Some(10_000.0), Some(0.0)]),
            number(TRUCK_AADT, ColumnRole::Volume, &[Some(4_000.0), Some(1_000.0), None]),
            number("Truck_Percentage", ColumnRole::TruckPercentage, &[Some(20.0), Some(10.0), None]),
            number("Tons", ColumnRole::Tons, &[Some(50.0), None, Some(99.0)]),
            number("Number_of_Crashes", ColumnRole::Count, &[Some(3.0), Some(4.0), None]),
            number("Funded_Est_Cost", ColumnRole::Cost, &[Some(1.25), Some(2.5), Some(0.0)]),
        ]
    }

    #[test]
    fn summary_weights_by_corridor_length() {
        let row = summary_row(&columns());
        assert_eq!(row, vec![
            SummaryCell::Text(SUMMARY_CORRIDOR),
            SummaryCell::Number(Some(45.0)),
            // (20000*10 + 10000*30) / 40; the zero-volume corridor is excluded
            SummaryCell::Number(Some(12_500.0)),
            // (4000*10 + 1000*30) / 40
            SummaryCell::Number(Some(1_750.0)),
            SummaryCell::Number(Some(14.0)),
            // tons of a truck corridor without a value count as zero: 50*10 / 40
            SummaryCell::Number(Some(12.5)),
            SummaryCell::Number(Some(7.0)),
            SummaryCell::Number(Some(3.8)),
        ]);
    }

    #[test]
    fn volumes_without_lengths_are_not_summarized() {
        let columns = columns().into_iter().filter(|c| c.name != TOTAL_MILES).collect::<Vec<_>>();
        let row = summary_row(&columns);
        assert_eq!(row[1], SummaryCell::Number(None));
        assert_eq!(row[3], SummaryCell::Number(None));
        assert_eq!(row[4], SummaryCell::Number(None));
    }

    #[test]
    fn summary_row_is_appended() {
        let mut columns = columns();
        let row = summary_row(&columns);
        append_summary(&mut columns, row);
        assert_eq!(columns[0].data, ColumnData::Text(vec![
            Some("IH0035W".into()), Some("US0287".into()), Some("SH0114".into()), Some(SUMMARY_CORRIDOR.into()),
        ]));
        assert_eq!(columns[1].numbers().unwrap()[3], Some(45.0));
    }
}
