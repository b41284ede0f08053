use std::path::Path;

use anyhow::Result;
use rusqlite::types::Value;
use tracing::{info, warn};

use crate::{
    common::round_to,
    funding::FundingBucket,
    io::{FeatureTable, Field, FieldKind, SpatialRef, write_feature_table},
    profile::{CorridorProfile, class_column},
};

/// Registry attributes, in output order.
const REGISTRY_FIELDS: [(&str, FieldKind); 5] = [
    ("Order", FieldKind::Real),
    ("HWY_Code", FieldKind::Text),
    ("HWY_Description", FieldKind::Text),
    ("Corridor", FieldKind::Text),
    ("HWY_Shield", FieldKind::Text),
];

/// Computed columns ahead of the cross-section columns.
const METRIC_FIELDS: [(&str, FieldKind); 7] = [
    ("HWY", FieldKind::Text),
    ("Number_Of_Crashes", FieldKind::Real),
    ("Number_Of_Fatal_Crashes", FieldKind::Real),
    ("AADT", FieldKind::Real),
    ("Truck_AADT", FieldKind::Real),
    ("Tons", FieldKind::Real),
    ("Truck_percentage", FieldKind::Real),
];

#[inline]
fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

#[inline]
fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

/// Cross-section output columns with the classes feeding each, in class
/// order. Classes whose sanitized names collide share one column.
fn class_columns(profiles: &[CorridorProfile]) -> Vec<(String, Vec<&str>)> {
    let mut classes = profiles.iter()
        .flat_map(|p| p.cross_sections.keys().map(String::as_str))
        .collect::<Vec<_>>();
    classes.sort_unstable();
    classes.dedup();

    let mut columns: Vec<(String, Vec<&str>)> = Vec::new();
    for class in classes {
        let name = class_column(class);
        match columns.iter_mut().find(|(column, _)| *column == name) {
            Some((_, members)) => {
                warn!("cross-section classes {members:?} and {class:?} share column {name}; summing");
                members.push(class);
            }
            None => columns.push((name, vec![class])),
        }
    }
    columns
}

/// Densify profiles into the output layer: registry attributes, computed
/// metrics, one column per cross-section class, total miles, funding
/// buckets, then geometry. Counts and costs are stored as REAL.
pub fn profiles_to_table(profiles: &[CorridorProfile], layer: &str, srs: Option<SpatialRef>) -> FeatureTable {
    let class_columns = class_columns(profiles);

    let mut fields = REGISTRY_FIELDS.iter()
        .chain(METRIC_FIELDS.iter())
        .map(|&(name, kind)| Field::new(name, kind))
        .collect::<Vec<_>>();
    fields.extend(class_columns.iter().map(|(name, _)| Field::new(name.clone(), FieldKind::Real)));
    fields.push(Field::new("Total_Miles", FieldKind::Real));
    for bucket in FundingBucket::ALL {
        fields.push(Field::new(format!("Projects_{}", bucket.suffix()), FieldKind::Real));
        fields.push(Field::new(format!("Project_Cost_{}", bucket.suffix()), FieldKind::Real));
        if bucket == FundingBucket::PartiallyFunded {
            fields.push(Field::new(format!("Project_FundingGap_{}", bucket.suffix()), FieldKind::Real));
        }
    }

    let mut table = FeatureTable::new(layer, srs, fields);
    for profile in profiles {
        let definition = profile.definition.as_ref();
        let metrics = &profile.metrics;

        let mut row = vec![
            real(definition.and_then(|d| d.order).map(|o| round_to(o, 0))),
            text(definition.and_then(|d| d.code.as_deref())),
            text(definition.and_then(|d| d.description.as_deref())),
            text(definition.and_then(|d| d.corridor_name.as_deref())),
            text(definition.and_then(|d| d.shield_reference.as_deref())),
            Value::Text(profile.highway_code.clone()),
            Value::Real(metrics.crash_count as f64),
            Value::Real(metrics.fatal_crash_count as f64),
            real(metrics.traffic_volume),
            real(metrics.truck_volume),
            real(metrics.truck_tonnage),
            real(metrics.truck_percentage),
        ];

        row.extend(class_columns.iter().map(|(_, classes)| {
            let miles = classes.iter()
                .filter_map(|class| profile.cross_sections.get(*class))
                .sum::<f64>();
            Value::Real(round_to(miles, 1))
        }));
        row.push(Value::Real(profile.total_miles));

        for bucket in FundingBucket::ALL {
            let totals = profile.funding.get(bucket);
            row.push(Value::Real(totals.projects as f64));
            row.push(Value::Real(totals.cost));
            if bucket == FundingBucket::PartiallyFunded {
                row.push(Value::Real(totals.funding_gap));
            }
        }

        // Row width always matches the field list built above.
        table.rows.push(row);
        table.geometries.push(Some(profile.geometry.clone()));
    }
    table
}

/// Write the profile layer to a GeoPackage, replacing any previous file.
pub fn write_profiles(profiles: &[CorridorProfile], path: &Path, layer: &str, srs: Option<SpatialRef>) -> Result<()> {
    let table = profiles_to_table(profiles, layer, srs);
    info!("exporting {} corridor profiles with {} columns to {}", table.len(), table.fields.len() + 1, path.display());
    write_feature_table(&table, path)?;
    info!("export complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{LineString, MultiLineString};

    use super::*;
    use crate::{
        corridor::CorridorDefinition,
        funding::{BucketTotals, FundingSummary},
        profile::TrafficMetrics,
    };

    fn profile(code: &str, classes: &[(&str, f64)]) -> CorridorProfile {
        CorridorProfile {
            highway_code: code.into(),
            definition: Some(CorridorDefinition {
                label: code.into(),
                code: Some(format!("{code} code")),
                order: Some(2.4),
                description: None,
                shield_reference: None,
                corridor_name: Some(format!("{code} corridor")),
            }),
            geometry: MultiLineString::new(vec![LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])]),
            metrics: TrafficMetrics { crash_count: 4, ..Default::default() },
            cross_sections: classes.iter().map(|&(c, m)| (c.to_string(), m)).collect::<BTreeMap<_, _>>(),
            total_miles: classes.iter().map(|(_, m)| m).sum(),
            funding: FundingSummary {
                funded: BucketTotals { projects: 1, cost: 5.0, funding_gap: 0.0 },
                ..Default::default()
            },
        }
    }

    fn value<'a>(table: &'a FeatureTable, row: usize, column: &str) -> &'a Value {
        &table.rows[row][table.column_index(column).unwrap()]
    }

    #[test]
    fn column_order_and_densified_classes() {
        let profiles = [profile("A", &[("2U", 3.0), ("4D+", 1.5)]), profile("B", &[("Unknown", 2.0)])];
        let table = profiles_to_table(&profiles, "FTW_Corridor_Profiles", None);

        assert_eq!(table.column_names(), vec![
            "Order", "HWY_Code", "HWY_Description", "Corridor", "HWY_Shield",
            "HWY", "Number_Of_Crashes", "Number_Of_Fatal_Crashes", "AADT", "Truck_AADT", "Tons", "Truck_percentage",
            "two_U_miles", "four_D_plus_miles", "Unknown_miles", "Total_Miles",
            "Projects_Construction", "Project_Cost_Construction",
            "Projects_Funded", "Project_Cost_Funded",
            "Projects_PartialFunded", "Project_Cost_PartialFunded", "Project_FundingGap_PartialFunded",
            "Projects_Unfunded", "Project_Cost_Unfunded",
        ]);

        assert_eq!(value(&table, 0, "Order"), &Value::Real(2.0));
        assert_eq!(value(&table, 0, "Number_Of_Crashes"), &Value::Real(4.0));
        assert_eq!(value(&table, 0, "AADT"), &Value::Null);
        assert_eq!(value(&table, 1, "two_U_miles"), &Value::Real(0.0));
        assert_eq!(value(&table, 1, "Unknown_miles"), &Value::Real(2.0));
        assert_eq!(value(&table, 1, "Projects_Funded"), &Value::Real(1.0));
        assert_eq!(value(&table, 1, "Projects_Unfunded"), &Value::Real(0.0));
        assert_eq!(table.geometries.len(), 2);
    }

    #[test]
    fn colliding_class_names_are_summed() {
        let profiles = [profile("A", &[("2U", 1.0), ("two_U", 0.5)])];
        let table = profiles_to_table(&profiles, "layer", None);
        assert_eq!(table.column_names().iter().filter(|c| *c == "two_U_miles").count(), 1);
        assert_eq!(value(&table, 0, "two_U_miles"), &Value::Real(1.5));
    }
}
