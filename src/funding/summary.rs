use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use tracing::{debug, info};

use super::{FundingBucket, FundingProject};
use crate::{common::round_to, corridor::Registry, profile::CorridorProfile};

/// Distinct project count and summed dollars for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BucketTotals {
    pub projects: u32,
    pub cost: f64,
    /// Only reported for partially funded projects.
    pub funding_gap: f64,
}

/// Per-corridor funding totals; zero when a corridor has no projects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FundingSummary {
    pub construction: BucketTotals,
    pub funded: BucketTotals,
    pub partially_funded: BucketTotals,
    pub unfunded: BucketTotals,
}

impl FundingSummary {
    pub fn get(&self, bucket: FundingBucket) -> &BucketTotals {
        match bucket {
            FundingBucket::Construction => &self.construction,
            FundingBucket::Funded => &self.funded,
            FundingBucket::PartiallyFunded => &self.partially_funded,
            FundingBucket::Unfunded => &self.unfunded,
        }
    }

    pub fn get_mut(&mut self, bucket: FundingBucket) -> &mut BucketTotals {
        match bucket {
            FundingBucket::Construction => &mut self.construction,
            FundingBucket::Funded => &mut self.funded,
            FundingBucket::PartiallyFunded => &mut self.partially_funded,
            FundingBucket::Unfunded => &mut self.unfunded,
        }
    }
}

/// Group projects by (corridor label, bucket): distinct CSJ count, summed cost
/// and gap, each rounded to one decimal. Projects on unknown corridors or with
/// an unrecognised status are left out.
pub(crate) fn summarize_projects(projects: &[FundingProject], registry: &Registry) -> Result<BTreeMap<String, FundingSummary>> {
    let matched = projects.iter()
        .filter_map(|project| {
            let label = registry.label_for_corridor(project.corridor_name.as_deref()?)?;
            Some((label, project.bucket?, project))
        })
        .collect::<Vec<_>>();
    debug!("{} of {} projects match a target corridor", matched.len(), projects.len());

    let mut summaries = BTreeMap::<String, FundingSummary>::new();
    if matched.is_empty() { return Ok(summaries) }

    let df = DataFrame::new(vec![
        Column::new("HWY".into(), matched.iter().map(|(label, ..)| *label).collect::<Vec<_>>()),
        Column::new("bucket".into(), matched.iter().map(|(_, bucket, _)| bucket.to_str()).collect::<Vec<_>>()),
        Column::new("CSJ".into(), matched.iter().map(|(.., p)| p.csj.as_deref()).collect::<Vec<_>>()),
        Column::new("cost".into(), matched.iter().map(|(.., p)| p.cost).collect::<Vec<_>>()),
        Column::new("gap".into(), matched.iter().map(|(.., p)| p.funding_gap).collect::<Vec<_>>()),
    ])?;

    let grouped = df.lazy()
        .group_by([col("HWY"), col("bucket")])
        .agg([
            col("CSJ").drop_nulls().n_unique().alias("projects"),
            col("cost").sum().alias("cost"),
            col("gap").sum().alias("gap"),
        ])
        .collect()
        .context("Failed to aggregate funding projects")?;

    let labels = grouped.column("HWY")?.str()?.clone();
    let buckets = grouped.column("bucket")?.str()?.clone();
    let counts = grouped.column("projects")?.cast(&DataType::Float64)?;
    let costs = grouped.column("cost")?.cast(&DataType::Float64)?;
    let gaps = grouped.column("gap")?.cast(&DataType::Float64)?;

    for i in 0..grouped.height() {
        let (Some(label), Some(bucket)) = (labels.get(i), buckets.get(i)) else { continue };
        let bucket = FundingBucket::from_str(bucket)
            .ok_or_else(|| anyhow!("unknown funding bucket {bucket:?}"))?;

        let totals = summaries.entry(label.to_string()).or_default().get_mut(bucket);
        totals.projects = counts.f64()?.get(i).unwrap_or(0.0) as u32;
        totals.cost = round_to(costs.f64()?.get(i).unwrap_or(0.0), 1);
        if bucket == FundingBucket::PartiallyFunded {
            totals.funding_gap = round_to(gaps.f64()?.get(i).unwrap_or(0.0), 1);
        }
    }

    for bucket in FundingBucket::ALL {
        let corridors = summaries.values().filter(|s| s.get(bucket).projects > 0).count();
        info!("found {corridors} highways with {} projects", bucket.to_str().replace('_', " "));
    }

    Ok(summaries)
}

/// Left-join funding totals onto profiles. Profiles without projects keep
/// zero totals; summaries for corridors without a profile are dropped.
pub(crate) fn join_funding(profiles: &mut [CorridorProfile], summaries: &BTreeMap<String, FundingSummary>) {
    for profile in profiles.iter_mut() {
        profile.funding = summaries.get(&profile.highway_code).copied().unwrap_or_default();
    }
}
