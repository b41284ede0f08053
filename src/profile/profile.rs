use std::collections::BTreeMap;

use geo::MultiLineString;
use tracing::{debug, warn};

use super::{MeasuredSegment, TrafficMetrics, cross_section::cross_section_miles};
use crate::{
    common::round_to,
    corridor::{CorridorDefinition, Registry},
    funding::FundingSummary,
    geom::dissolve_lines,
};

/// One output row: a corridor's dissolved geometry and aggregated attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorProfile {
    pub highway_code: String,
    /// Registry attributes for the corridor.
    pub definition: Option<CorridorDefinition>,
    /// Union of all member segment parts, in the source CRS.
    pub geometry: MultiLineString<f64>,
    pub metrics: TrafficMetrics,
    /// Sparse miles per cross-section class.
    pub cross_sections: BTreeMap<String, f64>,
    pub total_miles: f64,
    pub funding: FundingSummary,
}

/// One profile per distinct highway code among `segments`, ordered by code.
/// Funding starts at zero and is joined later.
pub(crate) fn build_corridor_profiles(segments: &[MeasuredSegment], registry: &Registry) -> Vec<CorridorProfile> {
    let mut groups = BTreeMap::<&str, Vec<&MeasuredSegment>>::new();
    for measured in segments {
        groups.entry(measured.segment.highway_code.as_str()).or_default().push(measured);
    }

    groups.into_iter()
        .map(|(code, members)| {
            let definition = registry.get(code).cloned();
            if definition.is_none() {
                warn!("corridor {code:?} is not in the registry");
            }

            let total_miles = round_to(members.iter().map(|m| m.length_miles).sum(), 1);
            debug!("{code}: {} segments, {total_miles} mi", members.len());

            CorridorProfile {
                highway_code: code.to_string(),
                definition,
                geometry: dissolve_lines(members.iter().map(|m| &m.segment.geometry)),
                metrics: TrafficMetrics::aggregate(members.iter().copied()),
                cross_sections: cross_section_miles(members.iter().copied()),
                total_miles,
                funding: FundingSummary::default(),
            }
        })
        .collect()
}
