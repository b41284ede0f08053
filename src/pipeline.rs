//! End-to-end run: registry, segments and funding in; one profile layer out.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    common::require_exists,
    config::PipelineConfig,
    corridor::{Registry, SegmentSet},
    export::write_profiles,
    funding::{join_funding, load_funding_projects, summarize_projects},
    geom::Crs,
    io::{CsvWorkbook, SheetSource},
    profile::{CorridorProfile, build_corridor_profiles, measure_segments},
};

/// Build one profile per registry corridor present in `segments`.
///
/// Returns `None` when no segment belongs to a registry corridor; the funding
/// workbook is not read in that case.
pub fn build_profiles(
    config: &PipelineConfig,
    registry: &Registry,
    segments: SegmentSet,
    funding: &dyn SheetSource,
) -> Result<Option<Vec<CorridorProfile>>> {
    let segments = segments.filter_to_registry(registry);
    if segments.is_empty() {
        warn!("no segments match the registry corridors; nothing to export");
        return Ok(None);
    }

    let target = Crs::from_epsg(config.length_epsg)?;
    let measured = measure_segments(segments, target)?;
    let mut profiles = build_corridor_profiles(&measured, registry);
    info!("aggregated {} corridors", profiles.len());

    let projects = load_funding_projects(funding, &config.construction_sheet, &config.utp_sheet, config.utp_header_row)
        .with_context(|| format!("Failed to read funding tracker {}", funding.location()))?;
    let summaries = summarize_projects(&projects, registry)?;
    join_funding(&mut profiles, &summaries);

    Ok(Some(profiles))
}

/// Run the whole pipeline from files named in `config`.
///
/// Every input is checked before anything is read, so a missing file leaves
/// the output untouched. Returns the number of profile rows written.
pub fn run_pipeline(config: &PipelineConfig) -> Result<Option<usize>> {
    for path in [&config.registry, &config.segments, &config.funding] {
        require_exists(path)?;
    }

    info!("reading corridor registry {}", config.registry.display());
    let registry = Registry::from_workbook(&CsvWorkbook::open(&config.registry)?)?;

    info!("reading segments {}", config.segments.display());
    let segments = SegmentSet::load(&config.segments)?;
    let srs = segments.srs.clone();

    let funding = CsvWorkbook::open(&config.funding)?;
    let Some(profiles) = build_profiles(config, &registry, segments, &funding)? else {
        return Ok(None);
    };

    write_profiles(&profiles, &config.output, &config.layer, Some(srs))?;
    info!("wrote {} corridor profiles to {}", profiles.len(), config.output.display());
    Ok(Some(profiles.len()))
}
