use anyhow::Result;
use corridor_profile::{PipelineConfig, run_pipeline};
use tracing::info;

use crate::cli::BuildArgs;

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(args: &BuildArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(path) = &args.registry { config.registry = path.clone() }
    if let Some(path) = &args.segments { config.segments = path.clone() }
    if let Some(path) = &args.funding { config.funding = path.clone() }
    if let Some(path) = &args.output { config.output = path.clone() }
    if let Some(layer) = &args.layer { config.layer = layer.clone() }
    if let Some(epsg) = args.epsg { config.length_epsg = epsg }

    Ok(config)
}

pub fn run(_cli: &crate::cli::Cli, args: &BuildArgs) -> Result<()> {
    let config = resolve_config(args)?;
    info!("[build] writing layer {} to {}", config.layer, config.output.display());

    match run_pipeline(&config)? {
        Some(rows) => info!("[build] done: {rows} corridors"),
        None => info!("[build] done: no matching corridors, nothing written"),
    }
    Ok(())
}
