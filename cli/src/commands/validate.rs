use anyhow::Result;
use corridor_profile::{PipelineConfig, validate_dashboard};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ValidateArgs) -> Result<()> {
    let gpkg = args.gpkg.clone().unwrap_or_else(|| PipelineConfig::default().output);
    let report = validate_dashboard(&gpkg, args.output.as_deref())?;
    info!("[validate] {} corridors; tables written to {} and {}",
        report.corridors, report.raw_csv.display(), report.formatted_csv.display());
    Ok(())
}
