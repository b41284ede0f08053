use anyhow::Result;
use corridor_profile::export_layer_to_csv;
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ExportCsvArgs) -> Result<()> {
    let export = export_layer_to_csv(&args.gpkg, args.output_dir.as_deref())?;
    info!("[export-csv] {} rows written to {}", export.rows, export.path.display());
    Ok(())
}
