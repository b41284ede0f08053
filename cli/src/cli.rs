use std::path::PathBuf;

/// Corridor profile ETL (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "corridor-profile", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build the corridor profile GeoPackage
    Build(BuildArgs),

    /// Dump a GeoPackage feature layer to CSV (geometry as WKT)
    ExportCsv(ExportCsvArgs),

    /// Write dashboard validation tables for a profile GeoPackage
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// JSON pipeline config; flags below override its values
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Corridor registry workbook (.csv file or directory of sheets)
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub registry: Option<PathBuf>,

    /// Segment layer (.gpkg or .shp)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub segments: Option<PathBuf>,

    /// Funding tracker workbook (directory of sheets)
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub funding: Option<PathBuf>,

    /// Output GeoPackage
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output layer name
    #[arg(long)]
    pub layer: Option<String>,

    /// Projected EPSG code used for segment lengths
    #[arg(long)]
    pub epsg: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ExportCsvArgs {
    /// Input GeoPackage
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub gpkg: PathBuf,

    /// Output directory, defaults to "_ignore" beside the GeoPackage's folder
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Profile GeoPackage, defaults to the configured output
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub gpkg: Option<PathBuf>,

    /// Output directory, defaults to the GeoPackage's folder
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}
