mod cli;
mod commands;

use std::process::ExitCode;

use cli::{Cli, Commands};
use commands::{build, export_csv, validate};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `-v` raises the default level, `RUST_LOG` overrides it.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Build(args) => build::run(cli, args),
        Commands::ExportCsv(args) => export_csv::run(cli, args),
        Commands::Validate(args) => validate::run(cli, args),
    }
}

fn main() -> ExitCode {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
