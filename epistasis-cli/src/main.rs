//! epistasis: fit high-order epistasis models to genotype-phenotype maps.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "epistasis",
    version,
    about = "Fit high-order epistasis models to genotype-phenotype maps",
    long_about = "Decomposes phenotypes into interaction coefficients of increasing order.\n\
                   Supports least squares and lasso fits, optionally gated by a\n\
                   threshold classifier for nonviable genotypes."
)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model and write its coefficients and summary
    Fit(commands::fit::FitArgs),

    /// Fit a model and predict every genotype in the complete space
    Predict(commands::predict::PredictArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    tracing::info!("epistasis v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Fit(args) => commands::fit::run(args),
        Commands::Predict(args) => commands::predict::run(args),
    }
}
