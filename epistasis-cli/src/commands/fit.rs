//! Fit an epistasis model and write its coefficients.
//!
//! epistasis fit --gpm-file ... --wildtype ... --order ... --output-prefix ...

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_and_fit, output_path, write_epistasis_tsv, write_summary_json, ModelArgs};

#[derive(Args)]
pub struct FitArgs {
    #[command(flatten)]
    model: ModelArgs,
}

pub fn run(args: FitArgs) -> Result<()> {
    info!("=== Fit epistasis model ===");
    let (_, mut model) = load_and_fit(&args.model)?;

    let tsv_path = output_path(&args.model.output_prefix, "epistasis.tsv");
    write_epistasis_tsv(model.epistasis()?, &tsv_path)?;
    info!("Coefficients written to {}", tsv_path.display());

    let summary = model.summary()?;
    let json_path = output_path(&args.model.output_prefix, "model.json");
    write_summary_json(&summary, &json_path)?;
    info!("Model summary written to {}", json_path.display());

    println!("{}", summary);
    Ok(())
}
