//! Fit an epistasis model and predict the complete genotype space.
//!
//! epistasis predict --gpm-file ... --wildtype ... --order ... --output-prefix ...

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_and_fit, output_path, write_predictions_tsv, ModelArgs};

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    model: ModelArgs,
}

pub fn run(args: PredictArgs) -> Result<()> {
    info!("=== Predict complete genotype space ===");
    let (gpm, mut model) = load_and_fit(&args.model)?;

    let predictions = model.predict_complete()?;
    let path = output_path(&args.model.output_prefix, "predictions.tsv");
    write_predictions_tsv(&gpm, &predictions, &path)?;
    info!(
        "{} predictions written to {}",
        predictions.len(),
        path.display()
    );
    Ok(())
}
