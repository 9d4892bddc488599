pub mod fit;
pub mod predict;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use epistasis_core::classifier::LogisticRegression;
use epistasis_core::regressor::{Lasso, LassoConfig};
use epistasis_core::{
    EpistasisLasso, EpistasisLinearRegression, EpistasisMap, EpistasisMixedLinearRegression,
    EpistasisMixedRegression, ModelSummary, ModelType, Source,
};
use epistasis_gpm::io::read_gpm_tsv;
use epistasis_gpm::GenotypePhenotypeMap;

/// Flags shared by every command that fits a model.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Genotype-phenotype TSV (genotype, phenotype and optional stdev columns)
    #[arg(long)]
    pub gpm_file: PathBuf,

    /// Wildtype genotype
    #[arg(long)]
    pub wildtype: String,

    /// Highest interaction order
    #[arg(long, default_value = "1")]
    pub order: usize,

    /// Model type: global or walsh
    #[arg(long, default_value = "global")]
    pub model_type: String,

    /// Regressor: ols or lasso
    #[arg(long, default_value = "ols")]
    pub regressor: String,

    /// L1 penalty for the lasso regressor
    #[arg(long, default_value = "1.0")]
    pub alpha: f64,

    /// Fit a mixed model, regressing only genotypes above this phenotype
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Drop the intercept term
    #[arg(long, default_value = "false")]
    pub no_intercept: bool,

    /// Output file prefix
    #[arg(long, default_value = "epistasis")]
    pub output_prefix: String,
}

type EpistasisMixedLasso = EpistasisMixedRegression<Lasso, LogisticRegression>;

/// A fitted model of any flavor the command line can build.
pub enum FittedModel {
    Linear(EpistasisLinearRegression),
    Lasso(EpistasisLasso),
    MixedLinear(EpistasisMixedLinearRegression),
    MixedLasso(EpistasisMixedLasso),
}

impl FittedModel {
    pub fn epistasis(&self) -> Result<&EpistasisMap> {
        let map = match self {
            FittedModel::Linear(m) => m.epistasis(),
            FittedModel::Lasso(m) => m.epistasis(),
            FittedModel::MixedLinear(m) => m.model().epistasis(),
            FittedModel::MixedLasso(m) => m.model().epistasis(),
        };
        Ok(map?)
    }

    pub fn summary(&mut self) -> Result<ModelSummary> {
        let summary = match self {
            FittedModel::Linear(m) => ModelSummary::of_regression(m),
            FittedModel::Lasso(m) => ModelSummary::of_regression(m),
            FittedModel::MixedLinear(m) => ModelSummary::of_mixed(m),
            FittedModel::MixedLasso(m) => ModelSummary::of_mixed(m),
        };
        Ok(summary?)
    }

    /// Predicted phenotypes over the complete genotype space.
    pub fn predict_complete(&mut self) -> Result<Vec<f64>> {
        let yhat = match self {
            FittedModel::Linear(m) => m.predict(Source::Complete),
            FittedModel::Lasso(m) => m.predict(Source::Complete),
            FittedModel::MixedLinear(m) => m.predict(Source::Complete),
            FittedModel::MixedLasso(m) => m.predict(Source::Complete),
        };
        Ok(yhat?)
    }
}

/// Load the dataset named by `args` and fit the requested model on it.
pub fn load_and_fit(args: &ModelArgs) -> Result<(Arc<GenotypePhenotypeMap>, FittedModel)> {
    let model_type: ModelType = args.model_type.parse()?;
    let lasso = match args.regressor.to_lowercase().as_str() {
        "ols" | "linear" => false,
        "lasso" => true,
        _ => bail!("Unknown regressor: {}", args.regressor),
    };

    info!("Genotype-phenotype file: {}", args.gpm_file.display());
    info!(
        "Model: order {}, {} encoding, {} regressor",
        args.order,
        model_type,
        if lasso { "lasso" } else { "ols" }
    );

    let gpm = Arc::new(read_gpm_tsv(&args.gpm_file, &args.wildtype)?);
    let config = LassoConfig {
        alpha: args.alpha,
        ..LassoConfig::default()
    };

    let mut model = match (args.threshold, lasso) {
        (None, false) => {
            let mut m = EpistasisLinearRegression::linear(args.order, model_type)?;
            if args.no_intercept {
                m = m.without_intercept();
            }
            m.add_gpm(Arc::clone(&gpm))?;
            m.fit(Source::Observed, Source::Observed)?;
            FittedModel::Linear(m)
        }
        (None, true) => {
            let mut m = EpistasisLasso::lasso(args.order, model_type, config)?;
            if args.no_intercept {
                m = m.without_intercept();
            }
            m.add_gpm(Arc::clone(&gpm))?;
            m.fit(Source::Observed, Source::Observed)?;
            FittedModel::Lasso(m)
        }
        (Some(threshold), false) => {
            info!("Mixed model with threshold {}", threshold);
            let mut m = EpistasisMixedLinearRegression::linear(args.order, threshold, model_type)?;
            if args.no_intercept {
                m = m.without_intercept();
            }
            m.add_gpm(Arc::clone(&gpm))?;
            m.fit()?;
            FittedModel::MixedLinear(m)
        }
        (Some(threshold), true) => {
            info!("Mixed model with threshold {}", threshold);
            let mut m = EpistasisMixedLasso::new(
                args.order,
                threshold,
                model_type,
                Lasso::new(config)?,
                LogisticRegression::default(),
            )?;
            if args.no_intercept {
                m = m.without_intercept();
            }
            m.add_gpm(Arc::clone(&gpm))?;
            m.fit()?;
            FittedModel::MixedLasso(m)
        }
    };

    let summary = model.summary()?;
    info!(
        "Fitted {} of {} parameters, R^2 = {:.6}",
        summary.num_of_params, summary.n_terms, summary.r_squared
    );
    Ok((gpm, model))
}

/// `<prefix>.<suffix>`, keeping any dots already in the prefix.
pub fn output_path(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", prefix, suffix))
}

pub fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write the fitted coefficients, one term per line.
pub fn write_epistasis_tsv(map: &EpistasisMap, path: &Path) -> Result<()> {
    let records = map.records()?;
    let with_stdev = records.iter().any(|r| r.stdev.is_some());
    let mut w = create_writer(path)?;
    if with_stdev {
        writeln!(w, "label\torder\tcoefficient\tstdev")?;
    } else {
        writeln!(w, "label\torder\tcoefficient")?;
    }
    for r in &records {
        write!(w, "{}\t{}\t{}", r.label, r.order, r.value)?;
        if let Some(sd) = r.stdev {
            write!(w, "\t{}", sd)?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_summary_json(summary: &ModelSummary, path: &Path) -> Result<()> {
    let mut w = create_writer(path)?;
    serde_json::to_writer_pretty(&mut w, summary)?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

/// Write predictions over the complete genotype space. Observed genotypes
/// also carry their measured phenotype.
pub fn write_predictions_tsv(
    gpm: &GenotypePhenotypeMap,
    predictions: &[f64],
    path: &Path,
) -> Result<()> {
    let genotypes = gpm.complete_genotypes();
    if genotypes.len() != predictions.len() {
        bail!(
            "Expected {} predictions, got {}",
            genotypes.len(),
            predictions.len()
        );
    }
    let mut w = create_writer(path)?;
    writeln!(w, "genotype\tobserved\tphenotype\tprediction")?;
    for (g, p) in genotypes.iter().zip(predictions) {
        match gpm.phenotype_of(g) {
            Some(y) => writeln!(w, "{}\ttrue\t{}\t{}", g, y, p)?,
            None => writeln!(w, "{}\tfalse\tNA\t{}", g, p)?,
        }
    }
    w.flush()?;
    Ok(())
}
