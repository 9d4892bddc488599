//! Fit summaries, serialized next to the coefficient table.

use std::fmt;

use serde::Serialize;

use super::{EpistasisMixedRegression, EpistasisRegression, ModelSpec};
use crate::classifier::Classifier;
use crate::error::Result;
use crate::orchestrate::Source;
use crate::regressor::Regressor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub spec: ModelSpec,
    pub regressor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Genotypes the regression was fitted on.
    pub n_genotypes: usize,
    pub n_terms: usize,
    pub num_of_params: usize,
    pub compression_ratio: f64,
    pub r_squared: f64,
}

impl ModelSummary {
    /// Summarize a fitted regression on its bound dataset.
    pub fn of_regression<R: Regressor>(model: &mut EpistasisRegression<R>) -> Result<Self> {
        let r_squared = model.score(Source::Observed, Source::Observed)?;
        let n_genotypes = match model.gpm() {
            Some(gpm) => match model.partition() {
                Some(p) => gpm.phenotypes().iter().filter(|&&y| y > p.threshold).count(),
                None => gpm.n(),
            },
            None => 0,
        };
        Ok(Self {
            spec: *model.spec(),
            regressor: model.regressor().name().to_string(),
            alpha: model.regressor().l1_penalty(),
            threshold: model.partition().map(|p| p.threshold),
            n_genotypes,
            n_terms: model.thetas()?.len(),
            num_of_params: model.num_of_params()?,
            compression_ratio: model.compression_ratio()?,
            r_squared,
        })
    }

    /// Summarize a fitted mixed model. R² is that of the composed
    /// prediction over every observed genotype.
    pub fn of_mixed<R: Regressor, C: Classifier>(
        model: &mut EpistasisMixedRegression<R, C>,
    ) -> Result<Self> {
        let r_squared = model.score()?;
        let mut summary = Self::of_regression(model.model_mut())?;
        summary.r_squared = r_squared;
        summary.threshold = Some(model.threshold());
        Ok(summary)
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Epistasis model ({} regression)", self.regressor)?;
        writeln!(f, "Order: {}", self.spec.order)?;
        writeln!(f, "Model type: {}", self.spec.model_type)?;
        writeln!(
            f,
            "Intercept: {}",
            if self.spec.intercept { "yes" } else { "no" }
        )?;
        if let Some(alpha) = self.alpha {
            writeln!(f, "Alpha: {}", alpha)?;
        }
        if let Some(threshold) = self.threshold {
            writeln!(f, "Threshold: {}", threshold)?;
        }
        writeln!(f, "Genotypes fitted: {}", self.n_genotypes)?;
        writeln!(f, "Parameters: {} of {}", self.num_of_params, self.n_terms)?;
        writeln!(f, "Compression ratio: {:.4}", self.compression_ratio)?;
        write!(f, "R^2: {:.6}", self.r_squared)
    }
}
