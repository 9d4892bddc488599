//! Threshold classifier over an additive genotype design.

use std::sync::Arc;

use epistasis_gpm::GenotypePhenotypeMap;
use epistasis_linalg::DenseMatrix;
use tracing::info;

use crate::classifier::Classifier;
use crate::error::{EpistasisError, Result};
use crate::interaction::InteractionIndex;
use crate::matrix::{ModelType, Purpose};
use crate::orchestrate::{threshold_mask, FitOrchestrator, Source};
use crate::regressor::check_rows;

/// Learns which genotypes have a phenotype above `threshold`.
///
/// The design is first order plus intercept, so the classifier generalizes
/// from single-site effects to genotypes that were never observed.
#[derive(Debug, Clone)]
pub struct EpistasisClassifier<C: Classifier> {
    threshold: f64,
    classifier: C,
    fallback: Option<f64>,
    orchestrator: FitOrchestrator,
    fitted: bool,
}

impl<C: Classifier> EpistasisClassifier<C> {
    pub fn new(threshold: f64, model_type: ModelType, classifier: C) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(EpistasisError::Configuration(format!(
                "threshold must be finite, got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            classifier,
            fallback: None,
            orchestrator: FitOrchestrator::new(model_type),
            fitted: false,
        })
    }

    /// Phenotype reported for rejected genotypes instead of the threshold.
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = Some(value);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Phenotype assigned to genotypes outside the retained class.
    pub fn fallback_phenotype(&self) -> f64 {
        self.fallback.unwrap_or(self.threshold)
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn add_gpm(&mut self, gpm: Arc<GenotypePhenotypeMap>) -> Result<()> {
        let index =
            InteractionIndex::for_alphabet(1, &gpm.encoding().positions_per_site(), true)?;
        self.orchestrator.bind(gpm, index);
        self.fitted = false;
        Ok(())
    }

    /// Fit to the labels `y > threshold`.
    pub fn fit(&mut self, x: Source<DenseMatrix>, y: Source<Vec<f64>>) -> Result<()> {
        self.fitted = false;
        let x = self.orchestrator.design(&x, Purpose::Fit)?;
        let y = self.orchestrator.response(&y)?;
        check_rows(&x, y.len(), "y")?;
        let labels = threshold_mask(&y, self.threshold);
        info!(
            "Fitting classifier: {} of {} genotypes above threshold {}",
            labels.iter().filter(|&&l| l).count(),
            labels.len(),
            self.threshold
        );
        self.classifier.fit(&x, &labels)?;
        self.fitted = true;
        Ok(())
    }

    /// Retained-class flags for the rows of `x`.
    pub fn predict(&mut self, x: Source<DenseMatrix>) -> Result<Vec<bool>> {
        let x = self.fitted_design(&x)?;
        self.classifier.predict(&x)
    }

    pub fn predict_proba(&mut self, x: Source<DenseMatrix>) -> Result<Vec<f64>> {
        let x = self.fitted_design(&x)?;
        self.classifier.predict_proba(&x)
    }

    /// Additive design for genotypes in the bound dataset's alphabet.
    pub fn matrix_for(&self, genotypes: &[String]) -> Result<DenseMatrix> {
        self.orchestrator.matrix_for(genotypes)
    }

    fn fitted_design(&mut self, x: &Source<DenseMatrix>) -> Result<DenseMatrix> {
        if !self.fitted {
            return Err(EpistasisError::NotFitted);
        }
        self.orchestrator.design(x, Purpose::Predict)
    }
}
