//! Mixed regression: a threshold classifier gating an epistasis regression.
//!
//! The classifier decides which genotypes belong to the retained class
//! (phenotype above the threshold). The regression is fitted on retained
//! genotypes only; at prediction time rejected genotypes take the
//! classifier's fallback phenotype.

use std::sync::Arc;

use epistasis_gpm::GenotypePhenotypeMap;
use epistasis_linalg::DenseMatrix;
use tracing::info;

use super::classifier::EpistasisClassifier;
use super::regression::EpistasisRegression;
use crate::classifier::{Classifier, LogisticRegression};
use crate::error::{EpistasisError, Result};
use crate::matrix::ModelType;
use crate::orchestrate::{gaussian_log_likelihood, Partition, Source};
use crate::regressor::{LinearRegression, Regressor};
use crate::util::math::r_squared;

pub type EpistasisMixedLinearRegression =
    EpistasisMixedRegression<LinearRegression, LogisticRegression>;

#[derive(Debug, Clone)]
pub struct EpistasisMixedRegression<R: Regressor, C: Classifier> {
    classifier: EpistasisClassifier<C>,
    model: EpistasisRegression<R>,
}

impl EpistasisMixedLinearRegression {
    /// Least squares gated by a Firth logistic classifier.
    pub fn linear(order: usize, threshold: f64, model_type: ModelType) -> Result<Self> {
        Self::new(
            order,
            threshold,
            model_type,
            LinearRegression::new(),
            LogisticRegression::default(),
        )
    }
}

impl<R: Regressor, C: Classifier> EpistasisMixedRegression<R, C> {
    pub fn new(
        order: usize,
        threshold: f64,
        model_type: ModelType,
        regressor: R,
        classifier: C,
    ) -> Result<Self> {
        Ok(Self {
            classifier: EpistasisClassifier::new(threshold, model_type, classifier)?,
            model: EpistasisRegression::new(order, model_type, regressor)?,
        })
    }

    /// Drop the order-0 term from the regression.
    pub fn without_intercept(mut self) -> Self {
        self.model = self.model.without_intercept();
        self
    }

    /// Phenotype reported for rejected genotypes instead of the threshold.
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.classifier = self.classifier.with_fallback(value);
        self
    }

    /// Bind the same dataset to the classifier and the regression.
    pub fn add_gpm(&mut self, gpm: Arc<GenotypePhenotypeMap>) -> Result<()> {
        self.model.add_gpm(Arc::clone(&gpm))?;
        self.classifier.add_gpm(gpm)
    }

    /// Fit the classifier, install its partition, then fit the regression
    /// on genotypes above the threshold.
    pub fn fit(&mut self) -> Result<()> {
        self.model.reset_fit();
        self.model.set_partition(None);

        self.classifier.fit(Source::Observed, Source::Observed)?;
        let observed = self.classifier.predict(Source::Observed)?;
        let complete = self.classifier.predict(Source::Complete)?;
        info!(
            "Classifier retains {} of {} observed and {} of {} possible genotypes",
            observed.iter().filter(|&&c| c).count(),
            observed.len(),
            complete.iter().filter(|&&c| c).count(),
            complete.len()
        );
        self.model.set_partition(Some(Partition {
            threshold: self.classifier.threshold(),
            observed,
            complete,
        }));

        self.model.fit(Source::Observed, Source::Observed)
    }

    /// Phenotypes over the genotypes named by `x`, in that order. `Explicit`
    /// genotypes are written in the dataset's alphabet.
    pub fn predict(&mut self, x: Source<Vec<String>>) -> Result<Vec<f64>> {
        self.compose(x, |model, x| model.predict(x))
    }

    /// Like [`predict`](Self::predict), evaluating the regression at
    /// `thetas` when given.
    pub fn hypothesis(&mut self, x: Source<Vec<String>>, thetas: Option<&[f64]>) -> Result<Vec<f64>> {
        self.compose(x, |model, x| model.hypothesis(x, thetas))
    }

    /// R² of the composed prediction on the observed genotypes.
    pub fn score(&mut self) -> Result<f64> {
        let yhat = self.predict(Source::Observed)?;
        let y = self.observed_phenotypes()?;
        Ok(r_squared(&y, &yhat))
    }

    /// Per-genotype Gaussian log-likelihood of the observed phenotypes
    /// under the composed prediction.
    pub fn log_likelihood(&mut self, yerr: Source<Vec<f64>>) -> Result<Vec<f64>> {
        let yhat = self.predict(Source::Observed)?;
        let y = self.observed_phenotypes()?;
        let sigma = self.model.uncertainty(&yerr, y.len())?;
        gaussian_log_likelihood(&y, &yhat, &sigma)
    }

    /// Coefficients of the inner regression.
    pub fn thetas(&self) -> Result<&[f64]> {
        self.model.thetas()
    }

    pub fn threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    pub fn classifier(&self) -> &EpistasisClassifier<C> {
        &self.classifier
    }

    pub fn model(&self) -> &EpistasisRegression<R> {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut EpistasisRegression<R> {
        &mut self.model
    }

    fn observed_phenotypes(&self) -> Result<Vec<f64>> {
        let gpm = self.model.gpm().ok_or(EpistasisError::UnboundDataset)?;
        Ok(gpm.phenotypes().to_vec())
    }

    /// Scatter retained-class regression output into a full-length vector,
    /// filling rejected rows with the fallback phenotype.
    fn compose<F>(&mut self, x: Source<Vec<String>>, regress: F) -> Result<Vec<f64>>
    where
        F: FnOnce(&mut EpistasisRegression<R>, Source<DenseMatrix>) -> Result<Vec<f64>>,
    {
        if !self.model.is_fitted() {
            return Err(EpistasisError::NotFitted);
        }
        let (classes, retained) = match x {
            Source::Observed => (
                self.classifier.predict(Source::Observed)?,
                regress(&mut self.model, Source::Observed)?,
            ),
            Source::Complete => (
                self.classifier.predict(Source::Complete)?,
                regress(&mut self.model, Source::Complete)?,
            ),
            Source::Explicit(genotypes) => {
                let additive = self.classifier.matrix_for(&genotypes)?;
                let classes = self.classifier.predict(Source::Explicit(additive))?;
                let x = self.model.matrix_for(&genotypes)?.filter_rows(&classes);
                (classes, regress(&mut self.model, Source::Explicit(x))?)
            }
        };

        let n_retained = classes.iter().filter(|&&c| c).count();
        if retained.len() != n_retained {
            return Err(EpistasisError::RowMismatch {
                what: "regression output",
                x_rows: n_retained,
                got: retained.len(),
            });
        }

        let fallback = self.classifier.fallback_phenotype();
        let mut retained = retained.into_iter();
        Ok(classes
            .iter()
            .map(|&keep| {
                if keep {
                    retained.next().unwrap_or(fallback)
                } else {
                    fallback
                }
            })
            .collect())
    }
}
