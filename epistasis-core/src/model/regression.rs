//! Epistasis regression: an interaction index, a model matrix and a
//! regressor, kept consistent through fit and predict.

use std::sync::Arc;

use epistasis_gpm::GenotypePhenotypeMap;
use epistasis_linalg::DenseMatrix;
use tracing::info;

use super::ModelSpec;
use crate::error::{EpistasisError, Result};
use crate::interaction::InteractionIndex;
use crate::map::EpistasisMap;
use crate::matrix::{MatrixCache, ModelType, Purpose};
use crate::orchestrate::{filter, gaussian_log_likelihood, FitOrchestrator, Partition, Source};
use crate::regressor::{check_rows, Lasso, LassoConfig, LinearRegression, Regressor};
use crate::util::math::safe_div;

pub type EpistasisLinearRegression = EpistasisRegression<LinearRegression>;
pub type EpistasisLasso = EpistasisRegression<Lasso>;

/// Linear epistasis model over a pluggable [`Regressor`].
///
/// Binding a dataset derives the interaction index and epistasis map from
/// its alphabet. A model can also be fitted unbound with explicit X and y;
/// it then has coefficients but no epistasis map.
#[derive(Debug, Clone)]
pub struct EpistasisRegression<R: Regressor> {
    spec: ModelSpec,
    regressor: R,
    orchestrator: FitOrchestrator,
    epistasis: Option<EpistasisMap>,
    thetas: Option<Vec<f64>>,
}

impl EpistasisLinearRegression {
    /// Ordinary least squares.
    pub fn linear(order: usize, model_type: ModelType) -> Result<Self> {
        Self::new(order, model_type, LinearRegression::new())
    }
}

impl EpistasisLasso {
    pub fn lasso(order: usize, model_type: ModelType, config: LassoConfig) -> Result<Self> {
        Self::new(order, model_type, Lasso::new(config)?)
    }
}

impl<R: Regressor> EpistasisRegression<R> {
    pub fn new(order: usize, model_type: ModelType, regressor: R) -> Result<Self> {
        if order < 1 {
            return Err(EpistasisError::Configuration(format!(
                "order must be at least 1, got {}",
                order
            )));
        }
        Ok(Self {
            spec: ModelSpec::new(order, model_type),
            regressor,
            orchestrator: FitOrchestrator::new(model_type),
            epistasis: None,
            thetas: None,
        })
    }

    /// Drop the order-0 term. A bound model is re-indexed and loses its
    /// fitted state.
    pub fn without_intercept(mut self) -> Self {
        self.spec.intercept = false;
        let rebound = self.gpm().cloned().zip(
            self.epistasis
                .as_ref()
                .map(|map| map.index().without_intercept()),
        );
        if let Some((gpm, index)) = rebound {
            info!("Dropped intercept: {} interaction terms", index.len());
            self.orchestrator.bind(gpm, index.clone());
            self.epistasis = Some(EpistasisMap::new(index));
        }
        self.thetas = None;
        self
    }

    /// Bind a dataset. Rebinding drops cached matrices, the fitted state
    /// and any threshold partition.
    pub fn add_gpm(&mut self, gpm: Arc<GenotypePhenotypeMap>) -> Result<()> {
        let index = InteractionIndex::for_alphabet(
            self.spec.order,
            &gpm.encoding().positions_per_site(),
            self.spec.intercept,
        )?;
        info!(
            "Bound {} genotypes over {} sites: {} interaction terms",
            gpm.n(),
            gpm.n_sites(),
            index.len()
        );
        self.orchestrator.bind(gpm, index.clone());
        self.epistasis = Some(EpistasisMap::new(index));
        self.thetas = None;
        Ok(())
    }

    pub fn fit(&mut self, x: Source<DenseMatrix>, y: Source<Vec<f64>>) -> Result<()> {
        self.reset_fit();

        let x = self.orchestrator.design(&x, Purpose::Fit)?;
        let y = self.orchestrator.response(&y)?;
        check_rows(&x, y.len(), "y")?;
        let (x, y) = match self.orchestrator.fit_mask(&y) {
            Some(mask) => (x.filter_rows(&mask), filter(&y, &mask)),
            None => (x, y),
        };

        info!(
            "Fitting {} regression on {} genotypes x {} terms",
            self.regressor.name(),
            x.nrows(),
            x.ncols()
        );
        self.regressor.fit(&x, &y)?;
        let coef = self
            .regressor
            .coefficients()
            .ok_or(EpistasisError::NotFitted)?
            .to_vec();
        if let Some(map) = self.epistasis.as_mut() {
            map.set_values(coef.clone())?;
        }
        self.thetas = Some(coef);
        Ok(())
    }

    /// Regressor predictions. With a threshold partition, only rows of the
    /// retained class are predicted.
    pub fn predict(&mut self, x: Source<DenseMatrix>) -> Result<Vec<f64>> {
        self.fitted()?;
        let design = self.prediction_design(&x)?;
        self.regressor.predict(&design)
    }

    /// R² on the (threshold-filtered) rows of `x`.
    pub fn score(&mut self, x: Source<DenseMatrix>, y: Source<Vec<f64>>) -> Result<f64> {
        self.fitted()?;
        let x = self.orchestrator.design(&x, Purpose::Fit)?;
        let y = self.orchestrator.response(&y)?;
        check_rows(&x, y.len(), "y")?;
        match self.orchestrator.fit_mask(&y) {
            Some(mask) => self
                .regressor
                .score(&x.filter_rows(&mask), &filter(&y, &mask)),
            None => self.regressor.score(&x, &y),
        }
    }

    /// `X * thetas`, at the fitted coefficients unless others are given.
    pub fn hypothesis(&mut self, x: Source<DenseMatrix>, thetas: Option<&[f64]>) -> Result<Vec<f64>> {
        let fitted = self.fitted()?.to_vec();
        let design = self.prediction_design(&x)?;
        let thetas = thetas.unwrap_or(&fitted);
        if thetas.len() != design.ncols() {
            return Err(EpistasisError::ShapeMismatch {
                expected: design.ncols(),
                got: thetas.len(),
            });
        }
        Ok(design.mat_vec(thetas))
    }

    /// Per-genotype Gaussian log-likelihood of `y` under the model. For an
    /// L1-regularized regressor the prior `alpha * sum|theta|` is subtracted
    /// from every entry.
    pub fn log_likelihood(
        &mut self,
        x: Source<DenseMatrix>,
        y: Source<Vec<f64>>,
        yerr: Source<Vec<f64>>,
        thetas: Option<&[f64]>,
    ) -> Result<Vec<f64>> {
        let fitted = self.fitted()?.to_vec();
        let thetas = thetas.map_or(fitted, <[f64]>::to_vec);

        let x = self.orchestrator.design(&x, Purpose::Fit)?;
        let y = self.orchestrator.response(&y)?;
        check_rows(&x, y.len(), "y")?;
        let sigma = self.orchestrator.uncertainty(&yerr, y.len())?;
        let (x, y, sigma) = match self.orchestrator.fit_mask(&y) {
            Some(mask) => (
                x.filter_rows(&mask),
                filter(&y, &mask),
                filter(&sigma, &mask),
            ),
            None => (x, y, sigma),
        };
        if thetas.len() != x.ncols() {
            return Err(EpistasisError::ShapeMismatch {
                expected: x.ncols(),
                got: thetas.len(),
            });
        }

        let yhat = x.mat_vec(&thetas);
        let mut ll = gaussian_log_likelihood(&y, &yhat, &sigma)?;
        if let Some(alpha) = self.regressor.l1_penalty() {
            let prior = alpha * thetas.iter().map(|t| t.abs()).sum::<f64>();
            ll.iter_mut().for_each(|l| *l -= prior);
        }
        Ok(ll)
    }

    pub fn total_log_likelihood(
        &mut self,
        x: Source<DenseMatrix>,
        y: Source<Vec<f64>>,
        yerr: Source<Vec<f64>>,
        thetas: Option<&[f64]>,
    ) -> Result<f64> {
        Ok(self.log_likelihood(x, y, yerr, thetas)?.iter().sum())
    }

    pub fn thetas(&self) -> Result<&[f64]> {
        self.fitted()
    }

    pub fn is_fitted(&self) -> bool {
        self.thetas.is_some()
    }

    pub fn epistasis(&self) -> Result<&EpistasisMap> {
        self.epistasis.as_ref().ok_or(EpistasisError::UnboundDataset)
    }

    /// Every term for an unregularized regressor, the nonzero ones under L1.
    pub fn num_of_params(&self) -> Result<usize> {
        let thetas = self.fitted()?;
        Ok(match self.regressor.l1_penalty() {
            Some(_) => thetas.iter().filter(|t| **t != 0.0).count(),
            None => thetas.len(),
        })
    }

    /// Fraction of coefficients fitted to exactly zero.
    pub fn compression_ratio(&self) -> Result<f64> {
        let thetas = self.fitted()?;
        match self.epistasis.as_ref() {
            Some(map) => map.compression_ratio(),
            None => {
                let zeros = thetas.iter().filter(|t| **t == 0.0).count();
                Ok(safe_div(zeros as f64, thetas.len() as f64))
            }
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn gpm(&self) -> Option<&Arc<GenotypePhenotypeMap>> {
        self.orchestrator.gpm()
    }

    pub fn matrix_cache(&self) -> &MatrixCache {
        self.orchestrator.cache()
    }

    pub fn partition(&self) -> Option<&Partition> {
        self.orchestrator.partition()
    }

    /// Model matrix for genotypes in the bound dataset's alphabet.
    pub fn matrix_for(&self, genotypes: &[String]) -> Result<DenseMatrix> {
        self.orchestrator.matrix_for(genotypes)
    }

    pub(crate) fn set_partition(&mut self, partition: Option<Partition>) {
        self.orchestrator.set_partition(partition);
    }

    pub(crate) fn uncertainty(&self, yerr: &Source<Vec<f64>>, n: usize) -> Result<Vec<f64>> {
        self.orchestrator.uncertainty(yerr, n)
    }

    pub(crate) fn reset_fit(&mut self) {
        self.thetas = None;
        if let Some(map) = self.epistasis.as_mut() {
            map.reset();
        }
    }

    fn fitted(&self) -> Result<&[f64]> {
        self.thetas.as_deref().ok_or(EpistasisError::NotFitted)
    }

    fn prediction_design(&mut self, x: &Source<DenseMatrix>) -> Result<DenseMatrix> {
        let design = self.orchestrator.design(x, Purpose::Predict)?;
        match self.orchestrator.prediction_mask(x) {
            Some(mask) => {
                check_rows(&design, mask.len(), "retained-class mask")?;
                Ok(design.filter_rows(mask))
            }
            None => Ok(design),
        }
    }
}
