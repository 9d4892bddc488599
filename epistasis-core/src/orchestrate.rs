//! Argument resolution and row subsetting shared by every model operation.
//!
//! Each fit/predict/score/likelihood call names where its X, y and yerr
//! come from with a [`Source`]. The orchestrator turns those into concrete
//! matrices and vectors from the bound dataset, memoizing model matrices,
//! and applies the threshold partition installed by a mixed model.

use std::sync::Arc;

use epistasis_gpm::GenotypePhenotypeMap;
use epistasis_linalg::DenseMatrix;
use statrs::distribution::{Continuous, Normal};

use crate::error::{EpistasisError, Result};
use crate::interaction::InteractionIndex;
use crate::matrix::{build_model_matrix, MatrixCache, ModelType, Purpose};

/// Where an operation's argument comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source<T> {
    /// The bound dataset's observed genotypes (or their phenotypes).
    Observed,
    /// The complete genotype space of the bound dataset.
    Complete,
    /// A value supplied by the caller.
    Explicit(T),
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Source::Observed
    }
}

/// Retained-class masks installed by a mixed model.
///
/// The fit-time mask is not stored: it is recomputed from whatever y an
/// operation resolves, as `y > threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub threshold: f64,
    /// Classifier output on the observed genotypes.
    pub observed: Vec<bool>,
    /// Classifier output on the complete genotype space.
    pub complete: Vec<bool>,
}

/// `true` where `y` lies strictly above `threshold`.
pub fn threshold_mask(y: &[f64], threshold: f64) -> Vec<bool> {
    y.iter().map(|&v| v > threshold).collect()
}

pub(crate) fn filter<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect()
}

/// Per-genotype Gaussian log-likelihood of `y` around `yhat`.
pub fn gaussian_log_likelihood(y: &[f64], yhat: &[f64], sigma: &[f64]) -> Result<Vec<f64>> {
    y.iter()
        .zip(yhat)
        .zip(sigma)
        .map(|((&obs, &mean), &sd)| {
            let normal = Normal::new(mean, sd)
                .map_err(|e| EpistasisError::InvalidUncertainty(e.to_string()))?;
            Ok(normal.ln_pdf(obs))
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Bound {
    gpm: Arc<GenotypePhenotypeMap>,
    index: InteractionIndex,
}

#[derive(Debug, Clone)]
pub(crate) struct FitOrchestrator {
    model_type: ModelType,
    bound: Option<Bound>,
    cache: MatrixCache,
    partition: Option<Partition>,
}

impl FitOrchestrator {
    pub(crate) fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            bound: None,
            cache: MatrixCache::new(),
            partition: None,
        }
    }

    /// Attach a dataset. Drops cached matrices and any partition.
    pub(crate) fn bind(&mut self, gpm: Arc<GenotypePhenotypeMap>, index: InteractionIndex) {
        self.cache.clear();
        self.partition = None;
        self.bound = Some(Bound { gpm, index });
    }

    pub(crate) fn gpm(&self) -> Option<&Arc<GenotypePhenotypeMap>> {
        self.bound.as_ref().map(|b| &b.gpm)
    }

    pub(crate) fn cache(&self) -> &MatrixCache {
        &self.cache
    }

    pub(crate) fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    pub(crate) fn set_partition(&mut self, partition: Option<Partition>) {
        self.partition = partition;
    }

    fn bound(&self) -> Result<&Bound> {
        self.bound.as_ref().ok_or(EpistasisError::UnboundDataset)
    }

    /// Design matrix for `x`. Observed genotypes are cached under
    /// `observed_purpose`, the complete space under [`Purpose::Complete`].
    pub(crate) fn design(
        &mut self,
        x: &Source<DenseMatrix>,
        observed_purpose: Purpose,
    ) -> Result<DenseMatrix> {
        let (purpose, genotypes) = match x {
            Source::Explicit(x) => return Ok(x.clone()),
            Source::Observed => {
                let bound = self.bound()?;
                (observed_purpose, bound.gpm.binary_genotypes().to_vec())
            }
            Source::Complete => {
                let bound = self.bound()?;
                (Purpose::Complete, bound.gpm.complete_binary_genotypes())
            }
        };
        let bound = self.bound.as_ref().ok_or(EpistasisError::UnboundDataset)?;
        let x = self
            .cache
            .get_or_build(purpose, &genotypes, &bound.index, self.model_type)?;
        Ok(x.clone())
    }

    /// Model matrix for genotypes written in the dataset's alphabet.
    pub(crate) fn matrix_for(&self, genotypes: &[String]) -> Result<DenseMatrix> {
        let bound = self.bound()?;
        let binary = genotypes
            .iter()
            .map(|g| {
                bound
                    .gpm
                    .encoding()
                    .encode(g)
                    .map_err(|_| EpistasisError::InvalidGenotype(g.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        build_model_matrix(&binary, &bound.index, self.model_type)
    }

    pub(crate) fn response(&self, y: &Source<Vec<f64>>) -> Result<Vec<f64>> {
        match y {
            Source::Explicit(y) => Ok(y.clone()),
            Source::Observed => Ok(self.bound()?.gpm.phenotypes().to_vec()),
            Source::Complete => {
                let gpm = &self.bound()?.gpm;
                self.onto_complete(gpm, |i| gpm.phenotypes()[i])
            }
        }
    }

    /// Standard deviations for `n` responses.
    pub(crate) fn uncertainty(&self, yerr: &Source<Vec<f64>>, n: usize) -> Result<Vec<f64>> {
        let sigma = match yerr {
            Source::Explicit(s) => s.clone(),
            Source::Observed | Source::Complete => {
                let gpm = &self.bound()?.gpm;
                let upper = &gpm
                    .uncertainty()
                    .ok_or_else(|| {
                        EpistasisError::InvalidUncertainty(
                            "the dataset carries no uncertainty".to_string(),
                        )
                    })?
                    .upper;
                if matches!(yerr, Source::Complete) {
                    self.onto_complete(gpm, |i| upper[i])?
                } else {
                    upper.clone()
                }
            }
        };
        if sigma.len() != n {
            return Err(EpistasisError::InvalidUncertainty(format!(
                "got {} standard deviations for {} phenotypes",
                sigma.len(),
                n
            )));
        }
        if let Some(s) = sigma.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(EpistasisError::InvalidUncertainty(format!(
                "standard deviations must be positive and finite, got {}",
                s
            )));
        }
        Ok(sigma)
    }

    /// Reorder per-observation values onto the complete genotype space.
    /// Every complete genotype must have been observed.
    fn onto_complete<F>(&self, gpm: &GenotypePhenotypeMap, value: F) -> Result<Vec<f64>>
    where
        F: Fn(usize) -> f64,
    {
        let positions: Vec<Option<usize>> = gpm
            .iter_complete()
            .map(|g| gpm.index_of(&g))
            .collect();
        let missing = positions.iter().filter(|p| p.is_none()).count();
        if missing > 0 {
            return Err(EpistasisError::IncompletePhenotypes {
                missing,
                total: positions.len(),
            });
        }
        Ok(positions.into_iter().flatten().map(value).collect())
    }

    /// Rows reaching the regressor in fit/score/likelihood.
    pub(crate) fn fit_mask(&self, y: &[f64]) -> Option<Vec<bool>> {
        self.partition
            .as_ref()
            .map(|p| threshold_mask(y, p.threshold))
    }

    /// Rows reaching the regressor in predict/hypothesis.
    pub(crate) fn prediction_mask<T>(&self, x: &Source<T>) -> Option<&[bool]> {
        let partition = self.partition.as_ref()?;
        match x {
            Source::Observed => Some(&partition.observed),
            Source::Complete => Some(&partition.complete),
            Source::Explicit(_) => None,
        }
    }
}
