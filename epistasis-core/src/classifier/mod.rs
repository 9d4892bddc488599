//! Binary classifiers used to gate a mixed model.
//!
//! Labels are `true` for genotypes in the retained class.

pub mod logistic;

use epistasis_linalg::DenseMatrix;

use crate::error::Result;

pub use logistic::{LogisticConfig, LogisticRegression};

pub trait Classifier {
    /// Fit to `labels`, one per row of `x`. On error the classifier is
    /// left unfitted.
    fn fit(&mut self, x: &DenseMatrix, labels: &[bool]) -> Result<()>;

    /// Probability of the retained class for each row.
    fn predict_proba(&self, x: &DenseMatrix) -> Result<Vec<f64>>;

    fn is_fitted(&self) -> bool;

    fn predict(&self, x: &DenseMatrix) -> Result<Vec<bool>> {
        Ok(self.predict_proba(x)?.into_iter().map(|p| p > 0.5).collect())
    }
}
