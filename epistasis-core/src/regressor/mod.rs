//! Numeric regressors the epistasis models delegate to.
//!
//! A regressor sees only a design matrix and a response. Everything about
//! genotypes, interaction terms and thresholds stays in the model wrapper.

pub mod lasso;
pub mod ols;

use epistasis_linalg::DenseMatrix;

use crate::error::{EpistasisError, Result};
use crate::util::math::r_squared;

pub use lasso::{Lasso, LassoConfig, Selection};
pub use ols::LinearRegression;

pub trait Regressor {
    /// Short name used in logs and model summaries.
    fn name(&self) -> &'static str;

    /// Fit coefficients, one per column of `x`. On error the regressor is
    /// left unfitted.
    fn fit(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<()>;

    /// Fitted coefficients, `None` before a successful fit.
    fn coefficients(&self) -> Option<&[f64]>;

    /// Strength of the L1 prior, for regularized regressors.
    fn l1_penalty(&self) -> Option<f64> {
        None
    }

    fn predict(&self, x: &DenseMatrix) -> Result<Vec<f64>> {
        let coef = self.coefficients().ok_or(EpistasisError::NotFitted)?;
        if x.ncols() != coef.len() {
            return Err(EpistasisError::ShapeMismatch {
                expected: x.ncols(),
                got: coef.len(),
            });
        }
        Ok(x.mat_vec(coef))
    }

    /// R² of the predictions on `x` against `y`.
    fn score(&self, x: &DenseMatrix, y: &[f64]) -> Result<f64> {
        check_rows(x, y.len(), "y")?;
        let predicted = self.predict(x)?;
        Ok(r_squared(y, &predicted))
    }
}

pub(crate) fn check_rows(x: &DenseMatrix, got: usize, what: &'static str) -> Result<()> {
    if x.nrows() != got {
        return Err(EpistasisError::RowMismatch {
            what,
            x_rows: x.nrows(),
            got,
        });
    }
    Ok(())
}
