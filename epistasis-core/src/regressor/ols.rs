//! Ordinary least squares.
//!
//! Solved as the minimum-norm least-squares problem, so designs with more
//! terms than genotypes (or collinear terms) still produce coefficients.

use epistasis_linalg::decomposition::least_squares;
use epistasis_linalg::DenseMatrix;
use tracing::debug;

use super::{check_rows, Regressor};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coef: Option<Vec<f64>>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &'static str {
        "ols"
    }

    fn fit(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<()> {
        self.coef = None;
        check_rows(x, y.len(), "y")?;
        let coef = least_squares(x, y)?;
        debug!("OLS fit on {} x {} design", x.nrows(), x.ncols());
        self.coef = Some(coef);
        Ok(())
    }

    fn coefficients(&self) -> Option<&[f64]> {
        self.coef.as_deref()
    }
}
