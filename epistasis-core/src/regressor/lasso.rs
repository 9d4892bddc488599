//! L1-regularized least squares by coordinate descent.
//!
//! Minimizes `(1/2n) * ||y - Xw||^2 + alpha * ||w||_1` with no separate
//! intercept: an intercept column in X is penalized like any other term.

use epistasis_linalg::DenseMatrix;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::{check_rows, Regressor};
use crate::error::{EpistasisError, Result};
use crate::util::math::soft_threshold;

/// Columns with a squared norm below this are left at zero.
const ZERO_COLUMN: f64 = 1e-14;

/// Order in which coordinates are updated within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Columns in order, every sweep.
    #[default]
    Cyclic,
    /// A fresh random permutation of the columns every sweep.
    Random,
}

#[derive(Debug, Clone)]
pub struct LassoConfig {
    /// Weight of the L1 term.
    pub alpha: f64,
    /// Maximum full sweeps over the coefficients.
    pub max_iter: usize,
    /// Stop once no coefficient moves by more than this in a sweep.
    pub tol: f64,
    /// Constrain coefficients to be non-negative.
    pub positive: bool,
    /// Start from the previous fit's coefficients when the column count
    /// matches.
    pub warm_start: bool,
    pub selection: Selection,
    /// Seed for [`Selection::Random`].
    pub seed: u64,
}

impl Default for LassoConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            positive: false,
            warm_start: false,
            selection: Selection::Cyclic,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lasso {
    config: LassoConfig,
    coef: Option<Vec<f64>>,
    n_iter: usize,
}

impl Lasso {
    pub fn new(config: LassoConfig) -> Result<Self> {
        if !(config.alpha.is_finite() && config.alpha >= 0.0) {
            return Err(EpistasisError::Configuration(format!(
                "alpha must be a non-negative number, got {}",
                config.alpha
            )));
        }
        if !(config.tol.is_finite() && config.tol > 0.0) {
            return Err(EpistasisError::Configuration(format!(
                "tol must be positive, got {}",
                config.tol
            )));
        }
        Ok(Self {
            config,
            coef: None,
            n_iter: 0,
        })
    }

    pub fn with_alpha(alpha: f64) -> Result<Self> {
        Self::new(LassoConfig {
            alpha,
            ..LassoConfig::default()
        })
    }

    pub fn config(&self) -> &LassoConfig {
        &self.config
    }

    /// Sweeps used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn coordinate_descent(&mut self, x: &DenseMatrix, y: &[f64]) -> Vec<f64> {
        let n = x.nrows();
        let p = x.ncols();
        let penalty = self.config.alpha * n as f64;

        let cols: Vec<Vec<f64>> = (0..p).map(|j| x.col(j)).collect();
        let col_sq = x.col_sq_norms();

        let mut coef = match self.coef.take() {
            Some(previous) if self.config.warm_start && previous.len() == p => previous,
            _ => vec![0.0; p],
        };
        let fitted = x.mat_vec(&coef);
        let mut residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();

        let mut order: Vec<usize> = (0..p).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        self.n_iter = 0;
        for iter in 0..self.config.max_iter {
            self.n_iter = iter + 1;
            let mut max_change = 0.0_f64;
            if self.config.selection == Selection::Random {
                order.shuffle(&mut rng);
            }

            for &j in &order {
                if col_sq[j] < ZERO_COLUMN {
                    continue;
                }
                let old = coef[j];
                // rho = x_j' (y - X_{-j} w_{-j})
                let rho = DenseMatrix::dot(&cols[j], &residuals) + col_sq[j] * old;
                let mut new = soft_threshold(rho, penalty) / col_sq[j];
                if self.config.positive && new < 0.0 {
                    new = 0.0;
                }

                let delta = new - old;
                if delta != 0.0 {
                    for (r, xij) in residuals.iter_mut().zip(&cols[j]) {
                        *r -= xij * delta;
                    }
                }
                coef[j] = new;
                max_change = max_change.max(delta.abs());
            }

            if max_change < self.config.tol {
                debug!(
                    "Lasso converged after {} sweeps (alpha = {})",
                    self.n_iter, self.config.alpha
                );
                return coef;
            }
        }

        warn!(
            "Lasso did not converge in {} sweeps (alpha = {})",
            self.config.max_iter, self.config.alpha
        );
        coef
    }
}

impl Regressor for Lasso {
    fn name(&self) -> &'static str {
        "lasso"
    }

    fn fit(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<()> {
        if let Err(e) = check_rows(x, y.len(), "y") {
            self.coef = None;
            return Err(e);
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            self.coef = None;
            return Err(epistasis_linalg::LinalgError::EmptyMatrix {
                nrows: x.nrows(),
                ncols: x.ncols(),
            }
            .into());
        }
        let coef = self.coordinate_descent(x, y);
        self.coef = Some(coef);
        Ok(())
    }

    fn coefficients(&self) -> Option<&[f64]> {
        self.coef.as_deref()
    }

    fn l1_penalty(&self) -> Option<f64> {
        Some(self.config.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Orthogonal +-1 design: 4 rows, intercept and two contrasts.
    fn design() -> DenseMatrix {
        DenseMatrix::from_rows(&[
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, -1.0],
            vec![1.0, -1.0, 1.0],
            vec![1.0, -1.0, -1.0],
        ])
    }

    #[test]
    fn test_zero_alpha_matches_least_squares() {
        let y = [4.0, 2.0, 0.0, -2.0];
        let mut lasso = Lasso::with_alpha(0.0).unwrap();
        lasso.fit(&design(), &y).unwrap();
        let coef = lasso.coefficients().unwrap();
        assert!((coef[0] - 1.0).abs() < 1e-8);
        assert!((coef[1] - 2.0).abs() < 1e-8);
        assert!((coef[2] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_orthogonal_design_soft_thresholds() {
        // x_j'y / n = (1, 2, 1); alpha 1.5 keeps only the middle term.
        let y = [4.0, 2.0, 0.0, -2.0];
        let mut lasso = Lasso::with_alpha(1.5).unwrap();
        lasso.fit(&design(), &y).unwrap();
        let coef = lasso.coefficients().unwrap();
        assert_eq!(coef[0], 0.0);
        assert!((coef[1] - 0.5).abs() < 1e-10);
        assert_eq!(coef[2], 0.0);
        assert_eq!(lasso.l1_penalty(), Some(1.5));
    }

    #[test]
    fn test_positive_constraint() {
        let y = [-4.0, -2.0, 0.0, 2.0];
        let mut lasso = Lasso::new(LassoConfig {
            alpha: 0.1,
            positive: true,
            ..LassoConfig::default()
        })
        .unwrap();
        lasso.fit(&design(), &y).unwrap();
        assert!(lasso.coefficients().unwrap().iter().all(|&c| c >= 0.0));
    }

    #[test]
    fn test_warm_start_resumes_from_previous_fit() {
        let y = [4.0, 2.0, 0.0, -2.0];
        let config = LassoConfig {
            alpha: 0.5,
            warm_start: true,
            ..LassoConfig::default()
        };
        let mut lasso = Lasso::new(config).unwrap();
        lasso.fit(&design(), &y).unwrap();
        let cold = lasso.coefficients().unwrap().to_vec();
        assert!(lasso.n_iter() > 1);

        // Already at the optimum: one sweep moves nothing.
        lasso.fit(&design(), &y).unwrap();
        assert_eq!(lasso.n_iter(), 1);
        for (a, b) in cold.iter().zip(lasso.coefficients().unwrap()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cold_start_ignores_previous_fit() {
        let y = [4.0, 2.0, 0.0, -2.0];
        let mut lasso = Lasso::with_alpha(0.5).unwrap();
        lasso.fit(&design(), &y).unwrap();
        let first = lasso.n_iter();
        lasso.fit(&design(), &y).unwrap();
        assert_eq!(lasso.n_iter(), first);
    }

    #[test]
    fn test_random_selection_reaches_cyclic_solution() {
        let y = [4.0, 2.0, 0.0, -2.0];
        let mut cyclic = Lasso::with_alpha(0.5).unwrap();
        cyclic.fit(&design(), &y).unwrap();

        let random_config = LassoConfig {
            alpha: 0.5,
            selection: Selection::Random,
            seed: 7,
            ..LassoConfig::default()
        };
        let mut a = Lasso::new(random_config.clone()).unwrap();
        let mut b = Lasso::new(random_config).unwrap();
        a.fit(&design(), &y).unwrap();
        b.fit(&design(), &y).unwrap();

        assert_eq!(a.coefficients(), b.coefficients());
        for (r, c) in a.coefficients().unwrap().iter().zip(cyclic.coefficients().unwrap()) {
            assert!((r - c).abs() < 1e-8);
        }
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(matches!(
            Lasso::with_alpha(-1.0),
            Err(EpistasisError::Configuration(_))
        ));
        assert!(Lasso::with_alpha(f64::NAN).is_err());
    }
}
