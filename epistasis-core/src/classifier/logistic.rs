//! Logistic regression with Firth's bias reduction.
//!
//! Modified Newton-Raphson with Firth's penalty, which adds
//! h_i * (0.5 - pi_i) to the score function, where h_i is the i-th diagonal
//! of the hat matrix H = W^{1/2} X (X'WX)^{-1} X' W^{1/2}. Keeps estimates
//! finite under complete separation, which small genotype sets hit often.

use epistasis_linalg::decomposition::{CholeskyDecomp, QrDecomp};
use epistasis_linalg::{DenseMatrix, LinalgError};
use tracing::{debug, warn};

use super::Classifier;
use crate::error::{EpistasisError, Result};
use crate::regressor::check_rows;
use crate::util::math::logistic;

/// Largest absolute change allowed to a coefficient in one Newton step.
const MAX_STEP: f64 = 5.0;

/// Configuration for the logistic classifier.
#[derive(Debug, Clone)]
pub struct LogisticConfig {
    /// Maximum Newton-Raphson iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the largest coefficient change.
    pub tol: f64,
    /// L2 regularization parameter.
    pub l2_penalty: f64,
    /// Apply Firth's penalty.
    pub firth: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-6,
            l2_penalty: 0.0,
            firth: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
    beta: Option<Vec<f64>>,
    iterations: usize,
    converged: bool,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.beta.as_deref()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    fn newton_raphson(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<Vec<f64>> {
        let n = y.len();
        let p = x.ncols();
        let mut beta = vec![0.0; p];

        self.converged = false;
        for iter in 0..self.config.max_iter {
            self.iterations = iter + 1;
            let mu: Vec<f64> = x.mat_vec(&beta).into_iter().map(logistic).collect();

            // Working weights W = mu * (1 - mu)
            let w: Vec<f64> = mu.iter().map(|&m| (m * (1.0 - m)).max(1e-10)).collect();

            let hat_diag = if self.config.firth {
                let w_sqrt: Vec<f64> = w.iter().map(|wi| wi.sqrt()).collect();
                let wx = DenseMatrix::from_fn(n, p, |i, j| w_sqrt[i] * x.get(i, j));
                compute_hat_diagonal(&wx).unwrap_or_else(|_| vec![0.0; n])
            } else {
                vec![0.0; n]
            };

            // Score: X' (y - mu + h (0.5 - mu)) - l2 * beta
            let residuals: Vec<f64> = (0..n)
                .map(|i| y[i] - mu[i] + hat_diag[i] * (0.5 - mu[i]))
                .collect();
            let mut score = x.t_mat_vec(&residuals);

            let mut info = x.xtwx(&w);
            if self.config.l2_penalty > 0.0 {
                for j in 0..p {
                    info.set(j, j, info.get(j, j) + self.config.l2_penalty);
                    score[j] -= self.config.l2_penalty * beta[j];
                }
            }

            let delta = match CholeskyDecomp::new(&info) {
                Ok(chol) => chol.solve(&score),
                Err(_) => {
                    // Add regularization and retry
                    for j in 0..p {
                        info.set(j, j, info.get(j, j) + 1e-6);
                    }
                    CholeskyDecomp::new(&info)?.solve(&score)
                }
            };

            let largest = delta.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
            if !largest.is_finite() {
                return Err(LinalgError::SingularMatrix.into());
            }
            let scale = if largest > MAX_STEP {
                MAX_STEP / largest
            } else {
                1.0
            };
            for (b, d) in beta.iter_mut().zip(&delta) {
                *b += scale * d;
            }

            if largest < self.config.tol {
                self.converged = true;
                debug!("Logistic classifier converged in {} iterations", iter + 1);
                return Ok(beta);
            }
        }

        warn!(
            "Logistic classifier did not converge in {} iterations",
            self.config.max_iter
        );
        Ok(beta)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &DenseMatrix, labels: &[bool]) -> Result<()> {
        self.beta = None;
        check_rows(x, labels.len(), "labels")?;
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(LinalgError::EmptyMatrix {
                nrows: x.nrows(),
                ncols: x.ncols(),
            }
            .into());
        }
        let y: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let beta = self.newton_raphson(x, &y)?;
        self.beta = Some(beta);
        Ok(())
    }

    fn predict_proba(&self, x: &DenseMatrix) -> Result<Vec<f64>> {
        let beta = self.beta.as_deref().ok_or(EpistasisError::NotFitted)?;
        if x.ncols() != beta.len() {
            return Err(EpistasisError::ShapeMismatch {
                expected: x.ncols(),
                got: beta.len(),
            });
        }
        Ok(x.mat_vec(beta).into_iter().map(logistic).collect())
    }

    fn is_fitted(&self) -> bool {
        self.beta.is_some()
    }
}

/// Diagonal of the hat matrix H = A (A'A)^{-1} A' where A = W^{1/2} X.
fn compute_hat_diagonal(wx: &DenseMatrix) -> std::result::Result<Vec<f64>, LinalgError> {
    Ok(QrDecomp::new(wx)?.leverages())
}
