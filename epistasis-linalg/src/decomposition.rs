#![allow(clippy::needless_range_loop)]
//! Matrix decompositions and solvers.
//!
//! Cholesky backs the Newton steps of the logistic classifier, thin QR
//! gives its hat-matrix diagonal, and [`least_squares`] is the
//! minimum-norm solver behind ordinary least-squares fits.

use crate::dense::DenseMatrix;
use thiserror::Error;

/// Relative cutoff below which eigenvalues of `X'X` are treated as zero.
///
/// Eigenvalues are squared singular values, so this drops directions whose
/// singular value is under `1e-5` of the largest one.
pub const RCOND: f64 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("Singular matrix encountered")]
    SingularMatrix,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Empty matrix ({nrows} x {ncols})")]
    EmptyMatrix { nrows: usize, ncols: usize },
}

/// Cholesky factor `L` with `A = L L'`.
pub struct CholeskyDecomp {
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    /// Factor a symmetric positive definite matrix.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let diag = a.get(j, j) - sum;
            if diag <= 0.0 || !diag.is_finite() {
                return Err(LinalgError::NotPositiveDefinite);
            }
            l.set(j, j, diag.sqrt());

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Solve `L L' x = b` by forward then backward substitution.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.nrows();
        assert_eq!(b.len(), n);

        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l.get(i, j) * y[j];
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }
        x
    }

    /// Diagonal of `A^{-1}`, used for coefficient standard errors.
    pub fn inverse_diag(&self) -> Vec<f64> {
        let n = self.l.nrows();
        (0..n)
            .map(|j| {
                let mut e = vec![0.0; n];
                e[j] = 1.0;
                self.solve(&e)[j]
            })
            .collect()
    }
}

/// Thin QR decomposition `A = Q R` of an m x n matrix with m >= n.
pub struct QrDecomp {
    pub q: DenseMatrix,
    pub r: DenseMatrix,
}

impl QrDecomp {
    /// Modified Gram-Schmidt. Fails on rank-deficient input.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let m = a.nrows();
        let n = a.ncols();
        if m < n {
            return Err(LinalgError::DimensionMismatch { expected: n, got: m });
        }

        let mut q = DenseMatrix::zeros(m, n);
        let mut r = DenseMatrix::zeros(n, n);
        let mut cols: Vec<Vec<f64>> = (0..n).map(|j| a.col(j)).collect();

        for j in 0..n {
            for i in 0..j {
                let q_col = q.col(i);
                let rij = DenseMatrix::dot(&q_col, &cols[j]);
                r.set(i, j, rij);
                for k in 0..m {
                    cols[j][k] -= rij * q_col[k];
                }
            }

            let norm = DenseMatrix::dot(&cols[j], &cols[j]).sqrt();
            if norm < 1e-14 {
                return Err(LinalgError::SingularMatrix);
            }
            r.set(j, j, norm);
            for k in 0..m {
                q.set(k, j, cols[j][k] / norm);
            }
        }

        Ok(QrDecomp { q, r })
    }

    /// Diagonal of the projection `Q Q'`, i.e. the leverages of `A`.
    pub fn leverages(&self) -> Vec<f64> {
        let m = self.q.nrows();
        let mut h = vec![0.0; m];
        for j in 0..self.q.ncols() {
            for i in 0..m {
                let qij = self.q.get(i, j);
                h[i] += qij * qij;
            }
        }
        h
    }
}

/// Eigen-decomposition of a symmetric matrix: eigenvalues (ascending, as
/// faer returns them) and the matching eigenvectors as columns.
pub fn symmetric_eigen(a: &DenseMatrix) -> Result<(Vec<f64>, DenseMatrix), LinalgError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }
    let evd = a.as_faer().selfadjoint_eigendecomposition(faer::Side::Lower);
    let s = evd.s().column_vector();
    let u = evd.u();
    let values: Vec<f64> = (0..n).map(|i| s.read(i)).collect();
    let vectors = DenseMatrix::from_fn(n, n, |i, j| u.read(i, j));
    Ok((values, vectors))
}

/// Minimum-norm least-squares solution of `X beta = y`.
///
/// Uses the pseudo-inverse of `X'X` built from its eigen-decomposition, so
/// under-determined and collinear designs still return the smallest-norm
/// minimiser. Exactly determined full-rank systems are solved exactly.
pub fn least_squares(x: &DenseMatrix, y: &[f64]) -> Result<Vec<f64>, LinalgError> {
    let (n, p) = (x.nrows(), x.ncols());
    if n == 0 || p == 0 {
        return Err(LinalgError::EmptyMatrix { nrows: n, ncols: p });
    }
    if y.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: y.len(),
        });
    }

    let (values, vectors) = symmetric_eigen(&x.gram())?;
    let max_value = values.iter().cloned().fold(0.0_f64, f64::max);
    if max_value <= 0.0 {
        return Err(LinalgError::SingularMatrix);
    }
    let cutoff = max_value * RCOND;

    // beta = V diag(1/lambda) V' X'y over the retained eigenpairs.
    let xty = x.t_mat_vec(y);
    let mut beta = vec![0.0; p];
    for k in 0..p {
        if values[k] <= cutoff {
            continue;
        }
        let v = vectors.col(k);
        let coef = DenseMatrix::dot(&v, &xty) / values[k];
        for j in 0..p {
            beta[j] += coef * v[j];
        }
    }
    Ok(beta)
}

/// Solve a symmetric positive definite system `A x = b`.
pub fn solve_spd(a: &DenseMatrix, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
    Ok(CholeskyDecomp::new(a)?.solve(b))
}
