//! epistasis-linalg: dense linear algebra for epistasis model fitting.
//!
//! Provides the dense design-matrix type shared by every crate in the
//! workspace, plus the factorizations the regressors and the classifier
//! are built on (Cholesky, thin QR and minimum-norm least squares).

pub mod decomposition;
pub mod dense;

pub use decomposition::LinalgError;
pub use dense::DenseMatrix;
