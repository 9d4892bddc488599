//! Error taxonomy for model construction, fitting and prediction.

use epistasis_linalg::LinalgError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpistasisError {
    /// Invalid order, alphabet or hyperparameter at construction.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A genotype does not match the expected binary length.
    #[error("Genotype '{genotype}' has length {got}, expected {expected}")]
    Dimension {
        genotype: String,
        expected: usize,
        got: usize,
    },

    /// A binary genotype holds something other than `0`/`1`.
    #[error("Genotype '{0}' is not a binary string")]
    InvalidGenotype(String),

    /// Data was requested from the bound dataset but none is attached.
    #[error("No genotype-phenotype map attached; call add_gpm or pass X and y explicitly")]
    UnboundDataset,

    #[error("Model has not been fitted")]
    NotFitted,

    /// Coefficient count disagrees with the interaction index.
    #[error("Coefficient vector has length {got}, expected {expected} interaction terms")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Invalid uncertainty: {0}")]
    InvalidUncertainty(String),

    /// Some genotypes of the complete space have no observed phenotype.
    #[error("{missing} of {total} genotypes in the complete space have no observed phenotype")]
    IncompletePhenotypes { missing: usize, total: usize },

    /// Rows of X and y (or a mask) disagree.
    #[error("Row mismatch: X has {x_rows} rows but {what} has {got}")]
    RowMismatch {
        what: &'static str,
        x_rows: usize,
        got: usize,
    },

    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

pub type Result<T> = std::result::Result<T, EpistasisError>;
