//! epistasis-core: epistasis model fitting.
//!
//! Enumerates interaction terms, builds model matrices over a genotype
//! space, fits linear (OLS or Lasso) epistasis models and composes them
//! with a threshold classifier into mixed models.

pub mod classifier;
pub mod error;
pub mod interaction;
pub mod map;
pub mod matrix;
pub mod model;
pub mod orchestrate;
pub mod regressor;
pub mod util;

pub use error::{EpistasisError, Result};
pub use interaction::{InteractionIndex, InteractionTerm};
pub use map::EpistasisMap;
pub use matrix::{build_model_matrix, MatrixCache, ModelType, Purpose};
pub use model::{
    EpistasisClassifier, EpistasisLasso, EpistasisLinearRegression,
    EpistasisMixedLinearRegression, EpistasisMixedRegression, EpistasisRegression, ModelSpec,
    ModelSummary,
};
pub use orchestrate::{Partition, Source};
