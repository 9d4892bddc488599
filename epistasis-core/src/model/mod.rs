//! Epistasis models: regression, classifier and their mixed composition.

pub mod classifier;
pub mod mixed;
pub mod regression;
pub mod summary;

use serde::{Deserialize, Serialize};

use crate::matrix::ModelType;

pub use classifier::EpistasisClassifier;
pub use mixed::{EpistasisMixedLinearRegression, EpistasisMixedRegression};
pub use regression::{EpistasisLasso, EpistasisLinearRegression, EpistasisRegression};
pub use summary::ModelSummary;

/// Structural choices fixed at model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Highest interaction order.
    pub order: usize,
    pub model_type: ModelType,
    /// Model an order-0 intercept term.
    pub intercept: bool,
}

impl ModelSpec {
    pub fn new(order: usize, model_type: ModelType) -> Self {
        Self {
            order,
            model_type,
            intercept: true,
        }
    }
}
