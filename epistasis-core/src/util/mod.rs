//! Numeric helpers shared by the regressors, the classifier and the models.

pub mod math;
