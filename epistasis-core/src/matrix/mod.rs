//! Model matrices: genotypes x interaction terms.
//!
//! The model type fixes how a (genotype, term) pair becomes a number.
//! Both encodings share the same [`InteractionIndex`], so switching
//! parameterization never changes term order or labels.

pub mod cache;

use std::fmt;
use std::str::FromStr;

use epistasis_linalg::DenseMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{EpistasisError, Result};
use crate::interaction::{InteractionIndex, InteractionTerm};

pub use cache::{MatrixCache, Purpose};

/// Encoding rule from (genotype, term) to a design-matrix entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// 1 when every site of the term is mutated, else 0.
    #[default]
    Global,
    /// Product over the term's sites of +1 (wildtype) or -1 (mutated).
    Walsh,
}

impl ModelType {
    /// Entry for one term given a genotype's mutated flags (0-based).
    fn entry(self, term: &InteractionTerm, mutated: &[bool]) -> f64 {
        match self {
            ModelType::Global => {
                if term.sites().iter().all(|&s| mutated[s - 1]) {
                    1.0
                } else {
                    0.0
                }
            }
            ModelType::Walsh => term
                .sites()
                .iter()
                .map(|&s| if mutated[s - 1] { -1.0 } else { 1.0 })
                .product(),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Global => write!(f, "global"),
            ModelType::Walsh => write!(f, "walsh"),
        }
    }
}

impl FromStr for ModelType {
    type Err = EpistasisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "global" => Ok(ModelType::Global),
            "walsh" | "hadamard" => Ok(ModelType::Walsh),
            other => Err(EpistasisError::Configuration(format!(
                "unknown model type '{}' (expected 'global' or 'walsh')",
                other
            ))),
        }
    }
}

/// Parse a binary genotype into per-position mutated flags.
fn mutated_flags(genotype: &str, n_positions: usize) -> Result<Vec<bool>> {
    let len = genotype.chars().count();
    if len != n_positions {
        return Err(EpistasisError::Dimension {
            genotype: genotype.to_string(),
            expected: n_positions,
            got: len,
        });
    }
    genotype
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(EpistasisError::InvalidGenotype(genotype.to_string())),
        })
        .collect()
}

/// Build the model matrix for binary `genotypes` (rows, in the order given)
/// over the terms of `index` (columns).
pub fn build_model_matrix(
    genotypes: &[String],
    index: &InteractionIndex,
    model_type: ModelType,
) -> Result<DenseMatrix> {
    let n_positions = index.n_positions();
    let flags = genotypes
        .iter()
        .map(|g| mutated_flags(g, n_positions))
        .collect::<Result<Vec<_>>>()?;

    let terms = index.terms();
    Ok(DenseMatrix::from_fn(genotypes.len(), terms.len(), |i, j| {
        model_type.entry(&terms[j], &flags[i])
    }))
}
