//! epistasis-gpm: genotype-phenotype maps for epistasis models.
//!
//! Provides the [`GenotypePhenotypeMap`] consumed by the model crates:
//! observed genotypes and phenotypes, measurement uncertainty, per-site
//! alphabets, binary encoding and the complete genotype space.

pub mod encoding;
pub mod gpm;
pub mod io;

pub use encoding::BinaryEncoding;
pub use gpm::{GenotypePhenotypeMap, Uncertainty};
