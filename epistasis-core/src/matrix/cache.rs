//! Memoized model matrices.
//!
//! One slot per [`Purpose`]. A slot is reused only when the genotype list,
//! the interaction index and the model type all match the key it was built
//! with; anything else rebuilds and replaces it.

use std::collections::HashMap;

use epistasis_linalg::DenseMatrix;
use tracing::debug;

use super::{build_model_matrix, ModelType};
use crate::error::Result;
use crate::interaction::InteractionIndex;

/// What a cached matrix is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Observed genotypes, for fit/score/likelihood.
    Fit,
    /// Observed genotypes, for predictions.
    Predict,
    /// Complete genotype space, for predictions.
    Complete,
}

/// Everything a model matrix is a function of, compared in full on lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MatrixKey {
    genotypes: Vec<String>,
    index: InteractionIndex,
    model_type: ModelType,
}

impl MatrixKey {
    fn matches(&self, genotypes: &[String], index: &InteractionIndex, model_type: ModelType) -> bool {
        self.model_type == model_type
            && self.index.fingerprint() == index.fingerprint()
            && self.index == *index
            && self.genotypes == genotypes
    }
}

#[derive(Debug, Default, Clone)]
pub struct MatrixCache {
    entries: HashMap<Purpose, (MatrixKey, DenseMatrix)>,
    builds: usize,
}

impl MatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrix for `genotypes`, rebuilt only if the slot's key differs.
    pub fn get_or_build(
        &mut self,
        purpose: Purpose,
        genotypes: &[String],
        index: &InteractionIndex,
        model_type: ModelType,
    ) -> Result<&DenseMatrix> {
        let fresh = matches!(
            self.entries.get(&purpose),
            Some((cached, _)) if cached.matches(genotypes, index, model_type)
        );
        if fresh {
            debug!("Model matrix cache hit for {:?}", purpose);
        } else {
            let x = build_model_matrix(genotypes, index, model_type)?;
            debug!(
                "Built {:?} model matrix: {} x {}",
                purpose,
                x.nrows(),
                x.ncols()
            );
            self.builds += 1;
            let key = MatrixKey {
                genotypes: genotypes.to_vec(),
                index: index.clone(),
                model_type,
            };
            self.entries.insert(purpose, (key, x));
        }
        Ok(&self.entries[&purpose].1)
    }

    pub fn contains(&self, purpose: Purpose) -> bool {
        self.entries.contains_key(&purpose)
    }

    /// Number of matrices built since creation.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genotypes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_repeated_requests_hit_the_cache() {
        let index = InteractionIndex::with_intercept(2, 2).unwrap();
        let g = genotypes(&["00", "01", "10", "11"]);
        let mut cache = MatrixCache::new();
        let first = cache
            .get_or_build(Purpose::Predict, &g, &index, ModelType::Global)
            .unwrap()
            .clone();
        let second = cache
            .get_or_build(Purpose::Predict, &g, &index, ModelType::Global)
            .unwrap()
            .clone();
        assert_eq!(first, second);
        assert_eq!(cache.builds(), 1);
        assert!(cache.contains(Purpose::Predict));
        assert!(!cache.contains(Purpose::Fit));
    }

    #[test]
    fn test_any_key_change_rebuilds() {
        let index = InteractionIndex::with_intercept(2, 2).unwrap();
        let index1 = InteractionIndex::with_intercept(1, 2).unwrap();
        let g = genotypes(&["00", "11"]);
        let g_rev = genotypes(&["11", "00"]);
        let mut cache = MatrixCache::new();

        cache.get_or_build(Purpose::Fit, &g, &index, ModelType::Global).unwrap();
        let walsh = cache
            .get_or_build(Purpose::Fit, &g, &index, ModelType::Walsh)
            .unwrap()
            .clone();
        assert_eq!(walsh.get(1, 1), -1.0);

        let reordered = cache
            .get_or_build(Purpose::Fit, &g_rev, &index, ModelType::Walsh)
            .unwrap()
            .clone();
        assert_eq!(reordered.row(0), walsh.row(1));

        let smaller = cache
            .get_or_build(Purpose::Fit, &g_rev, &index1, ModelType::Walsh)
            .unwrap();
        assert_eq!(smaller.ncols(), 3);
        assert_eq!(cache.builds(), 4);
    }

    #[test]
    fn test_same_size_genotype_lists_are_told_apart() {
        let index = InteractionIndex::with_intercept(2, 2).unwrap();
        let mut cache = MatrixCache::new();
        let before = cache
            .get_or_build(Purpose::Fit, &genotypes(&["00", "01"]), &index, ModelType::Global)
            .unwrap()
            .clone();
        let after = cache
            .get_or_build(Purpose::Fit, &genotypes(&["00", "11"]), &index, ModelType::Global)
            .unwrap()
            .clone();
        assert_eq!(cache.builds(), 2);
        assert_ne!(before, after);
        assert_eq!(
            after,
            build_model_matrix(&genotypes(&["00", "11"]), &index, ModelType::Global).unwrap()
        );

        // A fresh but equal list is a hit.
        cache
            .get_or_build(Purpose::Fit, &genotypes(&["00", "11"]), &index, ModelType::Global)
            .unwrap();
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn test_failed_build_leaves_slot_untouched() {
        let index = InteractionIndex::build(1, 2).unwrap();
        let mut cache = MatrixCache::new();
        assert!(cache
            .get_or_build(Purpose::Fit, &genotypes(&["000"]), &index, ModelType::Global)
            .is_err());
        assert!(!cache.contains(Purpose::Fit));
        assert_eq!(cache.builds(), 0);
    }

    #[test]
    fn test_clear_drops_entries() {
        let index = InteractionIndex::build(1, 2).unwrap();
        let mut cache = MatrixCache::new();
        cache
            .get_or_build(Purpose::Complete, &genotypes(&["01"]), &index, ModelType::Global)
            .unwrap();
        cache.clear();
        assert!(!cache.contains(Purpose::Complete));
    }
}
