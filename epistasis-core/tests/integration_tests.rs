//! Integration tests on a complete three-site binary landscape.
//!
//! Wildtype `000`, all eight genotypes observed, phenotypes falling with
//! the number of mutations plus pairwise and three-way epistasis.

use std::sync::Arc;

use epistasis_core::regressor::{LinearRegression, Regressor};
use epistasis_core::{EpistasisError, Result};
use epistasis_gpm::GenotypePhenotypeMap;
use epistasis_linalg::DenseMatrix;

const GENOTYPES: [&str; 8] = ["000", "001", "010", "100", "011", "101", "110", "111"];
const PHENOTYPES: [f64; 8] = [
    2.5838167335880149,
    2.4803514336043708,
    2.2205925336075762,
    2.1864673462520905,
    1.5622922695718136,
    1.8972733199455831,
    1.3324426002143119,
    1.7367637632162392,
];
const STDEV: f64 = 0.01;
const THRESHOLD: f64 = 1.5622922695718136;

fn landscape() -> Arc<GenotypePhenotypeMap> {
    let genotypes = GENOTYPES.iter().map(|g| g.to_string()).collect();
    let gpm = GenotypePhenotypeMap::new("000", genotypes, PHENOTYPES.to_vec())
        .expect("valid landscape")
        .with_stdeviations(STDEV)
        .expect("positive stdev");
    Arc::new(gpm)
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() < tol, "index {}: {} vs {}", i, x, y);
    }
}

/// OLS that remembers every (X, y) it was fitted on.
#[derive(Debug, Clone, Default)]
struct RecordingRegressor {
    inner: LinearRegression,
    fits: Vec<(DenseMatrix, Vec<f64>)>,
}

impl Regressor for RecordingRegressor {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn fit(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<()> {
        self.fits.push((x.clone(), y.to_vec()));
        self.inner.fit(x, y)
    }

    fn coefficients(&self) -> Option<&[f64]> {
        self.inner.coefficients()
    }
}

mod interaction_index {
    use epistasis_core::InteractionIndex;

    #[test]
    fn test_three_sites_order_three_has_seven_terms() {
        let index = InteractionIndex::build(3, 3).unwrap();
        assert_eq!(index.len(), 7);
        assert!(index.terms().iter().all(|t| !t.is_intercept()));
        assert_eq!(InteractionIndex::with_intercept(3, 3).unwrap().len(), 8);
    }
}

mod linear_regression {
    use super::*;
    use epistasis_core::{EpistasisLinearRegression, ModelType, Purpose, Source};

    fn fitted(model_type: ModelType) -> EpistasisLinearRegression {
        let mut model = EpistasisLinearRegression::linear(3, model_type).unwrap();
        model.add_gpm(landscape()).unwrap();
        model.fit(Source::Observed, Source::Observed).unwrap();
        model
    }

    #[test]
    fn test_exact_fit_reproduces_phenotypes() {
        let mut model = fitted(ModelType::Global);
        assert_eq!(model.thetas().unwrap().len(), 8);
        assert_eq!(model.epistasis().unwrap().values().unwrap().len(), 8);

        let yhat = model.predict(Source::Observed).unwrap();
        assert_close(&yhat, &PHENOTYPES, 1e-8);
        assert!((model.score(Source::Observed, Source::Observed).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_global_coefficients_are_background_free_effects() {
        let model = fitted(ModelType::Global);
        let map = model.epistasis().unwrap();
        let values = map.values().unwrap();
        // Intercept is the wildtype phenotype.
        assert!((values[0] - PHENOTYPES[0]).abs() < 1e-8);
        // Term [3] is the effect of mutating the last site alone.
        let first = map.get_order(1);
        assert_eq!(first.labels, vec![vec![1], vec![2], vec![3]]);
        let additive = first.values.unwrap();
        assert!((additive[2] - (PHENOTYPES[1] - PHENOTYPES[0])).abs() < 1e-8);
        assert_eq!(map.get_order(3).labels, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_walsh_fit_is_also_exact() {
        let mut model = fitted(ModelType::Walsh);
        let yhat = model.hypothesis(Source::Observed, None).unwrap();
        assert_close(&yhat, &PHENOTYPES, 1e-8);
        // Walsh intercept is the landscape mean.
        let mean = PHENOTYPES.iter().sum::<f64>() / 8.0;
        assert!((model.thetas().unwrap()[0] - mean).abs() < 1e-8);
    }

    #[test]
    fn test_complete_space_predictions_follow_complete_order() {
        let mut model = fitted(ModelType::Global);
        let gpm = landscape();
        let complete = gpm.complete_genotypes();
        assert_eq!(complete[3], "011");

        let yhat = model.predict(Source::Complete).unwrap();
        let expected: Vec<f64> = complete
            .iter()
            .map(|g| gpm.phenotype_of(g).unwrap())
            .collect();
        assert_close(&yhat, &expected, 1e-8);

        assert!((model.score(Source::Complete, Source::Complete).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_predict_reuses_cached_matrix() {
        let mut model = fitted(ModelType::Global);
        assert!(model.matrix_cache().contains(Purpose::Fit));
        assert!(!model.matrix_cache().contains(Purpose::Predict));

        let first = model.predict(Source::Observed).unwrap();
        let builds = model.matrix_cache().builds();
        let second = model.predict(Source::Observed).unwrap();
        assert!(model.matrix_cache().contains(Purpose::Predict));
        assert_eq!(model.matrix_cache().builds(), builds);
        assert_eq!(first, second);
    }

    #[test]
    fn test_log_likelihood_peaks_at_exact_fit() {
        let mut model = fitted(ModelType::Global);
        let ll = model
            .log_likelihood(Source::Observed, Source::Observed, Source::Observed, None)
            .unwrap();
        let peak = -0.5 * (2.0 * std::f64::consts::PI * STDEV * STDEV).ln();
        assert_close(&ll, &[peak; 8], 1e-4);

        let shifted: Vec<f64> = model.thetas().unwrap().iter().map(|t| t + 0.01).collect();
        let total = model
            .total_log_likelihood(Source::Observed, Source::Observed, Source::Observed, Some(&shifted))
            .unwrap();
        assert!(total < 8.0 * peak);
    }

    #[test]
    fn test_explicit_arguments_are_validated() {
        let mut model = fitted(ModelType::Global);
        assert!(matches!(
            model.log_likelihood(
                Source::Observed,
                Source::Observed,
                Source::Explicit(vec![STDEV; 7]),
                None,
            ),
            Err(EpistasisError::InvalidUncertainty(_))
        ));
        assert!(matches!(
            model.fit(Source::Observed, Source::Explicit(vec![1.0; 3])),
            Err(EpistasisError::RowMismatch { .. })
        ));
        assert!(!model.is_fitted());
    }
}

mod lasso {
    use super::*;
    use epistasis_core::regressor::LassoConfig;
    use epistasis_core::{EpistasisLasso, ModelType, Source};

    #[test]
    fn test_sparsity_statistics_agree_with_map() {
        let config = LassoConfig {
            alpha: 0.02,
            ..LassoConfig::default()
        };
        let mut model = EpistasisLasso::lasso(3, ModelType::Walsh, config).unwrap();
        model.add_gpm(landscape()).unwrap();
        model.fit(Source::Observed, Source::Observed).unwrap();

        // Only the (2,3) Walsh coefficient (~0.017) falls below alpha.
        let map = model.epistasis().unwrap();
        assert_eq!(map.get_order(2).values.unwrap()[2], 0.0);
        assert_eq!(model.num_of_params().unwrap(), map.active_parameter_count().unwrap());
        assert!(model.num_of_params().unwrap() < map.total_parameter_count());
        assert_eq!(
            model.compression_ratio().unwrap(),
            map.compression_ratio().unwrap()
        );
    }

    #[test]
    fn test_zero_alpha_matches_least_squares() {
        let config = LassoConfig {
            alpha: 0.0,
            tol: 1e-12,
            ..LassoConfig::default()
        };
        let mut model = EpistasisLasso::lasso(3, ModelType::Walsh, config).unwrap();
        model.add_gpm(landscape()).unwrap();
        model.fit(Source::Observed, Source::Observed).unwrap();
        let yhat = model.predict(Source::Observed).unwrap();
        assert_close(&yhat, &PHENOTYPES, 1e-8);
        assert_eq!(model.num_of_params().unwrap(), 8);
    }
}

mod mixed_regression {
    use super::*;
    use epistasis_core::classifier::LogisticRegression;
    use epistasis_core::{EpistasisMixedRegression, ModelType, Source};

    type Mixed = EpistasisMixedRegression<RecordingRegressor, LogisticRegression>;

    fn fitted() -> Mixed {
        let mut mixed = Mixed::new(
            3,
            THRESHOLD,
            ModelType::Global,
            RecordingRegressor::default(),
            LogisticRegression::default(),
        )
        .unwrap();
        mixed.add_gpm(landscape()).unwrap();
        mixed.fit().unwrap();
        mixed
    }

    #[test]
    fn test_only_above_threshold_rows_reach_the_regressor() {
        let mixed = fitted();
        let fits = &mixed.model().regressor().fits;
        assert_eq!(fits.len(), 1);
        let (x, y) = &fits[0];
        assert_eq!(x.nrows(), 6);
        assert_eq!(x.ncols(), 8);
        assert!(y.iter().all(|&v| v > THRESHOLD));
        // The genotype sitting exactly at the threshold is excluded.
        assert!(!y.contains(&PHENOTYPES[4]));
    }

    #[test]
    fn test_thetas_are_the_inner_model_coefficients() {
        let mixed = fitted();
        assert_eq!(mixed.thetas().unwrap().len(), 8);
        assert_eq!(
            mixed.thetas().unwrap(),
            mixed.model().epistasis().unwrap().values().unwrap()
        );
    }

    #[test]
    fn test_complete_predictions_cover_the_whole_space() {
        let mut mixed = fitted();
        let yhat = mixed.predict(Source::Complete).unwrap();
        assert_eq!(yhat.len(), 8);
        assert!(yhat.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_observed_predictions_compose_classifier_and_regression() {
        let mut mixed = fitted();
        let classes = mixed.model().partition().unwrap().observed.clone();
        let yhat = mixed.predict(Source::Observed).unwrap();
        assert_eq!(yhat.len(), 8);
        for i in 0..8 {
            if !classes[i] {
                assert_eq!(yhat[i], THRESHOLD);
            } else if PHENOTYPES[i] > THRESHOLD {
                // Retained and fitted: the regression interpolates it.
                assert!((yhat[i] - PHENOTYPES[i]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_partition_reflects_classifier_on_both_spaces() {
        let mixed = fitted();
        let partition = mixed.model().partition().unwrap();
        assert_eq!(partition.threshold, THRESHOLD);
        assert_eq!(partition.observed.len(), 8);
        assert_eq!(partition.complete.len(), 8);
    }

    #[test]
    fn test_unbound_mixed_model_cannot_fit() {
        let mut mixed = Mixed::new(
            3,
            THRESHOLD,
            ModelType::Global,
            RecordingRegressor::default(),
            LogisticRegression::default(),
        )
        .unwrap();
        assert_eq!(mixed.fit(), Err(EpistasisError::UnboundDataset));
        assert_eq!(mixed.predict(Source::Complete), Err(EpistasisError::NotFitted));
    }
}

mod multiallelic {
    use super::*;
    use epistasis_core::{EpistasisLinearRegression, EpistasisMixedLinearRegression, ModelType, Source};

    // Site 1 over {A, C, G}, site 2 over {T, A}; wildtype AT.
    const COMPLETE: [&str; 6] = ["AT", "AA", "CT", "CA", "GT", "GA"];
    const COMPLETE_PHENOTYPES: [f64; 6] = [1.0, 2.0, 4.0, 7.0, 3.0, 0.5];

    /// Every genotype observed, listed out of complete-space order.
    fn two_site() -> Arc<GenotypePhenotypeMap> {
        let order = [3, 0, 5, 1, 4, 2];
        let genotypes = order.iter().map(|&i| COMPLETE[i].to_string()).collect();
        let phenotypes = order.iter().map(|&i| COMPLETE_PHENOTYPES[i]).collect();
        let gpm = GenotypePhenotypeMap::with_mutations(
            "AT",
            genotypes,
            phenotypes,
            vec![vec!['A', 'C', 'G'], vec!['T', 'A']],
        )
        .expect("valid landscape");
        Arc::new(gpm)
    }

    #[test]
    fn test_terms_never_pair_letters_of_one_site() {
        let mut model = EpistasisLinearRegression::linear(2, ModelType::Global).unwrap();
        model.add_gpm(two_site()).unwrap();
        assert_eq!(
            model.epistasis().unwrap().labels(),
            vec![vec![], vec![1], vec![2], vec![3], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_full_order_fit_is_exact_in_complete_order() {
        let gpm = two_site();
        let mut model = EpistasisLinearRegression::linear(2, ModelType::Global).unwrap();
        model.add_gpm(Arc::clone(&gpm)).unwrap();
        model.fit(Source::Observed, Source::Observed).unwrap();
        assert_eq!(model.thetas().unwrap().len(), 6);

        let observed = model.predict(Source::Observed).unwrap();
        assert_close(&observed, gpm.phenotypes(), 1e-8);

        assert_eq!(gpm.complete_genotypes(), COMPLETE.to_vec());
        let complete = model.predict(Source::Complete).unwrap();
        assert_close(&complete, &COMPLETE_PHENOTYPES, 1e-8);
    }

    #[test]
    fn test_mixed_model_covers_the_complete_space() {
        let threshold = 1.5;
        let mut mixed =
            EpistasisMixedLinearRegression::linear(2, threshold, ModelType::Global).unwrap();
        mixed.add_gpm(two_site()).unwrap();
        mixed.fit().unwrap();

        let yhat = mixed.predict(Source::Complete).unwrap();
        assert_eq!(yhat.len(), 6);
        assert!(yhat.iter().all(|v| v.is_finite()));

        let classes = &mixed.model().partition().unwrap().complete;
        assert_eq!(classes.len(), 6);
        for (keep, value) in classes.iter().zip(&yhat) {
            if !keep {
                assert_eq!(*value, threshold);
            }
        }

        let explicit = mixed
            .predict(Source::Explicit(vec!["CA".to_string(), "GA".to_string()]))
            .unwrap();
        assert_eq!(explicit.len(), 2);
    }
}
