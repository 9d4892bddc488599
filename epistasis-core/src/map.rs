//! Epistasis map: interaction terms paired with fitted coefficients.

use serde::Serialize;

use crate::error::{EpistasisError, Result};
use crate::interaction::InteractionIndex;
use crate::util::math::safe_div;

/// One row of a fitted map, as written to `.epistasis.tsv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermRecord {
    pub label: String,
    pub order: usize,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdev: Option<f64>,
}

/// Terms of a single order, with their values when the map is fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSlice {
    pub order: usize,
    pub labels: Vec<Vec<usize>>,
    pub values: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct EpistasisMap {
    index: InteractionIndex,
    values: Option<Vec<f64>>,
    stdeviations: Option<Vec<f64>>,
}

impl EpistasisMap {
    pub fn new(index: InteractionIndex) -> Self {
        Self {
            index,
            values: None,
            stdeviations: None,
        }
    }

    pub fn index(&self) -> &InteractionIndex {
        &self.index
    }

    pub fn labels(&self) -> Vec<Vec<usize>> {
        self.index.labels()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_fitted(&self) -> bool {
        self.values.is_some()
    }

    /// Coefficients in term order.
    pub fn values(&self) -> Result<&[f64]> {
        self.values.as_deref().ok_or(EpistasisError::NotFitted)
    }

    /// Replace the coefficients. Length must equal the number of terms.
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<()> {
        self.check_len(values.len())?;
        self.values = Some(values);
        Ok(())
    }

    pub fn stdeviations(&self) -> Option<&[f64]> {
        self.stdeviations.as_deref()
    }

    pub fn set_stdeviations(&mut self, stdeviations: Vec<f64>) -> Result<()> {
        self.check_len(stdeviations.len())?;
        self.stdeviations = Some(stdeviations);
        Ok(())
    }

    /// Forget fitted values.
    pub(crate) fn reset(&mut self) {
        self.values = None;
        self.stdeviations = None;
    }

    /// Terms of exactly `order` sites (order 0 is the intercept).
    pub fn get_order(&self, order: usize) -> OrderSlice {
        let positions = self.index.positions_of_order(order);
        let terms = self.index.terms();
        OrderSlice {
            order,
            labels: positions
                .iter()
                .map(|&i| terms[i].sites().to_vec())
                .collect(),
            values: self
                .values
                .as_ref()
                .map(|v| positions.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Fraction of coefficients that are exactly zero.
    pub fn compression_ratio(&self) -> Result<f64> {
        let values = self.values()?;
        let zeros = values.iter().filter(|v| **v == 0.0).count();
        Ok(safe_div(zeros as f64, values.len() as f64))
    }

    /// Number of nonzero coefficients.
    pub fn active_parameter_count(&self) -> Result<usize> {
        Ok(self.values()?.iter().filter(|v| **v != 0.0).count())
    }

    pub fn total_parameter_count(&self) -> usize {
        self.index.len()
    }

    /// Fitted terms as serializable rows.
    pub fn records(&self) -> Result<Vec<TermRecord>> {
        let values = self.values()?;
        Ok(self
            .index
            .terms()
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (term, &value))| TermRecord {
                label: term.to_string(),
                order: term.order(),
                value,
                stdev: self.stdeviations.as_ref().map(|s| s[i]),
            })
            .collect())
    }

    fn check_len(&self, got: usize) -> Result<()> {
        if got != self.index.len() {
            return Err(EpistasisError::ShapeMismatch {
                expected: self.index.len(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> EpistasisMap {
        EpistasisMap::new(InteractionIndex::with_intercept(2, 3).unwrap())
    }

    #[test]
    fn test_values_unreadable_before_fit() {
        let m = map();
        assert_eq!(m.values(), Err(EpistasisError::NotFitted));
        assert!(m.records().is_err());
        assert!(m.compression_ratio().is_err());
        assert_eq!(m.total_parameter_count(), 7);
    }

    #[test]
    fn test_set_values_checks_length() {
        let mut m = map();
        assert_eq!(
            m.set_values(vec![1.0; 6]),
            Err(EpistasisError::ShapeMismatch {
                expected: 7,
                got: 6
            })
        );
        assert!(!m.is_fitted());
        m.set_values(vec![1.0; 7]).unwrap();
        assert!(m.is_fitted());
    }

    #[test]
    fn test_sparsity_statistics() {
        let mut m = map();
        m.set_values(vec![2.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0]).unwrap();
        assert_eq!(m.active_parameter_count().unwrap(), 3);
        assert!((m.compression_ratio().unwrap() - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_order() {
        let mut m = map();
        let unfitted = m.get_order(2);
        assert_eq!(unfitted.labels, vec![vec![1, 2], vec![1, 3], vec![2, 3]]);
        assert!(unfitted.values.is_none());

        m.set_values((0..7).map(f64::from).collect()).unwrap();
        let second = m.get_order(2);
        assert_eq!(second.values, Some(vec![4.0, 5.0, 6.0]));
        assert_eq!(m.get_order(0).values, Some(vec![0.0]));
        assert!(m.get_order(3).labels.is_empty());
    }

    #[test]
    fn test_records() {
        let mut m = map();
        m.set_values((0..7).map(f64::from).collect()).unwrap();
        let records = m.records().unwrap();
        assert_eq!(records[0].label, "0");
        assert_eq!(records[0].order, 0);
        assert_eq!(records[6].label, "2,3");
        assert_eq!(records[6].value, 6.0);
        assert!(records[6].stdev.is_none());
    }
}
