//! Interaction terms and their canonical ordering.
//!
//! A term is a set of binary positions (1-based) whose joint mutation
//! carries one epistatic coefficient. Terms are listed intercept first,
//! then by increasing order, then lexicographically, so a label always
//! lands at the same column of the model matrix.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{EpistasisError, Result};

/// One epistatic coefficient: the binary positions that interact.
///
/// The empty term is the intercept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InteractionTerm {
    sites: Vec<usize>,
}

impl InteractionTerm {
    pub fn new(sites: Vec<usize>) -> Self {
        Self { sites }
    }

    pub fn intercept() -> Self {
        Self { sites: Vec::new() }
    }

    /// 1-based binary positions in this term.
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    pub fn order(&self) -> usize {
        self.sites.len()
    }

    pub fn is_intercept(&self) -> bool {
        self.sites.is_empty()
    }
}

impl fmt::Display for InteractionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sites.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self.sites.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Ordered, immutable list of interaction terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionIndex {
    order: usize,
    terms: Vec<InteractionTerm>,
    positions: HashMap<InteractionTerm, usize>,
    /// Number of binary positions a genotype must encode to.
    n_positions: usize,
    fingerprint: u64,
}

impl InteractionIndex {
    /// Terms of size `1..=order` over `n_sites` biallelic sites, no intercept.
    pub fn build(order: usize, n_sites: usize) -> Result<Self> {
        Self::for_alphabet(order, &vec![1; n_sites], false)
    }

    /// Same as [`build`](Self::build) with the intercept term first.
    pub fn with_intercept(order: usize, n_sites: usize) -> Result<Self> {
        Self::for_alphabet(order, &vec![1; n_sites], true)
    }

    /// Terms over sites with `mutations_per_site[s]` binary positions each.
    ///
    /// A term never combines two positions of the same site, since a site
    /// carries a single letter at a time.
    pub fn for_alphabet(
        order: usize,
        mutations_per_site: &[usize],
        intercept: bool,
    ) -> Result<Self> {
        let n_sites = mutations_per_site.len();
        if order < 1 {
            return Err(EpistasisError::Configuration(format!(
                "order must be at least 1, got {}",
                order
            )));
        }
        if order > n_sites {
            return Err(EpistasisError::Configuration(format!(
                "order {} exceeds the number of sites ({})",
                order, n_sites
            )));
        }

        // site_of[p] = site of 0-based binary position p
        let site_of: Vec<usize> = mutations_per_site
            .iter()
            .enumerate()
            .flat_map(|(site, &k)| std::iter::repeat(site).take(k))
            .collect();
        let n_positions = site_of.len();

        let mut terms = Vec::new();
        if intercept {
            terms.push(InteractionTerm::intercept());
        }
        for k in 1..=order {
            let mut current = Vec::with_capacity(k);
            push_combinations(&site_of, k, 0, &mut current, &mut terms);
        }

        Ok(Self::from_terms(order, n_positions, terms))
    }

    /// The same terms with the intercept removed.
    pub fn without_intercept(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .filter(|t| !t.is_intercept())
            .cloned()
            .collect();
        Self::from_terms(self.order, self.n_positions, terms)
    }

    fn from_terms(order: usize, n_positions: usize, terms: Vec<InteractionTerm>) -> Self {
        let positions = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut hasher = DefaultHasher::new();
        order.hash(&mut hasher);
        n_positions.hash(&mut hasher);
        terms.hash(&mut hasher);
        let fingerprint = hasher.finish();

        Self {
            order,
            terms,
            positions,
            n_positions,
            fingerprint,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_intercept(&self) -> bool {
        self.terms.first().is_some_and(InteractionTerm::is_intercept)
    }

    /// Expected length of binary genotypes.
    pub fn n_positions(&self) -> usize {
        self.n_positions
    }

    pub fn terms(&self) -> &[InteractionTerm] {
        &self.terms
    }

    /// Site tuples of every term, in column order.
    pub fn labels(&self) -> Vec<Vec<usize>> {
        self.terms.iter().map(|t| t.sites.clone()).collect()
    }

    /// Column of `term`, if it belongs to this index.
    pub fn position(&self, term: &InteractionTerm) -> Option<usize> {
        self.positions.get(term).copied()
    }

    /// Columns holding terms of exactly `order` sites.
    pub fn positions_of_order(&self, order: usize) -> Vec<usize> {
        self.terms
            .iter()
            .enumerate()
            .filter_map(|(i, t)| (t.order() == order).then_some(i))
            .collect()
    }

    /// Stable hash of the term list, used to key cached model matrices.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Append every increasing k-combination of positions starting at `start`
/// that touches each site at most once.
fn push_combinations(
    site_of: &[usize],
    k: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<InteractionTerm>,
) {
    if current.len() == k {
        out.push(InteractionTerm::new(current.iter().map(|p| p + 1).collect()));
        return;
    }
    let remaining = k - current.len();
    for p in start..site_of.len() {
        if site_of.len() - p < remaining {
            break;
        }
        if current.iter().any(|&q| site_of[q] == site_of[p]) {
            continue;
        }
        current.push(p);
        push_combinations(site_of, k, p + 1, current, out);
        current.pop();
    }
}
