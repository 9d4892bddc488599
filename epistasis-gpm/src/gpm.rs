//! The genotype-phenotype map.
//!
//! Holds the observed genotypes with their phenotypes and optional
//! measurement uncertainty, the per-site alphabets, the binary encoding
//! of every observed genotype, and enumerates the complete genotype space
//! on demand.

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::encoding::BinaryEncoding;

/// Per-genotype measurement uncertainty (standard deviations).
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertainty {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl Uncertainty {
    /// Symmetric uncertainty from per-genotype standard deviations.
    pub fn symmetric(stdeviations: Vec<f64>) -> Self {
        Self {
            lower: stdeviations.clone(),
            upper: stdeviations,
        }
    }
}

/// Observed genotype-phenotype data over a fixed wildtype.
#[derive(Debug, Clone)]
pub struct GenotypePhenotypeMap {
    wildtype: String,
    genotypes: Vec<String>,
    phenotypes: Vec<f64>,
    uncertainty: Option<Uncertainty>,
    encoding: BinaryEncoding,
    binary: Vec<String>,
    index: HashMap<String, usize>,
}

impl GenotypePhenotypeMap {
    /// Build a map, inferring each site's alphabet from the observed
    /// letters (wildtype letter first, the rest in sorted order).
    pub fn new(wildtype: &str, genotypes: Vec<String>, phenotypes: Vec<f64>) -> Result<Self> {
        let wt: Vec<char> = wildtype.chars().collect();
        let mut mutations: Vec<Vec<char>> = wt.iter().map(|&c| vec![c]).collect();
        for g in &genotypes {
            for (site, c) in g.chars().enumerate() {
                if let Some(alphabet) = mutations.get_mut(site) {
                    if !alphabet.contains(&c) {
                        alphabet.push(c);
                    }
                }
            }
        }
        for alphabet in &mut mutations {
            alphabet[1..].sort_unstable();
        }
        Self::with_mutations(wildtype, genotypes, phenotypes, mutations)
    }

    /// Build a map with explicit per-site alphabets (wildtype letter first).
    pub fn with_mutations(
        wildtype: &str,
        genotypes: Vec<String>,
        phenotypes: Vec<f64>,
        mutations: Vec<Vec<char>>,
    ) -> Result<Self> {
        if genotypes.is_empty() {
            bail!("Genotype-phenotype map needs at least one genotype");
        }
        if genotypes.len() != phenotypes.len() {
            bail!(
                "Got {} genotypes but {} phenotypes",
                genotypes.len(),
                phenotypes.len()
            );
        }
        if let Some((g, _)) = genotypes
            .iter()
            .zip(phenotypes.iter())
            .find(|(_, p)| !p.is_finite())
        {
            bail!("Phenotype for genotype '{}' is not finite", g);
        }
        let n_sites = wildtype.chars().count();
        if mutations.len() != n_sites {
            bail!(
                "Alphabet covers {} sites but the wildtype '{}' has {}",
                mutations.len(),
                wildtype,
                n_sites
            );
        }
        for (site, (alphabet, wt)) in mutations.iter().zip(wildtype.chars()).enumerate() {
            if alphabet.first() != Some(&wt) {
                bail!(
                    "Alphabet of site {} must start with the wildtype letter '{}'",
                    site + 1,
                    wt
                );
            }
        }

        let encoding = BinaryEncoding::new(mutations)?;
        let binary = genotypes
            .iter()
            .map(|g| encoding.encode(g))
            .collect::<Result<Vec<_>>>()?;

        let mut index = HashMap::with_capacity(genotypes.len());
        for (i, g) in genotypes.iter().enumerate() {
            if index.insert(g.clone(), i).is_some() {
                bail!("Genotype '{}' appears more than once", g);
            }
        }

        Ok(Self {
            wildtype: wildtype.to_string(),
            genotypes,
            phenotypes,
            uncertainty: None,
            encoding,
            binary,
            index,
        })
    }

    /// Attach the same standard deviation to every genotype.
    pub fn with_stdeviations(self, stdev: f64) -> Result<Self> {
        let n = self.n();
        self.with_uncertainty(vec![stdev; n])
    }

    /// Attach per-genotype standard deviations.
    pub fn with_uncertainty(mut self, stdeviations: Vec<f64>) -> Result<Self> {
        if stdeviations.len() != self.n() {
            bail!(
                "Got {} standard deviations for {} genotypes",
                stdeviations.len(),
                self.n()
            );
        }
        if let Some(s) = stdeviations.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            bail!("Standard deviations must be positive and finite, got {}", s);
        }
        self.uncertainty = Some(Uncertainty::symmetric(stdeviations));
        Ok(self)
    }

    pub fn wildtype(&self) -> &str {
        &self.wildtype
    }

    /// Observed genotypes, in input order.
    pub fn genotypes(&self) -> &[String] {
        &self.genotypes
    }

    /// Phenotypes aligned to [`genotypes`](Self::genotypes).
    pub fn phenotypes(&self) -> &[f64] {
        &self.phenotypes
    }

    pub fn uncertainty(&self) -> Option<&Uncertainty> {
        self.uncertainty.as_ref()
    }

    /// Number of observed genotypes.
    pub fn n(&self) -> usize {
        self.genotypes.len()
    }

    pub fn n_sites(&self) -> usize {
        self.encoding.n_sites()
    }

    pub fn mutations(&self) -> &[Vec<char>] {
        self.encoding.mutations()
    }

    pub fn encoding(&self) -> &BinaryEncoding {
        &self.encoding
    }

    /// Binary encodings of the observed genotypes.
    pub fn binary_genotypes(&self) -> &[String] {
        &self.binary
    }

    /// Row of an observed genotype.
    pub fn index_of(&self, genotype: &str) -> Option<usize> {
        self.index.get(genotype).copied()
    }

    /// Phenotype of an observed genotype.
    pub fn phenotype_of(&self, genotype: &str) -> Option<f64> {
        self.index_of(genotype).map(|i| self.phenotypes[i])
    }

    /// Size of the complete genotype space.
    pub fn complete_size(&self) -> usize {
        self.mutations().iter().map(Vec::len).product()
    }

    /// Lazily enumerate the complete genotype space.
    pub fn iter_complete(&self) -> impl Iterator<Item = String> + '_ {
        let mutations = self.mutations();
        Odometer::new(mutations).map(move |counters| {
            counters
                .iter()
                .zip(mutations)
                .map(|(&i, alphabet)| alphabet[i])
                .collect()
        })
    }

    /// Every genotype over the per-site alphabets, first site varying slowest.
    pub fn complete_genotypes(&self) -> Vec<String> {
        self.iter_complete().collect()
    }

    /// Binary encodings of [`complete_genotypes`](Self::complete_genotypes).
    pub fn complete_binary_genotypes(&self) -> Vec<String> {
        Odometer::new(self.mutations())
            .map(|counters| self.encoding.encode_indices(&counters))
            .collect()
    }
}

/// Walks every combination of per-site letter indices, last site fastest.
struct Odometer {
    sizes: Vec<usize>,
    counters: Vec<usize>,
    done: bool,
}

impl Odometer {
    fn new(mutations: &[Vec<char>]) -> Self {
        Self {
            sizes: mutations.iter().map(Vec::len).collect(),
            counters: vec![0; mutations.len()],
            done: mutations.iter().any(Vec::is_empty),
        }
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.counters.clone();
        self.done = true;
        for site in (0..self.counters.len()).rev() {
            self.counters[site] += 1;
            if self.counters[site] < self.sizes[site] {
                self.done = false;
                break;
            }
            self.counters[site] = 0;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_site() -> GenotypePhenotypeMap {
        let genotypes = ["000", "001", "010", "100", "011", "101", "110", "111"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let phenotypes = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        GenotypePhenotypeMap::new("000", genotypes, phenotypes).unwrap()
    }

    #[test]
    fn test_alphabet_inferred_from_observed_letters() {
        let gpm = three_site();
        assert_eq!(gpm.mutations(), &[vec!['0', '1'], vec!['0', '1'], vec!['0', '1']]);
        assert_eq!(gpm.n_sites(), 3);
        assert_eq!(gpm.binary_genotypes()[4], "011");
        assert_eq!(gpm.phenotype_of("110"), Some(6.0));
        assert_eq!(gpm.phenotype_of("112"), None);
        assert_eq!(gpm.index_of("011"), Some(4));
        assert_eq!(gpm.index_of("112"), None);
    }

    #[test]
    fn test_complete_space_order() {
        let gpm = three_site();
        assert_eq!(gpm.complete_size(), 8);
        assert_eq!(
            gpm.complete_genotypes(),
            vec!["000", "001", "010", "011", "100", "101", "110", "111"]
        );
    }

    #[test]
    fn test_complete_space_covers_unobserved_genotypes() {
        let gpm = GenotypePhenotypeMap::with_mutations(
            "AT",
            vec!["AT".into(), "GT".into()],
            vec![1.0, 2.0],
            vec![vec!['A', 'C', 'G'], vec!['T', 'A']],
        )
        .unwrap();
        assert_eq!(gpm.complete_size(), 6);
        assert_eq!(
            gpm.complete_genotypes(),
            vec!["AT", "AA", "CT", "CA", "GT", "GA"]
        );
        assert_eq!(
            gpm.complete_binary_genotypes(),
            vec!["000", "001", "100", "101", "010", "011"]
        );
    }

    #[test]
    fn test_scalar_stdeviations_broadcast() {
        let gpm = three_site().with_stdeviations(0.01).unwrap();
        let unc = gpm.uncertainty().unwrap();
        assert_eq!(unc.upper.len(), 8);
        assert!(unc.upper.iter().all(|&s| s == 0.01));
        assert_eq!(unc.upper, unc.lower);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(GenotypePhenotypeMap::new("00", vec!["00".into()], vec![]).is_err());
        assert!(GenotypePhenotypeMap::new("00", vec!["000".into()], vec![1.0]).is_err());
        assert!(
            GenotypePhenotypeMap::new("00", vec!["00".into(), "00".into()], vec![1.0, 2.0])
                .is_err()
        );
        assert!(three_site().with_stdeviations(0.0).is_err());
        assert!(three_site().with_uncertainty(vec![0.1; 3]).is_err());
    }
}
