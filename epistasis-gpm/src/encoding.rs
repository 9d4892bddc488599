//! Binary encoding of genotypes.
//!
//! Every site carries an alphabet whose first letter is the wildtype.
//! A site with `k` letters contributes `k - 1` binary positions; the
//! wildtype sets none of them and mutant `m` sets exactly position `m`.
//! Biallelic sites therefore map one letter to one bit.

use anyhow::{bail, Result};

/// Per-site alphabets and the binary positions they expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryEncoding {
    mutations: Vec<Vec<char>>,
    /// First binary position of each site.
    offsets: Vec<usize>,
    n_positions: usize,
}

impl BinaryEncoding {
    /// Build an encoding from per-site alphabets (wildtype letter first).
    pub fn new(mutations: Vec<Vec<char>>) -> Result<Self> {
        let mut offsets = Vec::with_capacity(mutations.len());
        let mut n_positions = 0;
        for (site, alphabet) in mutations.iter().enumerate() {
            if alphabet.is_empty() {
                bail!("Site {} has an empty alphabet", site + 1);
            }
            for (i, c) in alphabet.iter().enumerate() {
                if alphabet[..i].contains(c) {
                    bail!("Site {} lists letter '{}' twice", site + 1, c);
                }
            }
            offsets.push(n_positions);
            n_positions += alphabet.len() - 1;
        }
        Ok(Self {
            mutations,
            offsets,
            n_positions,
        })
    }

    /// Per-site alphabets, wildtype first.
    pub fn mutations(&self) -> &[Vec<char>] {
        &self.mutations
    }

    pub fn n_sites(&self) -> usize {
        self.mutations.len()
    }

    /// Length of an encoded genotype.
    pub fn n_positions(&self) -> usize {
        self.n_positions
    }

    /// Number of binary positions each site expands to.
    pub fn positions_per_site(&self) -> Vec<usize> {
        self.mutations.iter().map(|a| a.len() - 1).collect()
    }

    /// Site owning the zero-based binary position `pos`.
    pub fn site_of(&self, pos: usize) -> Option<usize> {
        if pos >= self.n_positions {
            return None;
        }
        // Last site with positions starting at or before `pos`.
        (0..self.n_sites())
            .rev()
            .find(|&s| self.offsets[s] <= pos && self.mutations[s].len() > 1)
    }

    /// Encode a genotype into its binary string.
    pub fn encode(&self, genotype: &str) -> Result<String> {
        let letters: Vec<char> = genotype.chars().collect();
        if letters.len() != self.n_sites() {
            bail!(
                "Genotype '{}' has {} sites, expected {}",
                genotype,
                letters.len(),
                self.n_sites()
            );
        }
        let mut bits = vec!['0'; self.n_positions];
        for (site, letter) in letters.iter().enumerate() {
            let alphabet = &self.mutations[site];
            let Some(idx) = alphabet.iter().position(|c| c == letter) else {
                bail!(
                    "Genotype '{}' has letter '{}' at site {} outside the alphabet {:?}",
                    genotype,
                    letter,
                    site + 1,
                    alphabet
                );
            };
            if idx > 0 {
                bits[self.offsets[site] + idx - 1] = '1';
            }
        }
        Ok(bits.into_iter().collect())
    }

    /// Encode a genotype given as per-site letter indices (0 = wildtype).
    pub fn encode_indices(&self, letters: &[usize]) -> String {
        assert_eq!(letters.len(), self.n_sites());
        let mut bits = vec!['0'; self.n_positions];
        for (site, &idx) in letters.iter().enumerate() {
            assert!(idx < self.mutations[site].len());
            if idx > 0 {
                bits[self.offsets[site] + idx - 1] = '1';
            }
        }
        bits.into_iter().collect()
    }
}
