//! Synthesis parameter genome
//!
//! A fixed-length vector of real-valued synthesis parameters describing one
//! candidate sound. Genomes are immutable: variation always produces a new
//! genome, so every generation record keeps an intact lineage.

use serde::{Deserialize, Serialize};

/// Fixed-length real-valued parameter vector for one candidate sound
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundGenome {
    genes: Vec<f64>,
}

impl SoundGenome {
    /// Create a genome from its parameter values
    pub fn new(genes: Vec<f64>) -> Self {
        Self { genes }
    }

    /// Create a genome with every parameter set to `value`
    pub fn filled(dimension: usize, value: f64) -> Self {
        Self {
            genes: vec![value; dimension],
        }
    }

    /// Create from an iterator
    pub fn collect_from<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            genes: iter.into_iter().collect(),
        }
    }

    /// Parameter values
    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    /// Number of parameters
    pub fn dimension(&self) -> usize {
        self.genes.len()
    }

    /// Get the underlying vector
    pub fn into_inner(self) -> Vec<f64> {
        self.genes
    }

    /// Euclidean distance to another genome
    pub fn distance(&self, other: &Self) -> f64 {
        self.genes
            .iter()
            .zip(other.genes.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl std::ops::Index<usize> for SoundGenome {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.genes[index]
    }
}

impl From<Vec<f64>> for SoundGenome {
    fn from(genes: Vec<f64>) -> Self {
        Self { genes }
    }
}

impl<const N: usize> From<[f64; N]> for SoundGenome {
    fn from(arr: [f64; N]) -> Self {
        Self {
            genes: arr.to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a SoundGenome {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}
