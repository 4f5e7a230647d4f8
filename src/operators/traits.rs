//! Operator traits
//!
//! This module defines the variation traits used by the evolution engine.

use rand::Rng;

use crate::error::OperatorResult;
use crate::genome::codec::GenomeCodec;
use crate::genome::sound_genome::SoundGenome;

/// Single-parent variation
///
/// Produces an offspring from one parent. Implementations must draw all
/// randomness from `rng` so that equal rng states give equal offspring,
/// and must return a genome clamped through `codec`.
pub trait VariationOperator: Send + Sync {
    /// Produce an offspring from `parent`
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome;

    /// Produce an offspring for `population[index]`
    ///
    /// Operators that draw donors from the other lineages override this.
    /// The default ignores the rest of the population.
    ///
    /// # Panics
    /// Panics if `index` is out of range for `population`.
    fn vary_member<R: Rng>(
        &self,
        population: &[SoundGenome],
        index: usize,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        self.vary(&population[index], step_size, codec, rng)
    }
}

/// Two-parent variation
///
/// Combines two genomes index-wise into one offspring.
pub trait RecombinationOperator: Send + Sync {
    /// Combine `parent1` and `parent2`
    fn recombine<R: Rng>(
        &self,
        parent1: &SoundGenome,
        parent2: &SoundGenome,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> OperatorResult<SoundGenome>;
}

impl<T: VariationOperator> VariationOperator for &T {
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        (**self).vary(parent, step_size, codec, rng)
    }

    fn vary_member<R: Rng>(
        &self,
        population: &[SoundGenome],
        index: usize,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        (**self).vary_member(population, index, step_size, codec, rng)
    }
}
