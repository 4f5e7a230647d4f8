//! Differential interpolation
//!
//! Population-based variation. A mutant is built from three other
//! lineages and the offspring is drawn from the box spanned by the parent
//! and the mutant, so it never strays further than the mutant does.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::OperatorResult;
use crate::genome::codec::GenomeCodec;
use crate::genome::sound_genome::SoundGenome;
use crate::operators::crossover::{check_dimensions, finish};
use crate::operators::traits::VariationOperator;

/// Scale factor `F` used when none is configured
pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;

/// Smallest population that leaves three donors besides the parent
pub const MIN_POPULATION: usize = 4;

/// Interactive differential interpolation
///
/// For a parent `x` and donors `a`, `b`, `c` the mutant is
/// `v = c + F * (a - b)`. With `lo` and `hi` the index-wise minimum and
/// maximum of `x` and `v`, the offspring is `lo + u * (hi - lo)` for a
/// single `u ~ U(0, 1)` per offspring, clamped through the codec.
#[derive(Clone, Debug, PartialEq)]
pub struct DifferentialInterpolation {
    /// Weight of the donor difference
    pub scale_factor: f64,
}

impl DifferentialInterpolation {
    pub fn new() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
        }
    }

    /// # Panics
    /// Panics if `scale_factor` is not a positive finite number
    pub fn with_scale_factor(scale_factor: f64) -> Self {
        assert!(
            scale_factor.is_finite() && scale_factor > 0.0,
            "Scale factor must be positive and finite"
        );
        Self { scale_factor }
    }

    /// Offspring of `parent` given donors `[a, b, c]`
    pub fn interpolate<R: Rng>(
        &self,
        parent: &SoundGenome,
        donors: [&SoundGenome; 3],
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> OperatorResult<SoundGenome> {
        if let Err(e) = check_dimensions(std::iter::once(parent).chain(donors), codec) {
            return OperatorResult::Failed(e);
        }

        let [a, b, c] = donors;
        let u: f64 = rng.gen();
        let genes = parent
            .genes()
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let v = c[i] + self.scale_factor * (a[i] - b[i]);
                let (lo, hi) = if x <= v { (x, v) } else { (v, x) };
                lo + u * (hi - lo)
            })
            .collect();
        finish(genes, codec)
    }

    /// Three distinct lineages other than `index`, `None` if there are too few
    fn pick_donors<R: Rng>(population: usize, index: usize, rng: &mut R) -> Option<[usize; 3]> {
        if population < MIN_POPULATION {
            return None;
        }
        let others: Vec<usize> = (0..population).filter(|&j| j != index).collect();
        let picked: Vec<usize> = others.choose_multiple(rng, 3).copied().collect();
        match picked[..] {
            [a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }
}

impl Default for DifferentialInterpolation {
    fn default() -> Self {
        Self::new()
    }
}

impl VariationOperator for DifferentialInterpolation {
    /// A lone parent has no donor difference, so it comes back clamped
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        _step_size: f64,
        codec: &GenomeCodec,
        _rng: &mut R,
    ) -> SoundGenome {
        codec.clamp_to_bounds(parent)
    }

    fn vary_member<R: Rng>(
        &self,
        population: &[SoundGenome],
        index: usize,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        let parent = &population[index];
        let Some([a, b, c]) = Self::pick_donors(population.len(), index, rng) else {
            return self.vary(parent, step_size, codec, rng);
        };

        self.interpolate(
            parent,
            [&population[a], &population[b], &population[c]],
            codec,
            rng,
        )
        .genome()
        .unwrap_or_else(|| codec.clamp_to_bounds(parent))
    }
}
