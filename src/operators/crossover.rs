//! Crossover operators
//!
//! Two-parent recombination for synthesis genomes. The engine varies each
//! lineage on its own and does not call these; population-based variation
//! lives in [`differential`](super::differential).

use rand::Rng;

use crate::error::{OperatorError, OperatorResult, RepairInfo};
use crate::genome::codec::GenomeCodec;
use crate::genome::sound_genome::SoundGenome;
use crate::operators::traits::RecombinationOperator;

/// Reject genomes whose length differs from the codec's
pub(crate) fn check_dimensions<'a, I>(genomes: I, codec: &GenomeCodec) -> Result<(), OperatorError>
where
    I: IntoIterator<Item = &'a SoundGenome>,
{
    let expected = codec.dimension();
    for genome in genomes {
        if genome.dimension() != expected {
            return Err(OperatorError::RecombinationFailed(format!(
                "parent has {} parameters, expected {}",
                genome.dimension(),
                expected
            )));
        }
    }
    Ok(())
}

/// Clamp a freshly combined child, recording any out-of-range genes
pub(crate) fn finish(genes: Vec<f64>, codec: &GenomeCodec) -> OperatorResult<SoundGenome> {
    if codec.bounds().contains_vec(&genes) {
        return OperatorResult::Success(SoundGenome::new(genes));
    }

    let violations: Vec<String> = genes
        .iter()
        .zip(codec.bounds().iter())
        .enumerate()
        .filter(|(_, (g, b))| !b.contains(**g))
        .map(|(i, (g, b))| format!("parameter {} = {} outside [{}, {}]", i, g, b.min, b.max))
        .collect();

    OperatorResult::Repaired(
        codec.clamp_to_bounds(&SoundGenome::new(genes)),
        RepairInfo {
            constraint_violations: violations,
            repair_method: "clamp",
        },
    )
}

/// Blend (weighted average) crossover
///
/// `child[i] = w * parent1[i] + (1 - w) * parent2[i]`. With no fixed
/// weight, `w` is drawn uniformly from [0, 1] once per child.
#[derive(Clone, Debug, Default)]
pub struct BlendCrossover {
    /// Fixed weight of the first parent
    pub weight: Option<f64>,
}

impl BlendCrossover {
    /// Blend with a random weight per child
    pub fn new() -> Self {
        Self { weight: None }
    }

    /// Blend with a fixed weight for the first parent
    pub fn with_weight(weight: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&weight),
            "Blend weight must be in [0, 1]"
        );
        Self {
            weight: Some(weight),
        }
    }
}

impl RecombinationOperator for BlendCrossover {
    fn recombine<R: Rng>(
        &self,
        parent1: &SoundGenome,
        parent2: &SoundGenome,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> OperatorResult<SoundGenome> {
        if let Err(e) = check_dimensions([parent1, parent2], codec) {
            return OperatorResult::Failed(e);
        }

        let w = self.weight.unwrap_or_else(|| rng.gen::<f64>());
        let genes = parent1
            .genes()
            .iter()
            .zip(parent2.genes())
            .map(|(a, b)| w * a + (1.0 - w) * b)
            .collect();
        finish(genes, codec)
    }
}

/// Uniform crossover
///
/// Each parameter is copied from `parent1` with probability `bias`,
/// otherwise from `parent2`.
#[derive(Clone, Debug)]
pub struct UniformCrossover {
    /// Probability of taking a gene from the first parent
    pub bias: f64,
}

impl UniformCrossover {
    /// Unbiased uniform crossover
    pub fn new() -> Self {
        Self { bias: 0.5 }
    }

    /// Uniform crossover favouring the first parent with probability `bias`
    pub fn with_bias(bias: f64) -> Self {
        assert!((0.0..=1.0).contains(&bias), "Bias must be in [0, 1]");
        Self { bias }
    }
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self::new()
    }
}

impl RecombinationOperator for UniformCrossover {
    fn recombine<R: Rng>(
        &self,
        parent1: &SoundGenome,
        parent2: &SoundGenome,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> OperatorResult<SoundGenome> {
        if let Err(e) = check_dimensions([parent1, parent2], codec) {
            return OperatorResult::Failed(e);
        }

        let genes = parent1
            .genes()
            .iter()
            .zip(parent2.genes())
            .map(|(&a, &b)| if rng.gen::<f64>() < self.bias { a } else { b })
            .collect();
        finish(genes, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::bounds::Bounds;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn codec(n: usize) -> GenomeCodec {
        GenomeCodec::mix_weights(n, Bounds::unit()).unwrap()
    }

    #[test]
    fn test_blend_fixed_weight() {
        let codec = codec(3);
        let mut rng = StdRng::seed_from_u64(0);
        let a = SoundGenome::from([1.0, 0.0, 0.5]);
        let b = SoundGenome::from([0.0, 1.0, 0.5]);

        let child = BlendCrossover::with_weight(0.25)
            .recombine(&a, &b, &codec, &mut rng)
            .genome()
            .unwrap();
        assert_relative_eq!(child[0], 0.25);
        assert_relative_eq!(child[1], 0.75);
        assert_relative_eq!(child[2], 0.5);
    }

    #[test]
    fn test_blend_random_weight_between_parents() {
        let codec = codec(2);
        let mut rng = StdRng::seed_from_u64(17);
        let a = SoundGenome::from([0.2, 0.9]);
        let b = SoundGenome::from([0.6, 0.1]);

        for _ in 0..50 {
            let child = BlendCrossover::new()
                .recombine(&a, &b, &codec, &mut rng)
                .genome()
                .unwrap();
            assert!(child[0] >= 0.2 - 1e-12 && child[0] <= 0.6 + 1e-12);
            assert!(child[1] >= 0.1 - 1e-12 && child[1] <= 0.9 + 1e-12);
        }
    }

    #[test]
    fn test_uniform_crossover_takes_genes_from_parents() {
        let codec = codec(6);
        let mut rng = StdRng::seed_from_u64(23);
        let a = SoundGenome::filled(6, 0.0);
        let b = SoundGenome::filled(6, 1.0);

        let child = UniformCrossover::new()
            .recombine(&a, &b, &codec, &mut rng)
            .genome()
            .unwrap();
        assert!(child.genes().iter().all(|&g| g == 0.0 || g == 1.0));
    }

    #[test]
    fn test_uniform_crossover_full_bias_copies_first_parent() {
        let codec = codec(4);
        let mut rng = StdRng::seed_from_u64(2);
        let a = SoundGenome::from([0.1, 0.2, 0.3, 0.4]);
        let b = SoundGenome::filled(4, 0.9);

        let child = UniformCrossover::with_bias(1.0)
            .recombine(&a, &b, &codec, &mut rng)
            .genome()
            .unwrap();
        assert_eq!(child, a);
    }

    #[test]
    fn test_recombine_dimension_mismatch_fails() {
        let codec = codec(3);
        let mut rng = StdRng::seed_from_u64(0);
        let a = SoundGenome::filled(3, 0.5);
        let b = SoundGenome::filled(2, 0.5);

        let result = BlendCrossover::new().recombine(&a, &b, &codec, &mut rng);
        assert!(!result.is_ok());
        assert!(matches!(
            result.into_result(),
            Err(OperatorError::RecombinationFailed(_))
        ));
    }

    #[test]
    fn test_in_bounds_parents_need_no_repair() {
        let codec = codec(2);
        let mut rng = StdRng::seed_from_u64(0);
        let a = SoundGenome::from([1.0, 0.0]);
        let b = SoundGenome::from([0.0, 1.0]);

        let result = BlendCrossover::with_weight(0.5).recombine(&a, &b, &codec, &mut rng);
        assert!(matches!(result, OperatorResult::Success(_)));
    }

    #[test]
    fn test_out_of_bounds_parents_are_repaired() {
        let codec = codec(2);
        let mut rng = StdRng::seed_from_u64(0);
        let a = SoundGenome::from([1.5, 0.5]);
        let b = SoundGenome::from([1.5, 0.5]);

        let result = BlendCrossover::with_weight(0.5).recombine(&a, &b, &codec, &mut rng);
        assert!(result.was_repaired());
        if let OperatorResult::Repaired(child, info) = result {
            assert_eq!(child.genes(), &[1.0, 0.5]);
            assert_eq!(info.repair_method, "clamp");
            assert_eq!(info.constraint_violations.len(), 1);
        }
    }
}
