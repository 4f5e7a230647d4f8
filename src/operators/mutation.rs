//! Mutation operators
//!
//! Perturbation operators that vary every parameter of a parent by a random
//! delta proportional to `step_size` and the parameter's declared range.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::genome::codec::GenomeCodec;
use crate::genome::sound_genome::SoundGenome;
use crate::operators::differential::DifferentialInterpolation;
use crate::operators::traits::VariationOperator;

fn perturb<R, F>(
    parent: &SoundGenome,
    step_size: f64,
    codec: &GenomeCodec,
    rng: &mut R,
    mut draw: F,
) -> SoundGenome
where
    R: Rng,
    F: FnMut(&mut R) -> f64,
{
    if step_size.is_nan() || step_size <= 0.0 {
        return codec.clamp_to_bounds(parent);
    }

    let genes = parent
        .genes()
        .iter()
        .enumerate()
        .map(|(i, &gene)| {
            let range = codec.bounds().get(i).map_or(1.0, |b| b.range());
            gene + draw(rng) * step_size * range
        });
    codec.clamp_to_bounds(&SoundGenome::collect_from(genes))
}

/// Uniform perturbation
///
/// Adds `U(-1, 1) * step_size * range` to each parameter.
#[derive(Clone, Debug, Default)]
pub struct UniformPerturbation;

impl UniformPerturbation {
    /// Create a new uniform perturbation
    pub fn new() -> Self {
        Self
    }
}

impl VariationOperator for UniformPerturbation {
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        perturb(parent, step_size, codec, rng, |rng| rng.gen_range(-1.0..=1.0))
    }
}

/// Gaussian perturbation
///
/// Adds `N(0, (step_size * range)^2)` noise to each parameter.
#[derive(Clone, Debug, Default)]
pub struct GaussianPerturbation;

impl GaussianPerturbation {
    /// Create a new Gaussian perturbation
    pub fn new() -> Self {
        Self
    }
}

impl VariationOperator for GaussianPerturbation {
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        perturb(parent, step_size, codec, rng, |rng| {
            rng.sample::<f64, _>(StandardNormal)
        })
    }
}

/// How offspring are drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationKind {
    /// Bounded uniform deltas
    #[default]
    Uniform,
    /// Gaussian deltas
    Gaussian,
    /// Interpolation towards a mutant built from other lineages
    Differential,
}

/// Variation selected at run time from configuration
#[derive(Clone, Debug)]
pub enum Perturbation {
    Uniform(UniformPerturbation),
    Gaussian(GaussianPerturbation),
    Differential(DifferentialInterpolation),
}

impl Perturbation {
    /// Build the operator for a configured kind
    pub fn from_kind(kind: PerturbationKind) -> Self {
        match kind {
            PerturbationKind::Uniform => Self::Uniform(UniformPerturbation::new()),
            PerturbationKind::Gaussian => Self::Gaussian(GaussianPerturbation::new()),
            PerturbationKind::Differential => Self::Differential(DifferentialInterpolation::new()),
        }
    }

    /// The kind this operator was built from
    pub fn kind(&self) -> PerturbationKind {
        match self {
            Self::Uniform(_) => PerturbationKind::Uniform,
            Self::Gaussian(_) => PerturbationKind::Gaussian,
            Self::Differential(_) => PerturbationKind::Differential,
        }
    }
}

impl From<PerturbationKind> for Perturbation {
    fn from(kind: PerturbationKind) -> Self {
        Self::from_kind(kind)
    }
}

impl VariationOperator for Perturbation {
    fn vary<R: Rng>(
        &self,
        parent: &SoundGenome,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        match self {
            Self::Uniform(op) => op.vary(parent, step_size, codec, rng),
            Self::Gaussian(op) => op.vary(parent, step_size, codec, rng),
            Self::Differential(op) => op.vary(parent, step_size, codec, rng),
        }
    }

    fn vary_member<R: Rng>(
        &self,
        population: &[SoundGenome],
        index: usize,
        step_size: f64,
        codec: &GenomeCodec,
        rng: &mut R,
    ) -> SoundGenome {
        match self {
            Self::Uniform(op) => op.vary_member(population, index, step_size, codec, rng),
            Self::Gaussian(op) => op.vary_member(population, index, step_size, codec, rng),
            Self::Differential(op) => op.vary_member(population, index, step_size, codec, rng),
        }
    }
}
