//! Genome codec
//!
//! The codec fixes the shape of a run's genomes: how many parameters there
//! are, the declared range of each one, and the genome evolution starts
//! from. Every genome that leaves a variation operator passes through
//! [`GenomeCodec::clamp_to_bounds`].

use crate::error::GenomeError;
use crate::genome::bounds::{Bounds, MultiBounds};
use crate::genome::sound_genome::SoundGenome;

/// Parameter layout, bounds and initial genome for a run
#[derive(Clone, Debug, PartialEq)]
pub struct GenomeCodec {
    bounds: MultiBounds,
    default_genes: Vec<f64>,
}

impl GenomeCodec {
    /// Create a codec from per-parameter bounds
    ///
    /// The initial genome sits at the center of every range.
    pub fn new(bounds: MultiBounds) -> Result<Self, GenomeError> {
        bounds.validate()?;
        let default_genes = bounds.iter().map(Bounds::center).collect();
        Ok(Self {
            bounds,
            default_genes,
        })
    }

    /// Codec for mix weights over `base_sounds` sounds, each weight in `range`
    ///
    /// The initial genome is an even mix, `1 / base_sounds` per sound,
    /// clamped into `range`.
    pub fn mix_weights(base_sounds: usize, range: Bounds) -> Result<Self, GenomeError> {
        let bounds = MultiBounds::uniform(range, base_sounds);
        bounds.validate()?;
        let even = 1.0 / base_sounds as f64;
        let default_genes = vec![range.clamp(even); base_sounds];
        Ok(Self {
            bounds,
            default_genes,
        })
    }

    /// Replace the initial genome
    pub fn with_default(mut self, genome: SoundGenome) -> Result<Self, GenomeError> {
        self.validate(&genome)?;
        self.default_genes = genome.into_inner();
        Ok(self)
    }

    /// Number of parameters per genome
    pub fn dimension(&self) -> usize {
        self.bounds.dimension()
    }

    /// Declared per-parameter bounds
    pub fn bounds(&self) -> &MultiBounds {
        &self.bounds
    }

    /// The genome a run starts from
    pub fn make_default(&self) -> SoundGenome {
        SoundGenome::new(self.default_genes.clone())
    }

    /// Starting lineages for a run of `size` lineages
    ///
    /// One lineage starts from the default genome. Larger populations
    /// start from corners of the parameter box: lineage `i` puts parameter
    /// `i % dimension` at its maximum and the rest at their minimum, so a
    /// mix-weight population begins with each base sound on its own.
    pub fn make_population(&self, size: usize) -> Vec<SoundGenome> {
        if size <= 1 {
            return vec![self.make_default(); size];
        }
        let dimension = self.dimension();
        (0..size)
            .map(|i| {
                SoundGenome::collect_from(self.bounds.iter().enumerate().map(|(j, b)| {
                    if j == i % dimension {
                        b.max
                    } else {
                        b.min
                    }
                }))
            })
            .collect()
    }

    /// Clip every parameter into its declared range
    pub fn clamp_to_bounds(&self, genome: &SoundGenome) -> SoundGenome {
        SoundGenome::new(self.bounds.clamp_values(genome.genes()))
    }

    /// Check dimension and containment
    pub fn validate(&self, genome: &SoundGenome) -> Result<(), GenomeError> {
        if genome.dimension() != self.dimension() {
            return Err(GenomeError::DimensionMismatch {
                expected: self.dimension(),
                actual: genome.dimension(),
            });
        }
        for (i, (&value, bound)) in genome.genes().iter().zip(self.bounds.iter()).enumerate() {
            if !bound.contains(value) {
                return Err(GenomeError::ConstraintViolation(format!(
                    "parameter {} = {} outside [{}, {}]",
                    i, value, bound.min, bound.max
                )));
            }
        }
        Ok(())
    }
}
