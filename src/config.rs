//! Run configuration
//!
//! A [`RunConfig`] is fixed for the lifetime of a run. It can be built in
//! code, parsed from TOML, and is validated before the engine starts.
//!
//! ```toml
//! base_sounds = 5
//! generations = 8
//! step_size = 0.1
//! seed = 42
//! perturbation = "gaussian"
//! population_size = 1
//!
//! [parameter_range]
//! min = 0.0
//! max = 1.0
//!
//! [audio]
//! sounds = ["sounds/a.wav", "sounds/b.wav"]
//! evaluation_dir = "data/evaluation"
//! result_dir = "data/result"
//! sample_depth = "int16"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::wav::SampleDepth;
use crate::error::{EvoResult, EvolutionError};
use crate::genome::bounds::Bounds;
use crate::genome::codec::GenomeCodec;
use crate::operators::differential::{
    DifferentialInterpolation, DEFAULT_SCALE_FACTOR, MIN_POPULATION,
};
use crate::operators::mutation::{Perturbation, PerturbationKind};

/// Default number of base sounds mixed per genome
pub const DEFAULT_BASE_SOUNDS: usize = 5;
/// Default number of generations
pub const DEFAULT_GENERATIONS: usize = 5;
/// Default mutation step, as a fraction of each parameter's range
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

fn default_base_sounds() -> usize {
    DEFAULT_BASE_SOUNDS
}

fn default_generations() -> usize {
    DEFAULT_GENERATIONS
}

fn default_step_size() -> f64 {
    DEFAULT_STEP_SIZE
}

fn default_population_size() -> usize {
    1
}

fn default_scale_factor() -> f64 {
    DEFAULT_SCALE_FACTOR
}

/// Configuration of one evolution run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Number of base sounds, and so genome dimension
    #[serde(default = "default_base_sounds")]
    pub base_sounds: usize,
    /// Generations to run before stopping
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Mutation step, relative to each parameter's range
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    /// Seed for the random source; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Range every mix weight is constrained to
    #[serde(default)]
    pub parameter_range: Bounds,
    /// How offspring are drawn
    #[serde(default)]
    pub perturbation: PerturbationKind,
    /// Lineages evolved side by side, each compared on its own
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Donor difference weight for differential variation
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// File locations for the WAV synthesizer and result store
    #[serde(default)]
    pub audio: AudioConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_sounds: DEFAULT_BASE_SOUNDS,
            generations: DEFAULT_GENERATIONS,
            step_size: DEFAULT_STEP_SIZE,
            seed: None,
            parameter_range: Bounds::unit(),
            perturbation: PerturbationKind::default(),
            population_size: default_population_size(),
            scale_factor: DEFAULT_SCALE_FACTOR,
            audio: AudioConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> EvoResult<Self> {
        toml::from_str(text)
            .map_err(|e| EvolutionError::Configuration(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> EvoResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EvolutionError::Configuration(format!("Read {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the number of generations
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the mutation step size
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the number of base sounds
    pub fn with_base_sounds(mut self, base_sounds: usize) -> Self {
        self.base_sounds = base_sounds;
        self
    }

    /// Evolve `population_size` lineages with differential variation
    pub fn with_differential(mut self, population_size: usize, scale_factor: f64) -> Self {
        self.perturbation = PerturbationKind::Differential;
        self.population_size = population_size;
        self.scale_factor = scale_factor;
        self
    }

    /// Mix-weight codec for the configured sounds and range
    pub fn codec(&self) -> EvoResult<GenomeCodec> {
        GenomeCodec::mix_weights(self.base_sounds, self.parameter_range)
            .map_err(|e| EvolutionError::Configuration(e.to_string()))
    }

    /// Variation operator for the configured kind
    pub fn variation(&self) -> Perturbation {
        match self.perturbation {
            PerturbationKind::Differential => Perturbation::Differential(DifferentialInterpolation {
                scale_factor: self.scale_factor,
            }),
            kind => Perturbation::from_kind(kind),
        }
    }

    /// Reject configurations no run can start from
    pub fn validate(&self) -> EvoResult<()> {
        if self.base_sounds == 0 {
            return Err(EvolutionError::Configuration(
                "base_sounds must be at least 1".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(EvolutionError::Configuration(
                "generations must be at least 1".to_string(),
            ));
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(EvolutionError::Configuration(format!(
                "step_size must be a positive finite number, got {}",
                self.step_size
            )));
        }
        Bounds::try_new(self.parameter_range.min, self.parameter_range.max)
            .map_err(|e| EvolutionError::Configuration(format!("parameter_range: {}", e)))?;
        if self.population_size == 0 {
            return Err(EvolutionError::Configuration(
                "population_size must be at least 1".to_string(),
            ));
        }
        if self.perturbation == PerturbationKind::Differential {
            if self.population_size < MIN_POPULATION {
                return Err(EvolutionError::Configuration(format!(
                    "differential variation needs population_size >= {}, got {}",
                    MIN_POPULATION, self.population_size
                )));
            }
            if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
                return Err(EvolutionError::Configuration(format!(
                    "scale_factor must be a positive finite number, got {}",
                    self.scale_factor
                )));
            }
        }
        if !self.audio.sounds.is_empty() && self.audio.sounds.len() != self.base_sounds {
            return Err(EvolutionError::Configuration(format!(
                "{} sound files given for {} base sounds",
                self.audio.sounds.len(),
                self.base_sounds
            )));
        }
        Ok(())
    }
}

/// File locations used by the WAV synthesizer and result store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Base sound files, one per genome parameter
    pub sounds: Vec<PathBuf>,
    /// Where parent and offspring renders are written
    pub evaluation_dir: PathBuf,
    /// Where the final mix and trajectory are written
    pub result_dir: PathBuf,
    /// PCM depth of written files
    pub sample_depth: SampleDepth,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sounds: Vec::new(),
            evaluation_dir: PathBuf::from("data/evaluation"),
            result_dir: PathBuf::from("data/result"),
            sample_depth: SampleDepth::default(),
        }
    }
}
