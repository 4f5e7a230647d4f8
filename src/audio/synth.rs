//! File-based synthesizer
//!
//! Renders a genome by mixing the base sounds with the genome's weights
//! and writing the result to `<dir>/parent.wav` or `<dir>/offspring.wav`.
//! Each generation overwrites the previous pair.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::mixer::Mixer;
use super::wav::{write_wav, SampleDepth};
use crate::config::AudioConfig;
use crate::error::{AudioError, SynthesisError};
use crate::genome::sound_genome::SoundGenome;
use crate::interactive::evaluator::{AudioArtifactHandle, CandidateRole, RenderSlot};
use crate::interactive::traits::SynthesisAdapter;

const ROLES: [CandidateRole; 2] = [CandidateRole::Parent, CandidateRole::Offspring];

/// Synthesizer writing mixed WAV files for the listener
#[derive(Debug)]
pub struct WavSynthesizer {
    mixer: Mixer,
    output_dir: PathBuf,
    depth: SampleDepth,
}

impl WavSynthesizer {
    /// Create a synthesizer writing into `output_dir`
    ///
    /// The directory is created if needed, and renders left over from an
    /// earlier run are removed.
    pub fn new(
        mixer: Mixer,
        output_dir: impl Into<PathBuf>,
        depth: SampleDepth,
    ) -> Result<Self, AudioError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        let synth = Self {
            mixer,
            output_dir,
            depth,
        };
        for role in ROLES {
            let stale = synth.path_for(role);
            if stale.exists() {
                debug!("Removing stale render {}", stale.display());
                fs::remove_file(&stale)?;
            }
        }
        Ok(synth)
    }

    /// Load the configured base sounds and prepare the evaluation directory
    pub fn from_config(config: &AudioConfig) -> Result<Self, AudioError> {
        let mixer = Mixer::from_files(&config.sounds)?;
        info!(
            "Loaded {} base sounds, writing renders to {}",
            mixer.len(),
            config.evaluation_dir.display()
        );
        Self::new(mixer, &config.evaluation_dir, config.sample_depth)
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File a role is rendered to
    pub fn path_for(&self, role: CandidateRole) -> PathBuf {
        self.output_dir.join(format!("{}.wav", role.as_str()))
    }
}

impl SynthesisAdapter for WavSynthesizer {
    fn render(
        &mut self,
        genome: &SoundGenome,
        slot: RenderSlot,
    ) -> Result<AudioArtifactHandle, SynthesisError> {
        if genome.dimension() != self.mixer.len() {
            return Err(SynthesisError::DimensionMismatch {
                expected: self.mixer.len(),
                actual: genome.dimension(),
            });
        }

        let wave = self.mixer.mix(genome.genes())?;
        let path = self.path_for(slot.role);
        write_wav(&path, &wave, self.depth)?;
        debug!(
            "Rendered {} for generation {} to {}",
            slot.role,
            slot.generation,
            path.display()
        );
        Ok(AudioArtifactHandle::from(path))
    }
}
