//! Persistence of finished runs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::mixer::Mixer;
use super::wav::{write_wav, SampleDepth};
use crate::error::AudioError;
use crate::interactive::session::RunResult;

/// Name of the rendered final genome
pub const FINAL_AUDIO_FILE: &str = "final.wav";
/// Name of the serialized run
pub const TRAJECTORY_FILE: &str = "trajectory.json";

/// File name of the `n`th lineage (1-based) when several were evolved
pub fn lineage_file(n: usize) -> String {
    format!("lineage{}.wav", n)
}

/// Where a run was saved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedRun {
    /// JSON record of every generation
    pub trajectory: PathBuf,
    /// Rendered final genome, absent when the run never started
    pub final_audio: Option<PathBuf>,
    /// One render per lineage, empty for single-lineage runs
    pub population_audio: Vec<PathBuf>,
}

/// Writes run results into a directory
#[derive(Clone, Debug)]
pub struct ResultStore {
    dir: PathBuf,
    depth: SampleDepth,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>, depth: SampleDepth) -> Self {
        Self {
            dir: dir.into(),
            depth,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the trajectory and, if there is one, the final genome's mix
    ///
    /// Runs with more than one lineage also get every lineage's mix.
    pub fn save(&self, result: &RunResult, mixer: &Mixer) -> Result<SavedRun, AudioError> {
        fs::create_dir_all(&self.dir)?;

        let trajectory = self.dir.join(TRAJECTORY_FILE);
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| AudioError::Serialization(e.to_string()))?;
        fs::write(&trajectory, json)?;

        let final_audio = match &result.final_genome {
            Some(genome) => {
                let path = self.dir.join(FINAL_AUDIO_FILE);
                write_wav(&path, &mixer.mix(genome.genes())?, self.depth)?;
                Some(path)
            }
            None => None,
        };

        let mut population_audio = Vec::new();
        if result.population.len() > 1 {
            for (i, genome) in result.population.iter().enumerate() {
                let path = self.dir.join(lineage_file(i + 1));
                write_wav(&path, &mixer.mix(genome.genes())?, self.depth)?;
                population_audio.push(path);
            }
        }

        info!(
            "Saved {} generations to {}",
            result.generations_completed,
            self.dir.display()
        );
        Ok(SavedRun {
            trajectory,
            final_audio,
            population_audio,
        })
    }

    /// Read a saved trajectory back
    pub fn load(&self) -> Result<RunResult, AudioError> {
        let text = fs::read_to_string(self.dir.join(TRAJECTORY_FILE))?;
        serde_json::from_str(&text).map_err(|e| AudioError::Serialization(e.to_string()))
    }
}
