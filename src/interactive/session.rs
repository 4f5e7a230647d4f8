//! Run history and results
//!
//! Every completed comparison leaves one [`GenerationRecord`] in an
//! append-only [`RunHistory`], one per lineage and generation. When the engine stops, the history is handed
//! out as part of a serializable [`RunResult`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::evaluator::Choice;
use crate::genome::sound_genome::SoundGenome;

/// One completed comparison
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// 1-based generation index
    pub generation: usize,
    /// 0-based lineage the comparison belonged to
    pub lineage: usize,
    /// The lineage's genome at the start of the generation
    pub parent: SoundGenome,
    /// Candidate the listener compared against it
    pub offspring: SoundGenome,
    /// The listener's choice
    pub choice: Choice,
    /// The lineage's genome after the comparison
    pub resulting: SoundGenome,
}

impl GenerationRecord {
    /// Whether the offspring replaced the parent
    pub fn accepted_offspring(&self) -> bool {
        self.choice == Choice::Offspring
    }
}

/// Append-only log of completed comparisons
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunHistory {
    records: Vec<GenerationRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: GenerationRecord) {
        self.records.push(record);
    }

    /// All records, oldest first
    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record
    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenerationRecord> {
        self.records.iter()
    }

    /// Fraction of comparisons the offspring won
    ///
    /// Returns `None` for an empty history.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let accepted = self.records.iter().filter(|r| r.accepted_offspring()).count();
        Some(accepted as f64 / self.records.len() as f64)
    }
}

impl<'a> IntoIterator for &'a RunHistory {
    type Item = &'a GenerationRecord;
    type IntoIter = std::slice::Iter<'a, GenerationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Why a run stopped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationReason {
    /// The listener declined to start
    Declined,
    /// The configured number of generations completed
    MaxGenerations { generations: usize },
    /// The listener stopped the run during this generation
    UserTerminated { generation: usize },
    /// A collaborator failed during this generation
    Halted { generation: usize, cause: String },
}

impl TerminationReason {
    /// Whether the run stopped because of a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declined => write!(f, "declined before the first generation"),
            Self::MaxGenerations { generations } => {
                write!(f, "reached maximum generations ({})", generations)
            }
            Self::UserTerminated { generation } => {
                write!(f, "terminated by listener in generation {}", generation)
            }
            Self::Halted { generation, cause } => {
                write!(f, "halted in generation {}: {}", generation, cause)
            }
        }
    }
}

/// Outcome of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Genome the listener accepted last, `None` if the run never started
    pub final_genome: Option<SoundGenome>,
    /// Every lineage at termination, empty if the run never started
    #[serde(default)]
    pub population: Vec<SoundGenome>,
    /// Every completed comparison
    pub history: RunHistory,
    /// Why the run stopped
    pub termination_reason: TerminationReason,
    /// Generations in which every lineage was compared
    pub generations_completed: usize,
}
