//! Core types for interactive evaluation
//!
//! This module defines the signals a listener sends to the engine and the
//! comparison requests the engine sends back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FeedbackError;

/// The listener's answer to a parent/offspring comparison
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Keep the current best
    Parent,
    /// Adopt the new candidate
    Offspring,
    /// Stop the run without recording this comparison
    Terminate,
}

impl Choice {
    /// Parse a comparison answer: `"0"` prefers the parent, `"1"` the offspring
    ///
    /// Surrounding whitespace is ignored. Anything else is rejected;
    /// the terminal alphabet has no spelling for [`Choice::Terminate`].
    pub fn from_input(input: &str) -> Result<Self, FeedbackError> {
        match input.trim() {
            "0" => Ok(Self::Parent),
            "1" => Ok(Self::Offspring),
            other => Err(FeedbackError::Invalid(other.to_string())),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Offspring => write!(f, "offspring"),
            Self::Terminate => write!(f, "terminate"),
        }
    }
}

/// Answer to the "proceed with optimization?" prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProceedSignal {
    /// `1`: start (or keep) optimizing
    Proceed,
    /// `0`: stop
    Decline,
}

impl ProceedSignal {
    /// Parse `"1"` (proceed) or `"0"` (decline)
    pub fn from_input(input: &str) -> Result<Self, FeedbackError> {
        match input.trim() {
            "1" => Ok(Self::Proceed),
            "0" => Ok(Self::Decline),
            other => Err(FeedbackError::Invalid(other.to_string())),
        }
    }
}

/// Which side of a comparison a render belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateRole {
    Parent,
    Offspring,
}

impl CandidateRole {
    /// Stable lowercase name, usable in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Offspring => "offspring",
        }
    }
}

impl fmt::Display for CandidateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a render sits in the run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderSlot {
    /// 1-based generation
    pub generation: usize,
    /// Parent or offspring
    pub role: CandidateRole,
}

impl RenderSlot {
    pub fn new(generation: usize, role: CandidateRole) -> Self {
        Self { generation, role }
    }
}

/// Opaque reference to rendered audio
///
/// The engine forwards handles to the listener without interpreting them.
/// File-based synthesizers store a path here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioArtifactHandle(String);

impl AudioArtifactHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator as given by the synthesizer
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The locator read as a filesystem path
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl From<PathBuf> for AudioArtifactHandle {
    fn from(path: PathBuf) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for AudioArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rendered parent/offspring pair awaiting the listener's choice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// 1-based generation
    pub generation: usize,
    /// 0-based lineage within the generation
    pub lineage: usize,
    /// Rendered parent
    pub parent: AudioArtifactHandle,
    /// Rendered candidate
    pub offspring: AudioArtifactHandle,
}
