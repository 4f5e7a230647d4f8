//! Error types for timbre-evo
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

use crate::interactive::algorithm::EngineState;

/// Error type for genome operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// Invalid genome structure
    #[error("Invalid genome structure: {0}")]
    InvalidStructure(String),

    /// Constraint violation in genome
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Bounds with min > max or non-finite ends
    #[error("Invalid bounds at index {index}: [{min}, {max}]")]
    InvalidBounds { index: usize, min: f64, max: f64 },
}

/// Error type for operator failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Recombination of two genomes failed
    #[error("Recombination failed: {0}")]
    RecombinationFailed(String),

    /// Invalid operator configuration
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Error type for reading, mixing and writing audio
#[derive(Debug, Error)]
pub enum AudioError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoding or decoding error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Serialization of persisted results failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Waveforms that cannot be mixed together
    #[error("Incompatible audio: {0}")]
    Incompatible(String),

    /// A mixer was created without any base sounds
    #[error("No base sounds supplied")]
    NoSources,
}

/// Error raised by a [`SynthesisAdapter`](crate::interactive::traits::SynthesisAdapter)
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Underlying audio failure
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// The genome does not match the number of synthesis parameters
    #[error("Genome has {actual} parameters, synthesizer expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Any other rendering failure
    #[error("{0}")]
    Failed(String),
}

/// Error reported by a feedback channel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// Input outside the recognised alphabet
    #[error("Unrecognised feedback input {0:?}, expected 0 or 1")]
    Invalid(String),

    /// The channel has no more input
    #[error("Feedback channel closed")]
    ChannelClosed,
}

/// Top-level error type for evolution runs
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Genome error
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Invalid run configuration, detected before any generation starts
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A candidate could not be rendered
    #[error("Synthesis failed in generation {generation}: {source}")]
    Synthesis {
        /// Generation whose comparison could not be rendered
        generation: usize,
        /// Adapter failure
        #[source]
        source: SynthesisError,
    },

    /// Feedback outside the `{0, 1}` alphabet
    #[error("Invalid feedback in generation {generation}: {input:?}")]
    InvalidFeedbackInput {
        /// Generation awaiting feedback (0 for the initial proceed prompt)
        generation: usize,
        /// Raw input as received
        input: String,
    },

    /// Feedback channel closed while the engine was waiting
    #[error("Feedback channel closed in generation {generation}")]
    FeedbackChannelClosed {
        /// Generation awaiting feedback (0 for the initial proceed prompt)
        generation: usize,
    },

    /// Engine operation called in a state that does not accept it
    #[error("Cannot {operation} while engine is {state}")]
    InvalidTransition {
        /// State at the time of the call
        state: EngineState,
        /// Rejected operation
        operation: &'static str,
    },
}

impl EvolutionError {
    /// Generation a run-time failure belongs to, if any
    pub fn generation(&self) -> Option<usize> {
        match self {
            Self::Synthesis { generation, .. }
            | Self::InvalidFeedbackInput { generation, .. }
            | Self::FeedbackChannelClosed { generation } => Some(*generation),
            _ => None,
        }
    }

    pub(crate) fn from_feedback(err: FeedbackError, generation: usize) -> Self {
        match err {
            FeedbackError::Invalid(input) => Self::InvalidFeedbackInput { generation, input },
            FeedbackError::ChannelClosed => Self::FeedbackChannelClosed { generation },
        }
    }
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;

/// Repair information when an operator needs to fix a constraint violation
#[derive(Debug, Clone, PartialEq)]
pub struct RepairInfo {
    /// List of constraint violations that were repaired
    pub constraint_violations: Vec<String>,
    /// Method used to repair the genome
    pub repair_method: &'static str,
}

/// Result of an operator application with optional repair information
#[derive(Debug, Clone)]
pub enum OperatorResult<G> {
    /// Operation succeeded without repairs
    Success(G),
    /// Operation succeeded but required repairs
    Repaired(G, RepairInfo),
    /// Operation failed unrecoverably
    Failed(OperatorError),
}

impl<G> OperatorResult<G> {
    /// Returns the genome if successful or repaired, None if failed
    pub fn genome(self) -> Option<G> {
        match self {
            Self::Success(g) | Self::Repaired(g, _) => Some(g),
            Self::Failed(_) => None,
        }
    }

    /// Converts into a `Result`, discarding repair information
    pub fn into_result(self) -> Result<G, OperatorError> {
        match self {
            Self::Success(g) | Self::Repaired(g, _) => Ok(g),
            Self::Failed(e) => Err(e),
        }
    }

    /// Returns true if the operation was successful (with or without repairs)
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Returns true if repairs were needed
    pub fn was_repaired(&self) -> bool {
        matches!(self, Self::Repaired(_, _))
    }
}
