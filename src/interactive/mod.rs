//! Interactive evolution
//!
//! Human-in-the-loop optimization where the only fitness signal is a
//! listener's preference between two rendered sounds. Each generation the
//! engine varies every lineage, renders each parent next to its offspring,
//! and keeps whichever the listener picks. A run has a single lineage
//! unless configured otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! use timbre_evo::prelude::*;
//!
//! let config = RunConfig::default().with_seed(42);
//! let synth = WavSynthesizer::from_config(&config.audio)?;
//! let mut engine = EvolutionEngine::new(config, UniformPerturbation::new(), synth)?;
//!
//! let result = engine.run(&mut ScriptedFeedback::repeating("1", 5))?;
//! println!("{}", result.termination_reason);
//! ```

pub mod algorithm;
pub mod evaluator;
pub mod selection;
pub mod session;
pub mod traits;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::algorithm::{EngineState, EvolutionEngine, EvolutionEngineBuilder, StepResult};
    pub use super::evaluator::{
        AudioArtifactHandle, CandidateRole, Choice, ComparisonRequest, ProceedSignal, RenderSlot,
    };
    pub use super::selection::{PreferenceSelector, SelectionOutcome};
    pub use super::session::{GenerationRecord, RunHistory, RunResult, TerminationReason};
    pub use super::traits::{FeedbackSource, ScriptedFeedback, SynthesisAdapter};
}
