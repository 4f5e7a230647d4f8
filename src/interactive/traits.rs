//! Collaborator traits
//!
//! The engine talks to the outside world through two seams: a
//! [`SynthesisAdapter`] that turns genomes into audio, and a
//! [`FeedbackSource`] that supplies the listener's answers. Neither is
//! called from inside the engine's state transitions except at the points
//! documented on [`EvolutionEngine`](super::algorithm::EvolutionEngine).

use std::collections::VecDeque;

use super::evaluator::{AudioArtifactHandle, Choice, ComparisonRequest, ProceedSignal, RenderSlot};
use crate::error::{FeedbackError, SynthesisError};
use crate::genome::sound_genome::SoundGenome;

/// Renders a genome to audio
///
/// Implementations must fail explicitly rather than return a handle to
/// empty or partial audio.
pub trait SynthesisAdapter {
    /// Render `genome` for the given slot
    fn render(
        &mut self,
        genome: &SoundGenome,
        slot: RenderSlot,
    ) -> Result<AudioArtifactHandle, SynthesisError>;
}

impl<S: SynthesisAdapter + ?Sized> SynthesisAdapter for &mut S {
    fn render(
        &mut self,
        genome: &SoundGenome,
        slot: RenderSlot,
    ) -> Result<AudioArtifactHandle, SynthesisError> {
        (**self).render(genome, slot)
    }
}

impl<S: SynthesisAdapter + ?Sized> SynthesisAdapter for Box<S> {
    fn render(
        &mut self,
        genome: &SoundGenome,
        slot: RenderSlot,
    ) -> Result<AudioArtifactHandle, SynthesisError> {
        (**self).render(genome, slot)
    }
}

/// Supplies the listener's answers
///
/// Implementations that can re-prompt should do so on malformed input and
/// only return [`FeedbackError::Invalid`] when they cannot.
pub trait FeedbackSource {
    /// Answer to the initial proceed prompt
    fn proceed(&mut self) -> Result<ProceedSignal, FeedbackError>;

    /// Answer to one comparison
    fn choose(&mut self, request: &ComparisonRequest) -> Result<Choice, FeedbackError>;

    /// Whether to go on to `generation`, asked before anything of it is
    /// rendered
    ///
    /// Not asked before the first generation, which [`proceed`](Self::proceed)
    /// already covers. Sources that do not ask always proceed.
    fn continue_to(&mut self, _generation: usize) -> Result<ProceedSignal, FeedbackError> {
        Ok(ProceedSignal::Proceed)
    }
}

impl<F: FeedbackSource + ?Sized> FeedbackSource for &mut F {
    fn proceed(&mut self) -> Result<ProceedSignal, FeedbackError> {
        (**self).proceed()
    }

    fn continue_to(&mut self, generation: usize) -> Result<ProceedSignal, FeedbackError> {
        (**self).continue_to(generation)
    }

    fn choose(&mut self, request: &ComparisonRequest) -> Result<Choice, FeedbackError> {
        (**self).choose(request)
    }
}

/// Feedback replayed from a fixed list of raw answers
///
/// The first answer goes to the proceed prompt, the rest to comparisons in
/// order. Running out of answers closes the channel.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFeedback {
    answers: VecDeque<String>,
}

impl ScriptedFeedback {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// Proceed, then answer every comparison with `answer`, `generations` times
    pub fn repeating(answer: &str, generations: usize) -> Self {
        Self::new(std::iter::once("1").chain(std::iter::repeat(answer).take(generations)))
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self) -> Result<String, FeedbackError> {
        self.answers.pop_front().ok_or(FeedbackError::ChannelClosed)
    }
}

impl FeedbackSource for ScriptedFeedback {
    fn proceed(&mut self) -> Result<ProceedSignal, FeedbackError> {
        ProceedSignal::from_input(&self.next()?)
    }

    fn choose(&mut self, _request: &ComparisonRequest) -> Result<Choice, FeedbackError> {
        Choice::from_input(&self.next()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ComparisonRequest {
        ComparisonRequest {
            generation: 1,
            lineage: 0,
            parent: AudioArtifactHandle::new("p"),
            offspring: AudioArtifactHandle::new("o"),
        }
    }

    #[test]
    fn test_scripted_feedback_replays_in_order() {
        let mut feedback = ScriptedFeedback::new(["1", "0", "1"]);
        assert_eq!(feedback.proceed(), Ok(ProceedSignal::Proceed));
        assert_eq!(feedback.choose(&request()), Ok(Choice::Parent));
        assert_eq!(feedback.choose(&request()), Ok(Choice::Offspring));
        assert_eq!(feedback.remaining(), 0);
        assert_eq!(
            feedback.choose(&request()),
            Err(FeedbackError::ChannelClosed)
        );
    }

    #[test]
    fn test_scripted_feedback_repeating() {
        let mut feedback = ScriptedFeedback::repeating("1", 3);
        assert_eq!(feedback.remaining(), 4);
        assert_eq!(feedback.proceed(), Ok(ProceedSignal::Proceed));
        for _ in 0..3 {
            assert_eq!(feedback.choose(&request()), Ok(Choice::Offspring));
        }
    }

    #[test]
    fn test_scripted_feedback_surfaces_invalid_input() {
        let mut feedback = ScriptedFeedback::new(["1", "maybe"]);
        feedback.proceed().unwrap();
        assert_eq!(
            feedback.choose(&request()),
            Err(FeedbackError::Invalid("maybe".to_string()))
        );
    }

    #[test]
    fn test_scripted_feedback_never_stops_between_generations() {
        let mut feedback = ScriptedFeedback::new(["1"]);
        assert_eq!(feedback.continue_to(2), Ok(ProceedSignal::Proceed));
        assert_eq!(feedback.remaining(), 1);
    }
}
