//! Pairwise interactive evolution engine
//!
//! [`EvolutionEngine`] evolves one or more lineages of sound genomes. At
//! the start of each generation it varies every lineage, then renders each
//! parent and its offspring in turn and waits for the listener to pick
//! one. With the default single lineage that is one comparison per
//! generation. The engine is driven step by step, so the caller decides
//! how and when feedback is collected:
//!
//! ```rust,ignore
//! use timbre_evo::prelude::*;
//!
//! let mut engine = EvolutionEngine::new(config, UniformPerturbation::new(), synth)?;
//! engine.begin(ProceedSignal::Proceed)?;
//!
//! loop {
//!     match engine.step()? {
//!         StepResult::NeedsFeedback(request) => {
//!             let choice = ask_listener(&request);
//!             engine.provide_feedback(choice)?;
//!         }
//!         StepResult::GenerationComplete { generation, choice } => {
//!             println!("Generation {} kept the {}", generation, choice);
//!         }
//!         StepResult::Complete(result) => break,
//!     }
//! }
//! ```
//!
//! [`EvolutionEngine::run`] drives the same loop against a
//! [`FeedbackSource`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracing::{debug, info, warn};

use super::evaluator::{
    AudioArtifactHandle, CandidateRole, Choice, ComparisonRequest, ProceedSignal, RenderSlot,
};
use super::selection::{PreferenceSelector, SelectionOutcome};
use super::session::{GenerationRecord, RunHistory, RunResult, TerminationReason};
use super::traits::{FeedbackSource, SynthesisAdapter};
use crate::config::RunConfig;
use crate::error::{EvoResult, EvolutionError, FeedbackError, SynthesisError};
use crate::genome::codec::GenomeCodec;
use crate::genome::sound_genome::SoundGenome;
use crate::operators::traits::VariationOperator;

/// Engine lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Waiting for the listener to agree to start
    AwaitingStart,
    /// Ready to produce and render the next comparison
    Generating,
    /// Suspended until the listener chooses
    AwaitingFeedback,
    /// A generation has been recorded; termination is checked next
    Advancing,
    /// Finished; absorbing
    Terminated,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingStart => "awaiting start",
            Self::Generating => "generating",
            Self::AwaitingFeedback => "awaiting feedback",
            Self::Advancing => "advancing",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Result of calling [`EvolutionEngine::step`]
#[derive(Clone, Debug)]
pub enum StepResult {
    /// A comparison is rendered and needs the listener's choice
    NeedsFeedback(ComparisonRequest),

    /// A generation was recorded
    GenerationComplete {
        /// Generation that completed
        generation: usize,
        /// Choice made in it
        choice: Choice,
    },

    /// The run is over
    Complete(Box<RunResult>),
}

/// Rendered comparison while waiting for feedback
#[derive(Clone, Debug)]
struct PendingComparison {
    offspring: SoundGenome,
    request: ComparisonRequest,
}

/// Pairwise interactive evolution engine
///
/// Owns the run history, the lineages and the random source. The random
/// source is consumed only by the variation operator.
pub struct EvolutionEngine<V, S, R = StdRng> {
    config: RunConfig,
    codec: GenomeCodec,
    variation: V,
    synthesizer: S,
    selector: PreferenceSelector,
    rng: R,
    state: EngineState,
    generation: usize,
    lineage: usize,
    population: Vec<SoundGenome>,
    brood: Vec<SoundGenome>,
    current_best: Option<SoundGenome>,
    pending: Option<PendingComparison>,
    history: RunHistory,
    termination: Option<TerminationReason>,
}

impl<V, S> EvolutionEngine<V, S, StdRng>
where
    V: VariationOperator,
    S: SynthesisAdapter,
{
    /// Create an engine for a mix-weight genome described by `config`
    ///
    /// The random source is seeded from `config.seed`, or from entropy when
    /// no seed is set.
    pub fn new(config: RunConfig, variation: V, synthesizer: S) -> EvoResult<Self> {
        config.validate()?;
        let codec = config.codec()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_parts(config, codec, variation, synthesizer, rng)
    }
}

impl<V, S, R> EvolutionEngine<V, S, R>
where
    V: VariationOperator,
    S: SynthesisAdapter,
    R: Rng,
{
    /// Create an engine from explicit parts
    ///
    /// `codec` must have one parameter per configured base sound.
    pub fn with_parts(
        config: RunConfig,
        codec: GenomeCodec,
        variation: V,
        synthesizer: S,
        rng: R,
    ) -> EvoResult<Self> {
        config.validate()?;
        if codec.dimension() != config.base_sounds {
            return Err(EvolutionError::Configuration(format!(
                "codec has {} parameters but {} base sounds are configured",
                codec.dimension(),
                config.base_sounds
            )));
        }

        Ok(Self {
            config,
            codec,
            variation,
            synthesizer,
            selector: PreferenceSelector::new(),
            rng,
            state: EngineState::AwaitingStart,
            generation: 0,
            lineage: 0,
            population: Vec::new(),
            brood: Vec::new(),
            current_best: None,
            pending: None,
            history: RunHistory::new(),
            termination: None,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current 1-based generation, 0 before the run starts
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Lineage whose comparison is next or in flight
    pub fn lineage(&self) -> usize {
        self.lineage
    }

    /// Genome the listener accepted last, `None` before the run starts
    ///
    /// Before the first comparison this is the first lineage.
    pub fn current_best(&self) -> Option<&SoundGenome> {
        self.current_best.as_ref()
    }

    /// Every lineage, empty before the run starts
    pub fn population(&self) -> &[SoundGenome] {
        &self.population
    }

    /// Completed generations
    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn codec(&self) -> &GenomeCodec {
        &self.codec
    }

    /// The comparison awaiting feedback, if any
    pub fn pending_request(&self) -> Option<&ComparisonRequest> {
        self.pending.as_ref().map(|p| &p.request)
    }

    /// Why the run stopped, once it has
    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        self.termination.as_ref()
    }

    /// The run's result, once terminated
    pub fn result(&self) -> Option<RunResult> {
        self.termination.as_ref().map(|reason| RunResult {
            final_genome: self.current_best.clone(),
            population: self.population.clone(),
            history: self.history.clone(),
            termination_reason: reason.clone(),
            generations_completed: self.generations_completed(),
        })
    }

    /// Generations in which every lineage was compared
    fn generations_completed(&self) -> usize {
        match self.population.len() {
            0 => 0,
            size => self.history.iter().filter(|r| r.lineage == size - 1).count(),
        }
    }

    /// Answer the initial "proceed with optimization?" prompt
    pub fn begin(&mut self, signal: ProceedSignal) -> EvoResult<()> {
        self.expect_state(EngineState::AwaitingStart, "begin")?;

        match signal {
            ProceedSignal::Decline => {
                info!("Listener declined to start optimization");
                self.terminate(TerminationReason::Declined);
            }
            ProceedSignal::Proceed => {
                info!(
                    "Starting evolution: {} generations of {} lineage(s) over {} parameters, step size {}",
                    self.config.generations,
                    self.config.population_size,
                    self.codec.dimension(),
                    self.config.step_size
                );
                self.population = self.codec.make_population(self.config.population_size);
                self.current_best = self.population.first().cloned();
                self.generation = 1;
                self.lineage = 0;
                self.state = EngineState::Generating;
            }
        }
        Ok(())
    }

    /// Answer "go on to the next generation?" before it is rendered
    ///
    /// Only accepted at the start of a generation. Declining stops the run
    /// as a listener termination in the generation that would have started.
    pub fn confirm_next(&mut self, signal: ProceedSignal) -> EvoResult<()> {
        if self.state != EngineState::Generating || self.lineage != 0 {
            return Err(self.invalid_transition("confirm the next generation"));
        }
        if signal == ProceedSignal::Decline {
            info!("Listener stopped before generation {}", self.generation);
            self.terminate(TerminationReason::UserTerminated {
                generation: self.generation,
            });
        }
        Ok(())
    }

    /// Advance the engine one step
    pub fn step(&mut self) -> EvoResult<StepResult> {
        match self.state {
            EngineState::Generating => self.generate().map(StepResult::NeedsFeedback),
            EngineState::Advancing => self.advance(),
            EngineState::Terminated => match self.result() {
                Some(result) => Ok(StepResult::Complete(Box::new(result))),
                None => Err(self.invalid_transition("step")),
            },
            EngineState::AwaitingStart | EngineState::AwaitingFeedback => {
                Err(self.invalid_transition("step"))
            }
        }
    }

    /// Apply the listener's choice for the pending comparison
    pub fn provide_feedback(&mut self, choice: Choice) -> EvoResult<()> {
        self.expect_state(EngineState::AwaitingFeedback, "provide feedback")?;
        let parent = self.population.get(self.lineage).cloned();
        let (parent, pending) = match (parent, self.pending.take()) {
            (Some(parent), Some(pending)) => (parent, pending),
            _ => return Err(self.invalid_transition("provide feedback")),
        };

        match self.selector.select(choice, &parent, &pending.offspring) {
            SelectionOutcome::Continue(resulting) => {
                debug!(
                    "Generation {}, lineage {}: kept {}",
                    self.generation, self.lineage, choice
                );
                self.history.push(GenerationRecord {
                    generation: self.generation,
                    lineage: self.lineage,
                    parent,
                    offspring: pending.offspring,
                    choice,
                    resulting: resulting.clone(),
                });
                if let Some(slot) = self.population.get_mut(self.lineage) {
                    *slot = resulting.clone();
                }
                self.current_best = Some(resulting);

                if self.lineage + 1 < self.population.len() {
                    self.lineage += 1;
                    self.state = EngineState::Generating;
                } else {
                    self.state = EngineState::Advancing;
                }
            }
            SelectionOutcome::Terminate => {
                info!("Listener terminated the run in generation {}", self.generation);
                self.terminate(TerminationReason::UserTerminated {
                    generation: self.generation,
                });
            }
        }
        Ok(())
    }

    /// Parse and apply a raw `"0"`/`"1"` answer
    ///
    /// Malformed input is rejected without changing state, so the caller
    /// can ask again.
    pub fn provide_raw_feedback(&mut self, input: &str) -> EvoResult<()> {
        self.expect_state(EngineState::AwaitingFeedback, "provide feedback")?;
        let choice = Choice::from_input(input)
            .map_err(|e| EvolutionError::from_feedback(e, self.generation))?;
        self.provide_feedback(choice)
    }

    /// Drive the whole run against a feedback source
    ///
    /// Feedback errors halt the run. Malformed input is one of them: it is
    /// never read as a termination. The history collected up to that point
    /// stays available through [`result`](Self::result).
    pub fn run<F: FeedbackSource>(&mut self, feedback: &mut F) -> EvoResult<RunResult> {
        if self.state == EngineState::AwaitingStart {
            let signal = match feedback.proceed() {
                Ok(signal) => signal,
                Err(e) => return Err(self.halt_on_feedback(e)),
            };
            self.begin(signal)?;
        }

        loop {
            if self.state == EngineState::Generating && self.lineage == 0 && self.generation > 1 {
                let signal = match feedback.continue_to(self.generation) {
                    Ok(signal) => signal,
                    Err(e) => return Err(self.halt_on_feedback(e)),
                };
                self.confirm_next(signal)?;
            }

            match self.step()? {
                StepResult::NeedsFeedback(request) => {
                    let choice = match feedback.choose(&request) {
                        Ok(choice) => choice,
                        Err(e) => return Err(self.halt_on_feedback(e)),
                    };
                    self.provide_feedback(choice)?;
                }
                StepResult::GenerationComplete { .. } => {}
                StepResult::Complete(result) => return Ok(*result),
            }
        }
    }

    fn generate(&mut self) -> EvoResult<ComparisonRequest> {
        if self.lineage == 0 {
            self.breed();
        }
        let (parent, offspring) = match (
            self.population.get(self.lineage),
            self.brood.get(self.lineage),
        ) {
            (Some(parent), Some(offspring)) => (parent.clone(), offspring.clone()),
            _ => return Err(self.invalid_transition("step")),
        };
        debug!(
            "Generation {}, lineage {}: offspring at distance {:.4}",
            self.generation,
            self.lineage,
            parent.distance(&offspring)
        );

        let parent_handle = self.render(&parent, CandidateRole::Parent)?;
        let offspring_handle = self.render(&offspring, CandidateRole::Offspring)?;

        let request = ComparisonRequest {
            generation: self.generation,
            lineage: self.lineage,
            parent: parent_handle,
            offspring: offspring_handle,
        };
        self.pending = Some(PendingComparison {
            offspring,
            request: request.clone(),
        });
        self.state = EngineState::AwaitingFeedback;
        Ok(request)
    }

    /// Vary every lineage against the population as it stands now
    fn breed(&mut self) {
        let mut brood = Vec::with_capacity(self.population.len());
        for index in 0..self.population.len() {
            brood.push(self.variation.vary_member(
                &self.population,
                index,
                self.config.step_size,
                &self.codec,
                &mut self.rng,
            ));
        }
        self.brood = brood;
    }

    fn render(
        &mut self,
        genome: &SoundGenome,
        role: CandidateRole,
    ) -> EvoResult<AudioArtifactHandle> {
        let slot = RenderSlot::new(self.generation, role);
        self.synthesizer
            .render(genome, slot)
            .map_err(|source| self.halt_on_synthesis(source))
    }

    fn advance(&mut self) -> EvoResult<StepResult> {
        let completed = self.generation;
        let choice = match self.history.last() {
            Some(record) => record.choice,
            None => return Err(self.invalid_transition("step")),
        };

        if completed >= self.config.generations {
            info!("Reached maximum generations ({})", self.config.generations);
            self.terminate(TerminationReason::MaxGenerations {
                generations: completed,
            });
        } else {
            self.generation += 1;
            self.lineage = 0;
            self.state = EngineState::Generating;
        }

        Ok(StepResult::GenerationComplete {
            generation: completed,
            choice,
        })
    }

    fn terminate(&mut self, reason: TerminationReason) {
        if let Some(rate) = self.history.acceptance_rate() {
            info!(
                "Offspring preferred in {:.0}% of {} comparisons",
                rate * 100.0,
                self.history.len()
            );
        }
        self.pending = None;
        self.termination = Some(reason);
        self.state = EngineState::Terminated;
    }

    fn halt(&mut self, cause: String) {
        warn!("Halting evolution in generation {}: {}", self.generation, cause);
        self.terminate(TerminationReason::Halted {
            generation: self.generation,
            cause,
        });
    }

    fn halt_on_synthesis(&mut self, source: SynthesisError) -> EvolutionError {
        self.halt(source.to_string());
        EvolutionError::Synthesis {
            generation: self.generation,
            source,
        }
    }

    fn halt_on_feedback(&mut self, err: FeedbackError) -> EvolutionError {
        self.halt(err.to_string());
        EvolutionError::from_feedback(err, self.generation)
    }

    fn expect_state(&self, expected: EngineState, operation: &'static str) -> EvoResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_transition(operation))
        }
    }

    fn invalid_transition(&self, operation: &'static str) -> EvolutionError {
        EvolutionError::InvalidTransition {
            state: self.state,
            operation,
        }
    }
}

/// Builder for [`EvolutionEngine`]
///
/// The variation operator, synthesizer and random source types are fixed
/// as they are supplied.
pub struct EvolutionEngineBuilder<V, S, R = StdRng> {
    config: RunConfig,
    codec: Option<GenomeCodec>,
    variation: Option<V>,
    synthesizer: Option<S>,
    rng: Option<R>,
}

impl EvolutionEngineBuilder<(), (), StdRng> {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            codec: None,
            variation: None,
            synthesizer: None,
            rng: None,
        }
    }
}

impl Default for EvolutionEngineBuilder<(), (), StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S, R> EvolutionEngineBuilder<V, S, R> {
    /// Replace the whole run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of generations
    pub fn generations(mut self, generations: usize) -> Self {
        self.config.generations = generations;
        self
    }

    /// Set the mutation step size
    pub fn step_size(mut self, step_size: f64) -> Self {
        self.config.step_size = step_size;
        self
    }

    /// Seed the default random source
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the number of base sounds
    pub fn base_sounds(mut self, base_sounds: usize) -> Self {
        self.config.base_sounds = base_sounds;
        self
    }

    /// Set the number of lineages
    pub fn population_size(mut self, population_size: usize) -> Self {
        self.config.population_size = population_size;
        self
    }

    /// Use a custom codec instead of the configured mix weights
    pub fn codec(mut self, codec: GenomeCodec) -> Self {
        self.config.base_sounds = codec.dimension();
        self.codec = Some(codec);
        self
    }

    /// Set the variation operator
    pub fn variation<NewV>(self, variation: NewV) -> EvolutionEngineBuilder<NewV, S, R>
    where
        NewV: VariationOperator,
    {
        EvolutionEngineBuilder {
            config: self.config,
            codec: self.codec,
            variation: Some(variation),
            synthesizer: self.synthesizer,
            rng: self.rng,
        }
    }

    /// Set the synthesizer
    pub fn synthesizer<NewS>(self, synthesizer: NewS) -> EvolutionEngineBuilder<V, NewS, R>
    where
        NewS: SynthesisAdapter,
    {
        EvolutionEngineBuilder {
            config: self.config,
            codec: self.codec,
            variation: self.variation,
            synthesizer: Some(synthesizer),
            rng: self.rng,
        }
    }

    /// Use a specific random source, ignoring the configured seed
    pub fn rng<NewR>(self, rng: NewR) -> EvolutionEngineBuilder<V, S, NewR>
    where
        NewR: Rng,
    {
        EvolutionEngineBuilder {
            config: self.config,
            codec: self.codec,
            variation: self.variation,
            synthesizer: self.synthesizer,
            rng: Some(rng),
        }
    }
}

impl<V, S, R> EvolutionEngineBuilder<V, S, R>
where
    V: VariationOperator,
    S: SynthesisAdapter,
    R: Rng + SeedableRng,
{
    /// Build the engine
    pub fn build(self) -> EvoResult<EvolutionEngine<V, S, R>> {
        let variation = self
            .variation
            .ok_or_else(|| EvolutionError::Configuration("Variation operator required".into()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| EvolutionError::Configuration("Synthesizer required".into()))?;

        self.config.validate()?;
        let codec = match self.codec {
            Some(codec) => codec,
            None => self.config.codec()?,
        };
        let rng = match (self.rng, self.config.seed) {
            (Some(rng), _) => rng,
            (None, Some(seed)) => R::seed_from_u64(seed),
            (None, None) => R::from_entropy(),
        };

        EvolutionEngine::with_parts(self.config, codec, variation, synthesizer, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::bounds::{Bounds, MultiBounds};
    use crate::interactive::traits::ScriptedFeedback;
    use crate::operators::differential::DifferentialInterpolation;
    use crate::operators::mutation::UniformPerturbation;

    /// Synthesizer that remembers what it rendered
    #[derive(Default)]
    struct RecordingSynth {
        renders: Vec<(RenderSlot, SoundGenome)>,
        fail_in_generation: Option<usize>,
    }

    impl SynthesisAdapter for RecordingSynth {
        fn render(
            &mut self,
            genome: &SoundGenome,
            slot: RenderSlot,
        ) -> Result<AudioArtifactHandle, SynthesisError> {
            if self.fail_in_generation == Some(slot.generation) {
                return Err(SynthesisError::Failed("renderer offline".into()));
            }
            self.renders.push((slot, genome.clone()));
            Ok(AudioArtifactHandle::new(format!(
                "mem://{}/{}",
                slot.generation, slot.role
            )))
        }
    }

    fn engine(generations: usize) -> EvolutionEngine<UniformPerturbation, RecordingSynth> {
        let config = RunConfig::default()
            .with_generations(generations)
            .with_seed(7);
        EvolutionEngine::new(config, UniformPerturbation::new(), RecordingSynth::default())
            .unwrap()
    }

    fn expect_request(result: StepResult) -> ComparisonRequest {
        match result {
            StepResult::NeedsFeedback(request) => request,
            other => panic!("Expected NeedsFeedback, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = RunConfig::default().with_generations(0);
        let result = EvolutionEngine::new(config, UniformPerturbation::new(), RecordingSynth::default());
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(3);
        assert_eq!(engine.state(), EngineState::AwaitingStart);
        assert_eq!(engine.generation(), 0);
        assert!(engine.current_best().is_none());
        assert!(engine.result().is_none());
    }

    #[test]
    fn test_decline_terminates_immediately() {
        let mut engine = engine(3);
        engine.begin(ProceedSignal::Decline).unwrap();
        assert_eq!(engine.state(), EngineState::Terminated);

        match engine.step().unwrap() {
            StepResult::Complete(result) => {
                assert!(result.history.is_empty());
                assert_eq!(result.final_genome, None);
                assert_eq!(result.termination_reason, TerminationReason::Declined);
            }
            other => panic!("Expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_generation_renders_parent_then_offspring() {
        let mut engine = engine(3);
        engine.begin(ProceedSignal::Proceed).unwrap();
        assert_eq!(engine.current_best(), Some(&SoundGenome::filled(5, 0.2)));

        let request = expect_request(engine.step().unwrap());
        assert_eq!(request.generation, 1);
        assert_eq!(request.parent.as_str(), "mem://1/parent");
        assert_eq!(request.offspring.as_str(), "mem://1/offspring");
        assert_eq!(engine.state(), EngineState::AwaitingFeedback);
        assert_eq!(engine.pending_request(), Some(&request));

        let renders = &engine.synthesizer.renders;
        assert_eq!(renders.len(), 2);
        assert_eq!(renders[0].0.role, CandidateRole::Parent);
        assert_eq!(renders[0].1, SoundGenome::filled(5, 0.2));
        assert_eq!(renders[1].0.role, CandidateRole::Offspring);
    }

    #[test]
    fn test_offspring_choice_becomes_current_best() {
        let mut engine = engine(3);
        engine.begin(ProceedSignal::Proceed).unwrap();
        expect_request(engine.step().unwrap());
        let offspring = engine.synthesizer.renders[1].1.clone();

        engine.provide_feedback(Choice::Offspring).unwrap();
        assert_eq!(engine.state(), EngineState::Advancing);
        assert_eq!(engine.current_best(), Some(&offspring));

        let record = engine.history().last().unwrap();
        assert_eq!(record.generation, 1);
        assert_eq!(record.choice, Choice::Offspring);
        assert_eq!(record.resulting, offspring);

        match engine.step().unwrap() {
            StepResult::GenerationComplete { generation, choice } => {
                assert_eq!(generation, 1);
                assert_eq!(choice, Choice::Offspring);
            }
            other => panic!("Expected GenerationComplete, got {:?}", other),
        }
        assert_eq!(engine.state(), EngineState::Generating);
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn test_parent_choice_keeps_current_best() {
        let mut engine = engine(3);
        engine.begin(ProceedSignal::Proceed).unwrap();
        let before = engine.current_best().cloned();
        expect_request(engine.step().unwrap());
        engine.provide_feedback(Choice::Parent).unwrap();
        assert_eq!(engine.current_best().cloned(), before);
    }

    #[test]
    fn test_terminate_choice_records_nothing() {
        let mut engine = engine(5);
        engine.begin(ProceedSignal::Proceed).unwrap();
        expect_request(engine.step().unwrap());
        engine.provide_feedback(Choice::Offspring).unwrap();
        engine.step().unwrap();
        expect_request(engine.step().unwrap());
        engine.provide_feedback(Choice::Terminate).unwrap();

        assert_eq!(engine.state(), EngineState::Terminated);
        let result = engine.result().unwrap();
        assert_eq!(result.generations_completed, 1);
        assert_eq!(
            result.termination_reason,
            TerminationReason::UserTerminated { generation: 2 }
        );
        assert_eq!(
            result.final_genome.as_ref(),
            Some(&result.history.records()[0].resulting)
        );
    }

    #[test]
    fn test_full_run_stops_at_max_generations() {
        let mut engine = engine(3);
        let mut feedback = ScriptedFeedback::new(["1", "1", "0", "1"]);
        let result = engine.run(&mut feedback).unwrap();

        assert_eq!(result.generations_completed, 3);
        assert_eq!(
            result.termination_reason,
            TerminationReason::MaxGenerations { generations: 3 }
        );
        let choices: Vec<Choice> = result.history.iter().map(|r| r.choice).collect();
        assert_eq!(choices, vec![Choice::Offspring, Choice::Parent, Choice::Offspring]);
        assert_eq!(
            result.final_genome.as_ref(),
            Some(&result.history.records()[2].resulting)
        );
        assert_eq!(feedback.remaining(), 0);
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let mut engine = engine(1);
        engine.run(&mut ScriptedFeedback::repeating("0", 1)).unwrap();

        for _ in 0..3 {
            assert!(matches!(engine.step(), Ok(StepResult::Complete(_))));
        }
        assert!(matches!(
            engine.begin(ProceedSignal::Proceed),
            Err(EvolutionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            engine.provide_feedback(Choice::Parent),
            Err(EvolutionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_wrong_state_operations_are_rejected() {
        let mut engine = engine(2);
        let err = engine.step().unwrap_err();
        assert_eq!(err.to_string(), "Cannot step while engine is awaiting start");
        assert!(matches!(
            engine.provide_feedback(Choice::Offspring),
            Err(EvolutionError::InvalidTransition {
                state: EngineState::AwaitingStart,
                ..
            })
        ));

        engine.begin(ProceedSignal::Proceed).unwrap();
        expect_request(engine.step().unwrap());
        assert!(matches!(
            engine.step(),
            Err(EvolutionError::InvalidTransition {
                state: EngineState::AwaitingFeedback,
                ..
            })
        ));
        assert_eq!(engine.state(), EngineState::AwaitingFeedback);
    }

    #[test]
    fn test_invalid_raw_feedback_leaves_engine_waiting() {
        let mut engine = engine(2);
        engine.begin(ProceedSignal::Proceed).unwrap();
        expect_request(engine.step().unwrap());

        let err = engine.provide_raw_feedback("2").unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::InvalidFeedbackInput { generation: 1, ref input } if input == "2"
        ));
        assert_eq!(engine.state(), EngineState::AwaitingFeedback);
        assert!(engine.history().is_empty());

        engine.provide_raw_feedback("1\n").unwrap();
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_synthesis_failure_halts() {
        let config = RunConfig::default().with_generations(5).with_seed(1);
        let synth = RecordingSynth {
            fail_in_generation: Some(2),
            ..RecordingSynth::default()
        };
        let mut engine = EvolutionEngine::new(config, UniformPerturbation::new(), synth).unwrap();

        let err = engine.run(&mut ScriptedFeedback::repeating("1", 5)).unwrap_err();
        assert_eq!(err.generation(), Some(2));
        assert!(matches!(err, EvolutionError::Synthesis { generation: 2, .. }));

        let result = engine.result().unwrap();
        assert_eq!(result.generations_completed, 1);
        assert!(result.termination_reason.is_failure());
        assert_eq!(
            result.final_genome.as_ref(),
            Some(&result.history.records()[0].resulting)
        );
    }

    #[test]
    fn test_closed_feedback_channel_halts() {
        let mut engine = engine(4);
        let err = engine.run(&mut ScriptedFeedback::new(["1", "1"])).unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::FeedbackChannelClosed { generation: 2 }
        ));
        assert_eq!(engine.state(), EngineState::Terminated);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_builder_requires_parts() {
        let result = EvolutionEngineBuilder::new()
            .variation(UniformPerturbation::new())
            .synthesizer(RecordingSynth::default())
            .generations(0)
            .build();
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_builder_with_custom_codec() {
        let codec = GenomeCodec::new(MultiBounds::new(vec![
            Bounds::new(0.0, 1.0),
            Bounds::new(20.0, 20_000.0),
        ]))
        .unwrap();

        let mut engine = EvolutionEngineBuilder::new()
            .codec(codec)
            .generations(2)
            .seed(3)
            .variation(UniformPerturbation::new())
            .synthesizer(RecordingSynth::default())
            .build()
            .unwrap();

        assert_eq!(engine.config().base_sounds, 2);
        engine.begin(ProceedSignal::Proceed).unwrap();
        assert_eq!(
            engine.current_best(),
            Some(&SoundGenome::from([0.5, 10_010.0]))
        );
        expect_request(engine.step().unwrap());
        let offspring = &engine.synthesizer.renders[1].1;
        assert!(engine.codec().validate(offspring).is_ok());
    }

    #[test]
    fn test_with_parts_rejects_codec_mismatch() {
        let codec = GenomeCodec::mix_weights(3, Bounds::unit()).unwrap();
        let result = EvolutionEngine::with_parts(
            RunConfig::default(),
            codec,
            UniformPerturbation::new(),
            RecordingSynth::default(),
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_bad_parameter_range_is_a_configuration_error() {
        for range in [
            Bounds { min: 1.0, max: 0.0 },
            Bounds {
                min: 0.0,
                max: f64::NAN,
            },
        ] {
            let config = RunConfig {
                parameter_range: range,
                ..RunConfig::default()
            };
            let result = EvolutionEngine::new(
                config.clone(),
                UniformPerturbation::new(),
                RecordingSynth::default(),
            );
            assert!(matches!(result, Err(EvolutionError::Configuration(_))));

            let result = EvolutionEngineBuilder::new()
                .config(config)
                .variation(UniformPerturbation::new())
                .synthesizer(RecordingSynth::default())
                .build();
            assert!(matches!(result, Err(EvolutionError::Configuration(_))));
        }
    }

    #[test]
    fn test_invalid_choice_in_run_halts_instead_of_terminating() {
        let mut engine = engine(4);
        let err = engine
            .run(&mut ScriptedFeedback::new(["1", "1", "2"]))
            .unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::InvalidFeedbackInput { generation: 2, ref input } if input == "2"
        ));

        assert_eq!(engine.state(), EngineState::Terminated);
        let result = engine.result().unwrap();
        assert_eq!(result.history.len(), 1);
        assert!(matches!(
            result.termination_reason,
            TerminationReason::Halted { generation: 2, .. }
        ));
    }

    #[test]
    fn test_invalid_proceed_answer_halts_before_first_generation() {
        let mut engine = engine(4);
        let err = engine.run(&mut ScriptedFeedback::new(["x"])).unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::InvalidFeedbackInput { generation: 0, ref input } if input == "x"
        ));

        let result = engine.result().unwrap();
        assert!(result.history.is_empty());
        assert_eq!(result.final_genome, None);
        assert!(result.termination_reason.is_failure());
        assert!(engine.synthesizer.renders.is_empty());
    }

    /// Feedback that always prefers the offspring and stops before `stop_at`
    struct StopBefore {
        stop_at: usize,
        asked: Vec<usize>,
    }

    impl FeedbackSource for StopBefore {
        fn proceed(&mut self) -> Result<ProceedSignal, FeedbackError> {
            Ok(ProceedSignal::Proceed)
        }

        fn choose(&mut self, _request: &ComparisonRequest) -> Result<Choice, FeedbackError> {
            Ok(Choice::Offspring)
        }

        fn continue_to(&mut self, generation: usize) -> Result<ProceedSignal, FeedbackError> {
            self.asked.push(generation);
            if generation == self.stop_at {
                Ok(ProceedSignal::Decline)
            } else {
                Ok(ProceedSignal::Proceed)
            }
        }
    }

    #[test]
    fn test_declining_next_generation_renders_nothing_more() {
        let mut engine = engine(5);
        let mut feedback = StopBefore {
            stop_at: 3,
            asked: Vec::new(),
        };
        let result = engine.run(&mut feedback).unwrap();

        assert_eq!(feedback.asked, vec![2, 3]);
        assert_eq!(result.history.len(), 2);
        assert_eq!(
            result.termination_reason,
            TerminationReason::UserTerminated { generation: 3 }
        );
        // two generations, two renders each
        assert_eq!(engine.synthesizer.renders.len(), 4);
        assert!(engine
            .synthesizer
            .renders
            .iter()
            .all(|(slot, _)| slot.generation < 3));
    }

    #[test]
    fn test_confirm_next_only_at_generation_start() {
        let mut engine = engine(3);
        assert!(matches!(
            engine.confirm_next(ProceedSignal::Proceed),
            Err(EvolutionError::InvalidTransition { .. })
        ));

        engine.begin(ProceedSignal::Proceed).unwrap();
        engine.confirm_next(ProceedSignal::Proceed).unwrap();
        expect_request(engine.step().unwrap());
        assert!(matches!(
            engine.confirm_next(ProceedSignal::Decline),
            Err(EvolutionError::InvalidTransition {
                state: EngineState::AwaitingFeedback,
                ..
            })
        ));
        assert_eq!(engine.state(), EngineState::AwaitingFeedback);
    }

    fn population_engine(
        generations: usize,
    ) -> EvolutionEngine<DifferentialInterpolation, RecordingSynth> {
        let config = RunConfig::default()
            .with_generations(generations)
            .with_seed(12)
            .with_differential(5, 1.0);
        EvolutionEngine::new(
            config,
            DifferentialInterpolation::new(),
            RecordingSynth::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_population_compares_every_lineage_each_generation() {
        let mut engine = population_engine(2);
        engine.begin(ProceedSignal::Proceed).unwrap();
        assert_eq!(engine.population().len(), 5);
        assert_eq!(engine.current_best(), Some(&engine.population()[0]));

        let mut seen = Vec::new();
        let mut completed = Vec::new();
        loop {
            match engine.step().unwrap() {
                StepResult::NeedsFeedback(request) => {
                    seen.push((request.generation, request.lineage));
                    engine.provide_feedback(Choice::Offspring).unwrap();
                }
                StepResult::GenerationComplete { generation, .. } => completed.push(generation),
                StepResult::Complete(result) => {
                    assert_eq!(result.history.len(), 10);
                    assert_eq!(result.generations_completed, 2);
                    assert_eq!(result.population.len(), 5);
                    assert_eq!(
                        result.final_genome.as_ref(),
                        Some(&result.history.records()[9].resulting)
                    );
                    break;
                }
            }
        }

        let expected: Vec<(usize, usize)> =
            (1..=2).flat_map(|g| (0..5).map(move |l| (g, l))).collect();
        assert_eq!(seen, expected);
        assert_eq!(completed, vec![1, 2]);
    }

    #[test]
    fn test_population_offspring_bred_from_generation_start() {
        let mut engine = population_engine(1);
        let result = engine.run(&mut ScriptedFeedback::repeating("1", 5)).unwrap();

        let codec = GenomeCodec::mix_weights(5, Bounds::unit()).unwrap();
        let start = codec.make_population(5);
        let op = DifferentialInterpolation::new();
        let mut rng = StdRng::seed_from_u64(12);
        let expected: Vec<SoundGenome> = (0..5)
            .map(|i| op.vary_member(&start, i, 0.1, &codec, &mut rng))
            .collect();

        for (record, offspring) in result.history.iter().zip(&expected) {
            assert_eq!(&record.parent, &start[record.lineage]);
            assert_eq!(&record.offspring, offspring);
        }
        assert_eq!(result.population, expected);
    }

    #[test]
    fn test_population_halt_mid_generation_counts_whole_generations() {
        let mut engine = population_engine(3);
        // proceed, five answers for generation 1, two for generation 2
        let mut feedback = ScriptedFeedback::repeating("0", 7);
        let err = engine.run(&mut feedback).unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::FeedbackChannelClosed { generation: 2 }
        ));

        let result = engine.result().unwrap();
        assert_eq!(result.history.len(), 7);
        assert_eq!(result.generations_completed, 1);
        assert_eq!(engine.lineage(), 2);
    }
}
