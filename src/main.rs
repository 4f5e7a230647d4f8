//! timbre-evo - interactive sound optimization from the terminal
//!
//! Mixes a set of base sounds, writes each generation's parent and
//! offspring to the evaluation directory, and asks which one sounds
//! better. The final mix and the full trajectory go to the result
//! directory.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timbre_evo::audio::store::ResultStore;
use timbre_evo::audio::synth::WavSynthesizer;
use timbre_evo::config::RunConfig;
use timbre_evo::error::FeedbackError;
use timbre_evo::interactive::algorithm::EvolutionEngine;
use timbre_evo::interactive::evaluator::{Choice, ComparisonRequest, ProceedSignal};
use timbre_evo::interactive::traits::FeedbackSource;
use timbre_evo::operators::mutation::PerturbationKind;

/// Command-line arguments for timbre-evo
#[derive(Parser, Debug)]
#[command(name = "timbre-evo")]
#[command(about = "Evolve a sound mix from your pairwise preferences")]
#[command(version)]
struct Args {
    /// TOML run configuration
    #[arg(short, long, env = "TIMBRE_EVO_CONFIG")]
    config: Option<PathBuf>,

    /// Base sound file (repeat once per sound)
    #[arg(short, long = "sound", value_name = "WAV")]
    sounds: Vec<PathBuf>,

    /// Number of generations
    #[arg(short, long)]
    generations: Option<usize>,

    /// Mutation step as a fraction of each weight's range
    #[arg(long)]
    step_size: Option<f64>,

    /// Random seed for reproducible runs
    #[arg(long, env = "TIMBRE_EVO_SEED")]
    seed: Option<u64>,

    /// How offspring are drawn
    #[arg(long, value_parser = ["uniform", "gaussian", "differential"])]
    perturbation: Option<String>,

    /// Number of lineages evolved side by side
    #[arg(long)]
    population_size: Option<usize>,

    /// Donor difference weight for differential variation
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Directory for parent/offspring renders
    #[arg(long)]
    evaluation_dir: Option<PathBuf>,

    /// Directory for the final mix and trajectory
    #[arg(long)]
    result_dir: Option<PathBuf>,

    /// Ask whether to keep going before every generation after the first
    #[arg(long)]
    confirm_each: bool,
}

impl Args {
    /// Overlay command-line settings on a loaded configuration
    fn apply(&self, config: &mut RunConfig) {
        if !self.sounds.is_empty() {
            config.audio.sounds = self.sounds.clone();
        }
        if !config.audio.sounds.is_empty() {
            config.base_sounds = config.audio.sounds.len();
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(step_size) = self.step_size {
            config.step_size = step_size;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        match self.perturbation.as_deref() {
            Some("gaussian") => config.perturbation = PerturbationKind::Gaussian,
            Some("uniform") => config.perturbation = PerturbationKind::Uniform,
            Some("differential") => config.perturbation = PerturbationKind::Differential,
            _ => {}
        }
        if let Some(population_size) = self.population_size {
            config.population_size = population_size;
        }
        if let Some(scale_factor) = self.scale_factor {
            config.scale_factor = scale_factor;
        }
        if let Some(dir) = &self.evaluation_dir {
            config.audio.evaluation_dir = dir.clone();
        }
        if let Some(dir) = &self.result_dir {
            config.audio.result_dir = dir.clone();
        }
    }
}

const PROCEED_PROMPT: &str = "Please input 1 to proceed with optimization or 0 to terminate.";
const CHOICE_PROMPT: &str =
    "Please input 0 if you prefer the parent or 1 if you prefer the offspring.";

/// Feedback read line by line from a terminal
///
/// Invalid answers are re-prompted. End of input closes the channel.
struct TerminalFeedback<R, W> {
    input: R,
    output: W,
    confirm_each: bool,
    lineages: usize,
}

impl<R: BufRead, W: Write> TerminalFeedback<R, W> {
    fn new(input: R, output: W, confirm_each: bool, lineages: usize) -> Self {
        Self {
            input,
            output,
            confirm_each,
            lineages,
        }
    }

    fn say(&mut self, line: &str) -> Result<(), FeedbackError> {
        writeln!(self.output, "{}", line).map_err(|_| FeedbackError::ChannelClosed)
    }

    fn read_answer(&mut self) -> Result<String, FeedbackError> {
        write!(self.output, "-> ")
            .and_then(|_| self.output.flush())
            .map_err(|_| FeedbackError::ChannelClosed)?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(FeedbackError::ChannelClosed),
            Ok(_) => Ok(line),
        }
    }

    fn ask<T>(
        &mut self,
        prompt: &str,
        parse: fn(&str) -> Result<T, FeedbackError>,
    ) -> Result<T, FeedbackError> {
        loop {
            self.say(prompt)?;
            let answer = self.read_answer()?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(FeedbackError::Invalid(input)) => {
                    self.say(&format!("Please input 1 or 0. You inputted {}.", input))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: BufRead, W: Write> FeedbackSource for TerminalFeedback<R, W> {
    fn proceed(&mut self) -> Result<ProceedSignal, FeedbackError> {
        self.ask(PROCEED_PROMPT, ProceedSignal::from_input)
    }

    fn continue_to(&mut self, _generation: usize) -> Result<ProceedSignal, FeedbackError> {
        if self.confirm_each {
            self.ask(PROCEED_PROMPT, ProceedSignal::from_input)
        } else {
            Ok(ProceedSignal::Proceed)
        }
    }

    fn choose(&mut self, request: &ComparisonRequest) -> Result<Choice, FeedbackError> {
        if self.lineages > 1 {
            self.say(&format!(
                "Generation {}, lineage {} of {}",
                request.generation,
                request.lineage + 1,
                self.lineages
            ))?;
        } else {
            self.say(&format!("Generation {}", request.generation))?;
        }
        self.say(&format!("  0: parent    {}", request.parent))?;
        self.say(&format!("  1: offspring {}", request.offspring))?;
        self.ask(CHOICE_PROMPT, Choice::from_input)
    }
}

/// Load the run configuration, apply overrides and reject it before any
/// audio is touched
fn load_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid run configuration")?;
    if config.audio.sounds.is_empty() {
        anyhow::bail!("Invalid run configuration: no base sounds, pass --sound or set audio.sounds");
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Logs go to stderr so they do not interleave with the prompts
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timbre_evo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let synth =
        WavSynthesizer::from_config(&config.audio).context("Failed to prepare base sounds")?;
    let mixer = synth.mixer().clone();
    let store = ResultStore::new(&config.audio.result_dir, config.audio.sample_depth);
    let variation = config.variation();
    info!(
        "Variation {:?} over {} lineage(s)",
        variation.kind(),
        config.population_size
    );
    let lineages = config.population_size;

    let mut engine =
        EvolutionEngine::new(config, variation, synth).context("Invalid run configuration")?;

    println!("Start sound optimization.");
    let stdin = io::stdin();
    let mut feedback =
        TerminalFeedback::new(stdin.lock(), io::stdout(), args.confirm_each, lineages);
    let outcome = engine.run(&mut feedback);

    let result = match (&outcome, engine.result()) {
        (_, Some(result)) => result,
        (Err(e), None) => anyhow::bail!("Evolution failed: {}", e),
        (Ok(result), None) => result.clone(),
    };
    info!("Run finished: {}", result.termination_reason);

    let saved = store
        .save(&result, &mixer)
        .context("Failed to save results")?;
    for path in &saved.population_audio {
        println!("Lineage saved in {}.", path.display());
    }
    if let Some(path) = &saved.final_audio {
        println!(
            "The final result was saved in {}.",
            std::fs::canonicalize(path).unwrap_or_else(|_| path.clone()).display()
        );
    }
    println!("The trajectory was saved in {}.", saved.trajectory.display());

    if let Err(e) = outcome {
        error!("{}", e);
        return Err(e).context("Evolution halted");
    }

    println!("Terminate sound optimization.");
    Ok(())
}
