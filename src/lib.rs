//! # timbre-evo
//!
//! Interactive evolutionary optimization of sound.
//!
//! There is no fitness function. A genome of synthesis parameters (mix
//! weights over a fixed set of base sounds) is evolved one generation at a
//! time: the current best and a freshly varied offspring are rendered, a
//! listener says which one they prefer, and the preferred genome carries on.
//!
//! ## Core Concepts
//!
//! - **Pairwise preference**: one binary choice per comparison is the whole
//!   selection mechanism, with one comparison per lineage and generation
//! - **Bounded genomes**: every parameter lives in a declared range and every
//!   offspring is clamped back into it
//! - **Step-driven engine**: the engine suspends only while it waits for the
//!   listener, so any front end can drive it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timbre_evo::prelude::*;
//!
//! let config = RunConfig::from_file("run.toml")?;
//! let synth = WavSynthesizer::from_config(&config.audio)?;
//! let variation = config.variation();
//!
//! let mut engine = EvolutionEngine::new(config, variation, synth)?;
//! let result = engine.run(&mut my_feedback_source)?;
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod genome;
pub mod interactive;
pub mod operators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audio::prelude::*;
    pub use crate::config::{AudioConfig, RunConfig};
    pub use crate::error::*;
    pub use crate::genome::prelude::*;
    pub use crate::interactive::prelude::*;
    pub use crate::operators::prelude::*;
}
