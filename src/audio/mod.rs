//! Audio rendering and persistence
//!
//! File-backed collaborators for the engine: a [`WavSynthesizer`] that
//! mixes base sounds with a genome's weights, and a [`ResultStore`] that
//! saves finished runs.
//!
//! [`WavSynthesizer`]: synth::WavSynthesizer
//! [`ResultStore`]: store::ResultStore

pub mod mixer;
pub mod store;
pub mod synth;
pub mod wav;
pub mod waveform;

pub mod prelude {
    pub use super::mixer::Mixer;
    pub use super::store::{ResultStore, SavedRun};
    pub use super::synth::WavSynthesizer;
    pub use super::wav::{read_wav, write_wav, SampleDepth};
    pub use super::waveform::Waveform;
}
