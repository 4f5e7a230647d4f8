//! Genome representation
//!
//! This module provides the synthesis parameter genome, its bounds and the
//! codec that fixes a run's genome layout.

pub mod bounds;
pub mod codec;
pub mod sound_genome;

pub mod prelude {
    pub use super::bounds::*;
    pub use super::codec::*;
    pub use super::sound_genome::*;
}
