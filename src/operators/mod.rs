//! Variation operators
//!
//! This module provides the mutation operators the engine varies genomes
//! with, differential interpolation across a population of lineages, and
//! crossover operators for two-parent recombination.

pub mod crossover;
pub mod differential;
pub mod mutation;
pub mod traits;

pub mod prelude {
    pub use super::crossover::*;
    pub use super::differential::*;
    pub use super::mutation::*;
    pub use super::traits::*;
}
