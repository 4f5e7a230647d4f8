//! Preference selection
//!
//! Maps the listener's pairwise choice onto the genome that survives the
//! generation. The mapping is total over [`Choice`] and never invents an
//! answer of its own.

use super::evaluator::Choice;
use crate::genome::sound_genome::SoundGenome;

/// What the engine does after a choice
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionOutcome {
    /// Continue with this genome in place of the parent
    Continue(SoundGenome),
    /// Stop the run
    Terminate,
}

/// Pairwise preference selector
#[derive(Clone, Copy, Debug, Default)]
pub struct PreferenceSelector;

impl PreferenceSelector {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a choice between `parent` and `offspring`
    pub fn select(
        &self,
        choice: Choice,
        parent: &SoundGenome,
        offspring: &SoundGenome,
    ) -> SelectionOutcome {
        match choice {
            Choice::Parent => SelectionOutcome::Continue(parent.clone()),
            Choice::Offspring => SelectionOutcome::Continue(offspring.clone()),
            Choice::Terminate => SelectionOutcome::Terminate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_maps_every_choice() {
        let selector = PreferenceSelector::new();
        let parent = SoundGenome::from([0.2, 0.2]);
        let offspring = SoundGenome::from([0.3, 0.1]);

        assert_eq!(
            selector.select(Choice::Parent, &parent, &offspring),
            SelectionOutcome::Continue(parent.clone())
        );
        assert_eq!(
            selector.select(Choice::Offspring, &parent, &offspring),
            SelectionOutcome::Continue(offspring.clone())
        );
        assert_eq!(
            selector.select(Choice::Terminate, &parent, &offspring),
            SelectionOutcome::Terminate
        );
    }
}
