//! Weighted mixing of base sounds

use std::path::Path;
use tracing::debug;

use super::wav::read_wav;
use super::waveform::Waveform;
use crate::error::AudioError;

/// Mixes a fixed set of base sounds with per-sound weights
///
/// Shorter sources are zero-padded to the longest one. A mix whose peak
/// exceeds full scale is normalized back to a peak of 1.
#[derive(Clone, Debug)]
pub struct Mixer {
    sources: Vec<Waveform>,
}

impl Mixer {
    /// Create a mixer over sources sharing channel layout and sample rate
    pub fn new(sources: Vec<Waveform>) -> Result<Self, AudioError> {
        let first = sources.first().ok_or(AudioError::NoSources)?;
        if let Some((i, odd)) = sources
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_compatible(first))
        {
            return Err(AudioError::Incompatible(format!(
                "source {} is {} ch at {} Hz, source 0 is {} ch at {} Hz",
                i,
                odd.channels(),
                odd.sample_rate(),
                first.channels(),
                first.sample_rate()
            )));
        }
        Ok(Self { sources })
    }

    /// Load every base sound from disk
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, AudioError> {
        let sources = paths
            .iter()
            .map(|p| -> Result<Waveform, AudioError> {
                let wave = read_wav(p)?;
                debug!(
                    "Loaded {} ({} frames, {:.2} s)",
                    p.as_ref().display(),
                    wave.frames(),
                    wave.duration_secs()
                );
                Ok(wave)
            })
            .collect::<Result<Vec<_>, AudioError>>()?;
        Self::new(sources)
    }

    /// Number of base sounds
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[Waveform] {
        &self.sources
    }

    /// Mix the sources, one weight per source
    pub fn mix(&self, weights: &[f64]) -> Result<Waveform, AudioError> {
        if weights.len() != self.sources.len() {
            return Err(AudioError::Incompatible(format!(
                "{} weights for {} sources",
                weights.len(),
                self.sources.len()
            )));
        }

        let first = &self.sources[0];
        let length = self
            .sources
            .iter()
            .map(|s| s.samples().len())
            .max()
            .unwrap_or(0);

        let mut mixed = vec![0.0f64; length];
        for (source, &weight) in self.sources.iter().zip(weights) {
            for (out, &sample) in mixed.iter_mut().zip(source.samples()) {
                *out += weight * f64::from(sample);
            }
        }

        let peak = mixed.iter().fold(0.0f64, |peak, s| peak.max(s.abs()));
        let gain = if peak > 1.0 { 1.0 / peak } else { 1.0 };
        let samples = mixed.into_iter().map(|s| (s * gain) as f32).collect();

        Waveform::new(first.channels(), first.sample_rate(), samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mono(samples: &[f32]) -> Waveform {
        Waveform::new(1, 8000, samples.to_vec()).unwrap()
    }

    #[test]
    fn test_weighted_sum() {
        let mixer = Mixer::new(vec![mono(&[0.5, 0.5]), mono(&[0.2, -0.2])]).unwrap();
        let mixed = mixer.mix(&[0.5, 1.0]).unwrap();
        assert_relative_eq!(mixed.samples()[0], 0.45, epsilon = 1e-6);
        assert_relative_eq!(mixed.samples()[1], 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_shorter_sources_are_padded() {
        let mixer = Mixer::new(vec![mono(&[0.1]), mono(&[0.1, 0.2, 0.3])]).unwrap();
        let mixed = mixer.mix(&[1.0, 1.0]).unwrap();
        assert_eq!(mixed.frames(), 3);
        assert_relative_eq!(mixed.samples()[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(mixed.samples()[2], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_loud_mix_is_normalized() {
        let mixer = Mixer::new(vec![mono(&[0.8, -0.4]), mono(&[0.8, 0.0])]).unwrap();
        let mixed = mixer.mix(&[1.0, 1.0]).unwrap();
        assert_relative_eq!(mixed.peak(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(mixed.samples()[1], -0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_weights_give_silence() {
        let mixer = Mixer::new(vec![mono(&[0.3, 0.3])]).unwrap();
        let mixed = mixer.mix(&[0.0]).unwrap();
        assert_eq!(mixed.peak(), 0.0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(Mixer::new(vec![]), Err(AudioError::NoSources)));

        let stereo = Waveform::new(2, 8000, vec![0.0; 4]).unwrap();
        assert!(matches!(
            Mixer::new(vec![mono(&[0.0]), stereo]),
            Err(AudioError::Incompatible(_))
        ));

        let mixer = Mixer::new(vec![mono(&[0.0])]).unwrap();
        assert!(matches!(
            mixer.mix(&[0.5, 0.5]),
            Err(AudioError::Incompatible(_))
        ));
    }
}
