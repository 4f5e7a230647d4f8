//! In-memory audio

use crate::error::AudioError;

/// Interleaved floating-point audio in `[-1, 1]`
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Waveform {
    /// Create a waveform from interleaved samples
    ///
    /// The sample count must be a whole number of frames.
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Result<Self, AudioError> {
        if channels == 0 || sample_rate == 0 {
            return Err(AudioError::Incompatible(format!(
                "{} channels at {} Hz",
                channels, sample_rate
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::Incompatible(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
            samples,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Same channel layout and sample rate
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.channels == other.channels && self.sample_rate == other.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frames_and_duration() {
        let wave = Waveform::new(2, 44100, vec![0.0; 44100]).unwrap();
        assert_eq!(wave.frames(), 22050);
        assert_eq!(wave.samples().len(), 44100);
        assert_relative_eq!(wave.duration_secs(), 0.5);
    }

    #[test]
    fn test_rejects_partial_frames() {
        assert!(Waveform::new(2, 44100, vec![0.0; 3]).is_err());
        assert!(Waveform::new(0, 44100, vec![]).is_err());
        assert!(Waveform::new(1, 0, vec![0.0]).is_err());
    }

    #[test]
    fn test_peak() {
        let wave = Waveform::new(1, 8000, vec![0.1, -0.7, 0.4]).unwrap();
        assert_relative_eq!(wave.peak(), 0.7);
    }

    #[test]
    fn test_compatibility() {
        let a = Waveform::new(2, 44100, vec![0.0; 2]).unwrap();
        let b = Waveform::new(2, 48000, vec![0.0; 2]).unwrap();
        let c = Waveform::new(2, 44100, vec![0.0; 20]).unwrap();
        assert!(!a.is_compatible(&b));
        assert!(a.is_compatible(&c));
    }
}
