//! WAV file I/O
//!
//! Integer PCM is mapped to floats by dividing by `2^(bits - 1)` and back
//! by multiplying with `2^(bits - 1) - 1`, so full scale never overflows.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::waveform::Waveform;
use crate::error::AudioError;

/// PCM depth used when writing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDepth {
    /// Two-byte samples
    #[default]
    Int16,
    /// Four-byte samples
    Int32,
}

impl SampleDepth {
    pub fn bits(&self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Int32 => 32,
        }
    }

    fn scale(bits: u16) -> f64 {
        2f64.powi(i32::from(bits) - 1)
    }

    /// Float sample to integer PCM
    pub fn quantize(&self, sample: f32) -> i32 {
        let max = Self::scale(self.bits()) - 1.0;
        let value = f64::from(sample.clamp(-1.0, 1.0)) * max;
        value.round() as i32
    }

    /// Integer PCM of this depth to float
    pub fn dequantize(&self, value: i32) -> f32 {
        (f64::from(value) / Self::scale(self.bits())) as f32
    }
}

/// Read a WAV file into a waveform
///
/// Integer files of any depth and 32-bit float files are accepted.
pub fn read_wav(path: impl AsRef<Path>) -> Result<Waveform, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let scale = SampleDepth::scale(spec.bits_per_sample);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (f64::from(v) / scale) as f32))
                .collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
    };

    Waveform::new(spec.channels, spec.sample_rate, samples)
}

/// Write a waveform as integer PCM
pub fn write_wav(
    path: impl AsRef<Path>,
    wave: &Waveform,
    depth: SampleDepth,
) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: wave.channels(),
        sample_rate: wave.sample_rate(),
        bits_per_sample: depth.bits(),
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in wave.samples() {
        let value = depth.quantize(sample);
        match depth {
            SampleDepth::Int16 => writer.write_sample(value as i16)?,
            SampleDepth::Int32 => writer.write_sample(value)?,
        }
    }
    writer.finalize()?;
    Ok(())
}
