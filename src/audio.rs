//! Waveforms returned by the voice model and the WAV file they end up in.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("invalid WAV data: {0}")]
    Decode(#[source] hound::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// Mono f32 audio in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Decode a WAV file held in memory. Multi-channel audio is averaged down to mono.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(AudioError::Decode)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(AudioError::Decode)?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(AudioError::Decode)?
            }
        };

        let channels = usize::from(spec.channels.max(1));
        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        };

        debug!(
            "Decoded {} samples at {}Hz ({} channel(s))",
            samples.len(),
            spec.sample_rate,
            spec.channels
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Write 16-bit mono PCM, replacing whatever is at `path`.
    pub fn save(&self, path: &Path) -> Result<(), AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let write_err = |source| AudioError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(write_err)?;
        for &sample in &self.samples {
            let s = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer.write_sample(s).map_err(write_err)?;
        }
        writer.finalize().map_err(write_err)
    }
}

/// Create the output folder if it does not exist yet.
pub fn ensure_output_dir(folder: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(folder).map_err(|source| ConfigError::OutputDir {
        path: folder.to_path_buf(),
        source,
    })
}
