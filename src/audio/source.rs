//! Audio input sources
//!
//! The live microphone is an external device; these stand-ins implement the
//! same contract so the pipeline can be driven from a tone or a WAV file.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::debug;

use crate::error::{Result, StudioError};

/// A microphone-like sample source
pub trait AudioSource {
    /// Ask for access to the device. Denial is final for this attempt.
    fn request_permission(&mut self) -> Result<()>;

    /// Device sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Fill `out` with the next samples; returns how many were written.
    ///
    /// A live device never runs dry, so implementations pad with silence
    /// rather than return short.
    fn read_block(&mut self, out: &mut [f32]) -> usize;
}

/// Sine tone generator
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    phase: f64,
    permission_granted: bool,
    deny_permission: bool,
}

impl ToneSource {
    pub fn new(frequency: f32, amplitude: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            amplitude: amplitude.clamp(0.0, 1.0),
            sample_rate,
            phase: 0.0,
            permission_granted: false,
            deny_permission: false,
        }
    }

    /// A source whose permission request always fails
    pub fn denied(sample_rate: u32) -> Self {
        Self {
            deny_permission: true,
            ..Self::new(0.0, 0.0, sample_rate)
        }
    }
}

impl AudioSource for ToneSource {
    fn request_permission(&mut self) -> Result<()> {
        if self.deny_permission {
            return Err(StudioError::PermissionDenied {
                device: "microphone".to_string(),
            });
        }
        self.permission_granted = true;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_block(&mut self, out: &mut [f32]) -> usize {
        if !self.permission_granted {
            out.fill(0.0);
            return out.len();
        }
        let increment = self.frequency as f64 / self.sample_rate as f64;
        for sample in out.iter_mut() {
            *sample = self.amplitude * (2.0 * std::f64::consts::PI * self.phase).sin() as f32;
            self.phase = (self.phase + increment).fract();
        }
        out.len()
    }
}

/// Plays a WAV file as if it were the microphone
///
/// Stereo files are mixed down to mono. Once the file is exhausted the
/// source keeps delivering silence.
#[derive(Debug, Clone)]
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 || channels > 2 {
            return Err(StudioError::Configuration {
                reason: format!("{}-channel audio (only mono/stereo supported)", channels),
            });
        }

        let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
        let samples = if channels == 2 {
            interleaved
                .chunks_exact(2)
                .map(|frame| (frame[0] + frame[1]) * 0.5)
                .collect()
        } else {
            interleaved
        };

        debug!(
            "Opened {} ({} samples @ {} Hz)",
            path.display(),
            samples.len(),
            spec.sample_rate
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            cursor: 0,
        })
    }

    /// Duration of the file content in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

impl AudioSource for WavSource {
    fn request_permission(&mut self) -> Result<()> {
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_block(&mut self, out: &mut [f32]) -> usize {
        let available = self.samples.len().saturating_sub(self.cursor);
        let count = available.min(out.len());
        out[..count].copy_from_slice(&self.samples[self.cursor..self.cursor + count]);
        out[count..].fill(0.0);
        self.cursor += count;
        out.len()
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples: Vec<f32> = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<_, _>>()?,
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<_, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<_, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<_, _>>()?,
            _ => {
                return Err(StudioError::Configuration {
                    reason: format!("{}-bit integer audio", bits_per_sample),
                })
            }
        },
    };
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_tone_requires_permission() {
        let mut tone = ToneSource::new(440.0, 0.8, 48000);
        let mut block = [1.0_f32; 64];
        tone.read_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));

        tone.request_permission().unwrap();
        tone.read_block(&mut block);
        assert!(block.iter().any(|&s| s != 0.0));
        assert!(block.iter().all(|&s| s.abs() <= 0.8));
    }

    #[test]
    fn test_denied_source() {
        let mut source = ToneSource::denied(48000);
        let err = source.request_permission().unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }

    #[test]
    fn test_wav_source_mixes_down_and_pads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..3 {
            writer.write_sample(16384_i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = WavSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), 16000);
        let mut block = [9.0_f32; 5];
        assert_eq!(source.read_block(&mut block), 5);
        assert_eq!(block, [0.25, 0.25, 0.25, 0.0, 0.0]);
        assert!(source.is_exhausted());
    }
}
