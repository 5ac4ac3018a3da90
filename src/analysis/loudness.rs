//! Spectral loudness for lip-sync
//!
//! Blackman-windowed FFT over the most recent samples, mapped to a byte-scale
//! spectrum the same way a browser analyser node reports it, then averaged
//! into a single [0, 1] value.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{Result, StudioError};

/// Default analysis size (FFT points)
pub const DEFAULT_ANALYSIS_SIZE: usize = 512;

/// Lower end of the dB range mapped to 0
pub const MIN_DECIBELS: f32 = -100.0;

/// Upper end of the dB range mapped to 1
pub const MAX_DECIBELS: f32 = -30.0;

/// Loudness extractor with pre-planned FFT and pre-allocated scratch
pub struct LoudnessExtractor {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    /// Ring of the most recent `size` samples
    history: Vec<f32>,
    /// Next write slot in `history`
    cursor: usize,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Byte-scale magnitude per positive bin
    bins: Vec<u8>,
}

impl LoudnessExtractor {
    /// Create an extractor for a power-of-two analysis size
    pub fn new(size: usize) -> Result<Self> {
        if size < 32 || !size.is_power_of_two() {
            return Err(StudioError::invalid_parameter(
                "analysis_size",
                size,
                "a power of two, at least 32",
            ));
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            size,
            fft,
            history: vec![0.0; size],
            cursor: 0,
            window: blackman_window(size),
            spectrum: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            bins: vec![0; size / 2],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Feed new samples; only the latest `size` are kept
    pub fn push_samples(&mut self, samples: &[f32]) {
        let tail = if samples.len() > self.size {
            &samples[samples.len() - self.size..]
        } else {
            samples
        };
        for &sample in tail {
            self.history[self.cursor] = sample;
            self.cursor = (self.cursor + 1) % self.size;
        }
    }

    /// Compute loudness in [0, 1] from the current history
    pub fn loudness(&mut self) -> f32 {
        // Oldest sample sits at `cursor`
        for i in 0..self.size {
            let sample = self.history[(self.cursor + i) % self.size];
            self.spectrum[i] = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let range = MAX_DECIBELS - MIN_DECIBELS;
        let norm = 1.0 / self.size as f32;
        let mut sum: u32 = 0;
        for (bin, value) in self.bins.iter_mut().zip(self.spectrum.iter()) {
            let magnitude = value.norm() * norm;
            let db = if magnitude > 0.0 {
                20.0 * magnitude.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 / range * (db - MIN_DECIBELS);
            *bin = scaled.clamp(0.0, 255.0) as u8;
            sum += *bin as u32;
        }

        sum as f32 / self.bins.len() as f32 / 255.0
    }

    /// Byte-scale spectrum from the last `loudness` call
    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.cursor = 0;
        self.bins.fill(0);
    }
}

/// Blackman window (a0 = 0.42, a1 = 0.5, a2 = 0.08)
fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / n;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (std::f32::consts::TAU * 1000.0 * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn test_rejects_odd_sizes() {
        assert!(LoudnessExtractor::new(500).is_err());
        assert!(LoudnessExtractor::new(16).is_err());
        assert_eq!(LoudnessExtractor::new(512).unwrap().bins().len(), 256);
    }

    #[test]
    fn test_silence_is_zero() {
        let mut extractor = LoudnessExtractor::new(512).unwrap();
        extractor.push_samples(&[0.0; 1024]);
        assert_eq!(extractor.loudness(), 0.0);
    }

    #[test]
    fn test_louder_input_reads_higher() {
        let mut extractor = LoudnessExtractor::new(512).unwrap();
        extractor.push_samples(&tone(0.01, 512));
        let quiet = extractor.loudness();
        extractor.push_samples(&tone(0.8, 512));
        let loud = extractor.loudness();
        assert!(loud > quiet, "loud {} quiet {}", loud, quiet);
        assert!((0.0..=1.0).contains(&loud));
    }

    #[test]
    fn test_no_smoothing_between_calls() {
        let mut extractor = LoudnessExtractor::new(512).unwrap();
        extractor.push_samples(&tone(0.8, 512));
        assert!(extractor.loudness() > 0.0);
        extractor.push_samples(&[0.0; 512]);
        assert_eq!(extractor.loudness(), 0.0);
    }

    #[test]
    fn test_window_tapers_to_zero() {
        let window = blackman_window(512);
        assert!(window[0].abs() < 1e-6);
        assert!((window[256] - 1.0).abs() < 1e-5);
    }
}
