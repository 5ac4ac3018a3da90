//! Granular pitch shifter
//!
//! Two read heads sweep a single circular delay line, half a phase cycle
//! apart. Each head's delay is `phase × window`; as the phase ramps the read
//! head moves at `pitch_ratio` times the write speed, which shifts pitch
//! without changing duration. A triangular crossfade hands over between the
//! heads so the one jumping across the window boundary is always silent.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectParams};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Default delay window (60ms)
pub const DEFAULT_DELAY_WINDOW_SECS: f64 = 0.060;

/// Triangular crossfade gain for a grain at `phase` in [0, 1)
///
/// Peaks at 0.5 and vanishes at the window boundary. The partner head at
/// `phase + 0.5` gets `1 - crossfade_gain(phase)`, which equals
/// `crossfade_gain((phase + 0.5) % 1.0)`.
#[inline]
pub fn crossfade_gain(phase: f64) -> f64 {
    if phase <= 0.5 {
        phase * 2.0
    } else {
        (1.0 - phase) * 2.0
    }
}

/// Dual delay-line pitch shifter
#[derive(Debug, Clone)]
pub struct PitchShifter {
    params: EffectParams,
    pitch_ratio: f64,
    window_secs: f64,
    sample_rate: u32,
    /// Circular delay line
    buffer: Vec<f32>,
    /// Next slot to write, always < buffer.len()
    write_index: usize,
    /// Phase accumulator in [0, 1)
    phase: f64,
    /// Per-sample phase increment: (1 - ratio) / window / sample_rate
    phase_increment: f64,
    /// Window length in samples
    window_samples: f64,
}

impl PitchShifter {
    /// Create a pitch shifter with the default 60ms window
    ///
    /// # Errors
    /// `Configuration` if the ratio is not a finite value greater than zero.
    pub fn new(pitch_ratio: f64, sample_rate: u32, max_block_size: usize) -> Result<Self> {
        Self::with_window(
            pitch_ratio,
            DEFAULT_DELAY_WINDOW_SECS,
            sample_rate,
            max_block_size,
        )
    }

    /// Create a pitch shifter with a custom delay window
    ///
    /// Shorter windows raise the grain rate (more artifacts); longer windows
    /// add latency.
    pub fn with_window(
        pitch_ratio: f64,
        window_secs: f64,
        sample_rate: u32,
        max_block_size: usize,
    ) -> Result<Self> {
        if !pitch_ratio.is_finite() || pitch_ratio <= 0.0 {
            return Err(StudioError::Configuration {
                reason: format!("pitch ratio must be greater than zero, got {}", pitch_ratio),
            });
        }
        if !window_secs.is_finite() || window_secs <= 0.0 {
            return Err(StudioError::invalid_parameter(
                "delay_window",
                window_secs,
                "a positive duration in seconds",
            ));
        }
        if sample_rate == 0 {
            return Err(StudioError::invalid_parameter(
                "sample_rate",
                sample_rate,
                "a positive rate in Hz",
            ));
        }

        let mut shifter = Self {
            params: EffectParams::default(),
            pitch_ratio,
            window_secs,
            sample_rate,
            buffer: Vec::new(),
            write_index: 0,
            phase: 0.0,
            phase_increment: 0.0,
            window_samples: 0.0,
        };
        shifter.prepare(sample_rate, max_block_size);
        Ok(shifter)
    }

    pub fn pitch_ratio(&self) -> f64 {
        self.pitch_ratio
    }

    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }

    /// Current phase accumulator value
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Length of the circular delay line in samples
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Unity ratio leaves the phase frozen; output is the input untouched
    fn is_passthrough(&self) -> bool {
        self.pitch_ratio == 1.0
    }

    /// Linear-interpolated read `delay` samples behind the write head
    #[inline]
    fn read_delayed(&self, delay: f64) -> f32 {
        let len = self.buffer.len() as f64;
        let position = (self.write_index as f64 - delay).rem_euclid(len);
        let index = (position.floor() as usize).min(self.buffer.len() - 1);
        let frac = (position - index as f64) as f32;
        let next = (index + 1) % self.buffer.len();
        self.buffer[index] * (1.0 - frac) + self.buffer[next] * frac
    }
}

impl Effect for PitchShifter {
    fn process(&mut self, block: &mut [f32]) {
        if self.buffer.is_empty() {
            return;
        }
        let passthrough = self.is_passthrough() || !self.params.enabled;
        let len = self.buffer.len();

        for sample in block.iter_mut() {
            let input = *sample;
            self.buffer[self.write_index] = input;

            if !passthrough {
                let p1 = self.phase;
                let p2 = (self.phase + 0.5) % 1.0;

                let s1 = self.read_delayed(p1 * self.window_samples);
                let s2 = self.read_delayed(p2 * self.window_samples);

                let gain1 = crossfade_gain(p1);
                let gain2 = 1.0 - gain1;
                *sample = (s1 as f64 * gain1 + s2 as f64 * gain2) as f32;

                let next = (self.phase + self.phase_increment).rem_euclid(1.0);
                // A step smaller than the spacing of f64 below 1.0 rounds onto 1.0
                self.phase = if next < 1.0 { next } else { 0.0 };
            }

            self.write_index += 1;
            if self.write_index >= len {
                self.write_index = 0;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.window_samples = self.window_secs * sample_rate as f64;
        self.phase_increment =
            (1.0 - self.pitch_ratio) / self.window_secs / sample_rate as f64;

        let required = (self.window_samples.ceil() as usize + max_block_size) * 2;
        if self.buffer.len() != required {
            self.buffer = vec![0.0; required];
            self.write_index = 0;
        }
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_index = 0;
        self.phase = 0.0;
    }

    fn get_params(&self) -> Value {
        json!({
            "pitch_ratio": self.pitch_ratio,
            "window_ms": self.window_secs * 1000.0,
        })
    }

    impl_effect_common!(PitchShifter, "pitch_shift", "Pitch Shifter");
}
