//! Biquad filters
//!
//! Shelf and pass filters used to color the pitch-shifted voice. Coefficients
//! follow the Audio EQ Cookbook.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f64::consts::PI;

use crate::dsp::effect::{Effect, EffectParams};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Q giving a shelf slope of 1 (maximally steep without overshoot)
pub const SHELF_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Default resonance for pass filters (1 dB, as linear Q)
pub const PASS_Q: f32 = 1.122_018_5;

/// Filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Boost/cut below frequency
    LowShelf,
    /// Boost/cut above frequency
    HighShelf,
    /// Remove above frequency
    LowPass,
    /// Remove below frequency
    HighPass,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Calculate biquad coefficients using Audio EQ Cookbook formulas
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    pub fn calculate(
        filter_type: FilterType,
        sample_rate: f64,
        frequency: f64,
        gain_db: f64,
        q: f64,
    ) -> Self {
        // Clamp frequency to valid range (below Nyquist)
        let freq = frequency.clamp(20.0, sample_rate / 2.0 - 1.0);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);
        let a = (10.0_f64).powf(gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `frequency`, in dB
    pub fn magnitude_db(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        let num = (num_re * num_re + num_im * num_im).sqrt();
        let den = (den_re * den_re + den_im * den_im).sqrt();
        20.0 * (num / den).log10()
    }
}

/// Biquad filter state
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Direct Form I
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Single biquad filter node
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    params: EffectParams,
    filter_type: FilterType,
    /// Corner frequency in Hz
    frequency: f32,
    /// Shelf gain in dB (ignored by pass filters)
    gain_db: f32,
    q: f32,
    sample_rate: u32,
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl BiquadFilter {
    pub fn new(
        filter_type: FilterType,
        frequency: f32,
        gain_db: f32,
        q: f32,
        sample_rate: u32,
    ) -> Result<Self> {
        if !(20.0..=20000.0).contains(&frequency) {
            return Err(StudioError::invalid_parameter(
                "frequency",
                frequency,
                "20-20000 Hz",
            ));
        }
        if !(-24.0..=24.0).contains(&gain_db) {
            return Err(StudioError::invalid_parameter(
                "gain_db",
                gain_db,
                "-24 to +24 dB",
            ));
        }
        if !(0.1..=10.0).contains(&q) {
            return Err(StudioError::invalid_parameter("q", q, "0.1 to 10.0"));
        }

        let mut filter = Self {
            params: EffectParams::default(),
            filter_type,
            frequency,
            gain_db,
            q,
            sample_rate,
            coeffs: BiquadCoeffs::default(),
            state: BiquadState::default(),
        };
        filter.update_coefficients();
        Ok(filter)
    }

    pub fn low_shelf(frequency: f32, gain_db: f32, sample_rate: u32) -> Result<Self> {
        Self::new(FilterType::LowShelf, frequency, gain_db, SHELF_Q, sample_rate)
    }

    pub fn high_shelf(frequency: f32, gain_db: f32, sample_rate: u32) -> Result<Self> {
        Self::new(FilterType::HighShelf, frequency, gain_db, SHELF_Q, sample_rate)
    }

    pub fn low_pass(frequency: f32, sample_rate: u32) -> Result<Self> {
        Self::new(FilterType::LowPass, frequency, 0.0, PASS_Q, sample_rate)
    }

    pub fn high_pass(frequency: f32, sample_rate: u32) -> Result<Self> {
        Self::new(FilterType::HighPass, frequency, 0.0, PASS_Q, sample_rate)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    fn update_coefficients(&mut self) {
        self.coeffs = BiquadCoeffs::calculate(
            self.filter_type,
            self.sample_rate as f64,
            self.frequency as f64,
            self.gain_db as f64,
            self.q as f64,
        );
    }
}

impl Effect for BiquadFilter {
    fn process(&mut self, block: &mut [f32]) {
        if !self.params.enabled {
            return;
        }
        for sample in block.iter_mut() {
            *sample = self.state.process(*sample as f64, &self.coeffs) as f32;
        }
    }

    fn prepare(&mut self, sample_rate: u32, _max_block_size: usize) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.update_coefficients();
            self.state.reset();
        }
    }

    fn reset(&mut self) {
        self.state.reset();
    }

    fn get_params(&self) -> Value {
        json!({
            "filter_type": self.filter_type,
            "frequency": self.frequency,
            "gain_db": self.gain_db,
            "q": self.q,
        })
    }

    impl_effect_common!(BiquadFilter, "biquad", "Biquad Filter");
}
