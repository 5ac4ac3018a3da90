//! Compressor effect
//!
//! Feed-forward dynamics processor closing every voice chain. Peak detection,
//! soft-knee gain computer and one-pole attack/release smoothing on the gain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsp::effect::{Effect, EffectParams};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Compressor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Threshold level in dB (-60 to 0 dB)
    pub threshold_db: f32,
    /// Compression ratio (1.0 to 20.0, representing 1:1 to 20:1)
    pub ratio: f32,
    /// Attack time in milliseconds (0.1 to 100 ms)
    pub attack_ms: f32,
    /// Release time in milliseconds (10 to 1000 ms)
    pub release_ms: f32,
    /// Knee width in dB (0 = hard knee, up to 40 dB)
    pub knee_db: f32,
    /// Makeup gain in dB (0 to 24 dB)
    pub makeup_gain_db: f32,
}

impl Default for CompressorParams {
    /// Voice-chain terminus: -24 dB, 12:1, 30 dB knee, 3 ms / 250 ms
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            ratio: 12.0,
            attack_ms: 3.0,
            release_ms: 250.0,
            knee_db: 30.0,
            makeup_gain_db: 0.0,
        }
    }
}

impl CompressorParams {
    /// Validate parameters against their ranges
    pub fn validate(&self) -> Result<()> {
        if !(-60.0..=0.0).contains(&self.threshold_db) {
            return Err(StudioError::invalid_parameter(
                "threshold_db",
                self.threshold_db,
                "-60 to 0 dB",
            ));
        }
        if !(1.0..=20.0).contains(&self.ratio) {
            return Err(StudioError::invalid_parameter(
                "ratio",
                self.ratio,
                "1.0 to 20.0",
            ));
        }
        if !(0.1..=100.0).contains(&self.attack_ms) {
            return Err(StudioError::invalid_parameter(
                "attack_ms",
                self.attack_ms,
                "0.1 to 100 ms",
            ));
        }
        if !(10.0..=1000.0).contains(&self.release_ms) {
            return Err(StudioError::invalid_parameter(
                "release_ms",
                self.release_ms,
                "10 to 1000 ms",
            ));
        }
        if !(0.0..=40.0).contains(&self.knee_db) {
            return Err(StudioError::invalid_parameter(
                "knee_db",
                self.knee_db,
                "0 to 40 dB",
            ));
        }
        if !(0.0..=24.0).contains(&self.makeup_gain_db) {
            return Err(StudioError::invalid_parameter(
                "makeup_gain_db",
                self.makeup_gain_db,
                "0 to 24 dB",
            ));
        }
        Ok(())
    }

    /// Clamp parameters to valid ranges
    pub fn clamp(&mut self) {
        self.threshold_db = self.threshold_db.clamp(-60.0, 0.0);
        self.ratio = self.ratio.clamp(1.0, 20.0);
        self.attack_ms = self.attack_ms.clamp(0.1, 100.0);
        self.release_ms = self.release_ms.clamp(10.0, 1000.0);
        self.knee_db = self.knee_db.clamp(0.0, 40.0);
        self.makeup_gain_db = self.makeup_gain_db.clamp(0.0, 24.0);
    }
}

/// Mono compressor
#[derive(Debug, Clone)]
pub struct Compressor {
    params: EffectParams,
    settings: CompressorParams,
    sample_rate: u32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Current gain (linear, 1.0 = no reduction)
    gain: f32,
}

impl Compressor {
    /// Compressor with the voice-chain defaults
    pub fn new(sample_rate: u32) -> Self {
        let mut comp = Self {
            params: EffectParams::default(),
            settings: CompressorParams::default(),
            sample_rate,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            gain: 1.0,
        };
        comp.update_coefficients();
        comp
    }

    /// Create a compressor with custom settings; out-of-range values are clamped
    pub fn with_settings(settings: CompressorParams, sample_rate: u32) -> Self {
        let mut comp = Self::new(sample_rate);
        comp.set_settings(settings);
        comp
    }

    pub fn settings(&self) -> &CompressorParams {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CompressorParams) {
        self.settings = settings;
        self.settings.clamp();
        self.update_coefficients();
    }

    /// Current gain reduction in dB for metering (0 or negative)
    pub fn gain_reduction_db(&self) -> f32 {
        linear_to_db(self.gain)
    }

    fn update_coefficients(&mut self) {
        // coeff = exp(-1 / time_in_samples)
        let attack_samples = (self.settings.attack_ms / 1000.0) * self.sample_rate as f32;
        let release_samples = (self.settings.release_ms / 1000.0) * self.sample_rate as f32;

        self.attack_coeff = if attack_samples > 0.0 {
            (-1.0 / attack_samples).exp()
        } else {
            0.0
        };
        self.release_coeff = if release_samples > 0.0 {
            (-1.0 / release_samples).exp()
        } else {
            0.0
        };
    }

    /// Gain reduction in dB (zero or negative) for an input level in dB
    pub fn compute_gain_reduction_db(&self, input_db: f32) -> f32 {
        let threshold = self.settings.threshold_db;
        let ratio = self.settings.ratio;
        let knee = self.settings.knee_db;

        if knee > 0.0 {
            let knee_start = threshold - knee / 2.0;
            let knee_end = threshold + knee / 2.0;

            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (threshold + (input_db - threshold) / ratio) - input_db
            } else {
                // Quadratic knee: slope runs from 1:1 at knee_start to 1:ratio at knee_end
                let over = input_db - knee_start;
                (1.0 / ratio - 1.0) * over * over / (2.0 * knee)
            }
        } else if input_db <= threshold {
            0.0
        } else {
            (threshold + (input_db - threshold) / ratio) - input_db
        }
    }
}

/// Convert linear amplitude to dB, floored at -96 dB
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        (20.0 * linear.log10()).max(-96.0)
    } else {
        -96.0
    }
}

/// Convert dB to linear amplitude
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

impl Effect for Compressor {
    fn process(&mut self, block: &mut [f32]) {
        if !self.params.enabled {
            return;
        }
        let makeup = db_to_linear(self.settings.makeup_gain_db);

        for sample in block.iter_mut() {
            let input_db = linear_to_db(sample.abs());
            let target = db_to_linear(self.compute_gain_reduction_db(input_db));

            let coeff = if target < self.gain {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.gain = coeff * self.gain + (1.0 - coeff) * target;

            *sample *= self.gain * makeup;
        }
    }

    fn prepare(&mut self, sample_rate: u32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }

    fn get_params(&self) -> Value {
        serde_json::to_value(&self.settings).unwrap_or(Value::Null)
    }

    impl_effect_common!(Compressor, "compressor", "Compressor");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect()
    }

    fn peak(block: &[f32]) -> f32 {
        block.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_default_settings_match_voice_terminus() {
        let comp = Compressor::new(48000);
        let s = comp.settings();
        assert_eq!(s.threshold_db, -24.0);
        assert_eq!(s.ratio, 12.0);
        assert_eq!(s.knee_db, 30.0);
        assert_eq!(s.attack_ms, 3.0);
        assert_eq!(s.release_ms, 250.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_parameter_validation() {
        let mut params = CompressorParams::default();
        params.ratio = 25.0;
        assert!(params.validate().is_err());
        params.ratio = 4.0;

        params.knee_db = 45.0;
        let err = params.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_parameter_clamping() {
        let mut params = CompressorParams {
            threshold_db: -100.0,
            ratio: 50.0,
            attack_ms: 0.001,
            release_ms: 5000.0,
            knee_db: 60.0,
            makeup_gain_db: 50.0,
        };
        params.clamp();
        assert_eq!(params.threshold_db, -60.0);
        assert_eq!(params.ratio, 20.0);
        assert_eq!(params.attack_ms, 0.1);
        assert_eq!(params.release_ms, 1000.0);
        assert_eq!(params.knee_db, 40.0);
        assert_eq!(params.makeup_gain_db, 24.0);
    }

    #[test]
    fn test_gain_computer_hard_knee() {
        let comp = Compressor::with_settings(
            CompressorParams {
                threshold_db: -20.0,
                ratio: 4.0,
                knee_db: 0.0,
                ..Default::default()
            },
            48000,
        );
        assert!(comp.compute_gain_reduction_db(-30.0).abs() < 0.01);
        // 8 dB over at 4:1 → output -18, GR -6
        assert!((comp.compute_gain_reduction_db(-12.0) + 6.0).abs() < 0.01);
    }

    #[test]
    fn test_wide_knee_is_gradual() {
        let comp = Compressor::new(48000);
        // Knee spans -39..-9 dB
        assert_eq!(comp.compute_gain_reduction_db(-45.0), 0.0);
        let inside = comp.compute_gain_reduction_db(-30.0);
        assert!(inside < 0.0 && inside > -5.0, "knee GR {}", inside);
        let above = comp.compute_gain_reduction_db(0.0);
        // -24 + 24/12 = -22 → GR -22
        assert!((above + 22.0).abs() < 0.01);
    }

    #[test]
    fn test_knee_value_at_midpoint_of_lower_half() {
        let comp = Compressor::new(48000);
        // 9 dB into the knee: (1/12 - 1) * 81 / 60
        let gr = comp.compute_gain_reduction_db(-30.0);
        assert!((gr + 1.2375).abs() < 1e-4, "knee GR {}", gr);
    }

    #[test]
    fn test_transfer_curve_is_monotonic_and_continuous() {
        let comp = Compressor::new(48000);
        let output = |x: f32| x + comp.compute_gain_reduction_db(x);

        let mut previous = output(-60.0);
        let mut x = -60.0_f32;
        while x < 0.0 {
            x += 0.05;
            let y = output(x);
            assert!(y >= previous, "output fell from {} to {} at {} dB", previous, y, x);
            // Slope never exceeds 1:1 so a 0.05 dB step moves at most 0.05 dB
            assert!(y - previous <= 0.05 + 1e-4, "jump of {} at {} dB", y - previous, x);
            previous = y;
        }

        // Both knee edges meet the straight segments on either side
        for edge in [-39.0_f32, -9.0] {
            let below = output(edge - 1e-3);
            let above = output(edge + 1e-3);
            assert!((above - below).abs() < 5e-3, "gap at {} dB: {} vs {}", edge, below, above);
        }
        assert!((output(-9.0) - (-24.0 + 15.0 / 12.0)).abs() < 1e-3);
    }

    #[test]
    fn test_quiet_signal_passes() {
        let mut comp = Compressor::new(48000);
        let mut block = sine(0.005, 4800);
        let before = peak(&block);
        comp.process(&mut block);
        assert!((peak(&block) - before).abs() / before < 0.05);
    }

    #[test]
    fn test_loud_signal_is_reduced() {
        let mut comp = Compressor::new(48000);
        let mut block = sine(0.9, 9600);
        comp.process(&mut block);
        assert!(peak(&block[4800..]) < 0.5);
        assert!(comp.gain_reduction_db() < -3.0);
        assert_eq!(block.len(), 9600);
    }

    #[test]
    fn test_reset_restores_unity_gain() {
        let mut comp = Compressor::new(48000);
        let mut block = vec![0.9_f32; 2000];
        comp.process(&mut block);
        assert!(comp.gain_reduction_db() < 0.0);
        comp.reset();
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_prepare_updates_coefficients() {
        let mut comp = Compressor::new(44100);
        let attack_44k = comp.attack_coeff;
        comp.prepare(96000, 512);
        assert!(comp.attack_coeff > attack_44k);
    }

    #[test]
    fn test_db_conversions() {
        assert!(linear_to_db(1.0).abs() < 0.01);
        assert!((linear_to_db(0.1) + 20.0).abs() < 0.1);
        assert_eq!(linear_to_db(0.0), -96.0);
        assert!((db_to_linear(-6.0) - 0.501).abs() < 0.01);
    }
}
