//! Ring modulator
//!
//! Multiplies the voice by a low sine carrier and mixes the result back with
//! the dry signal. At 50 Hz this gives the metallic "robot" timbre.

use serde_json::{json, Value};
use std::f64::consts::TAU;

use crate::dsp::effect::{Effect, EffectParams};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Carrier frequency of the robot voice
pub const ROBOT_CARRIER_HZ: f32 = 50.0;

/// Sine-carrier ring modulator with dry/wet mix
#[derive(Debug, Clone)]
pub struct RingModulator {
    params: EffectParams,
    carrier_hz: f32,
    dry_gain: f32,
    wet_gain: f32,
    sample_rate: u32,
    /// Carrier phase in cycles, [0, 1)
    phase: f64,
    increment: f64,
}

impl RingModulator {
    pub fn new(carrier_hz: f32, dry_gain: f32, wet_gain: f32, sample_rate: u32) -> Result<Self> {
        if !(carrier_hz > 0.0 && carrier_hz < sample_rate as f32 / 2.0) {
            return Err(StudioError::invalid_parameter(
                "carrier_hz",
                carrier_hz,
                "between 0 Hz and Nyquist",
            ));
        }
        for (name, gain) in [("dry_gain", dry_gain), ("wet_gain", wet_gain)] {
            if !(0.0..=1.0).contains(&gain) {
                return Err(StudioError::invalid_parameter(name, gain, "0.0 to 1.0"));
            }
        }

        let mut ring = Self {
            params: EffectParams::default(),
            carrier_hz,
            dry_gain,
            wet_gain,
            sample_rate,
            phase: 0.0,
            increment: 0.0,
        };
        ring.prepare(sample_rate, 0);
        Ok(ring)
    }

    /// 50 Hz carrier, equal dry and modulated parts
    pub fn robot(sample_rate: u32) -> Result<Self> {
        Self::new(ROBOT_CARRIER_HZ, 0.5, 0.5, sample_rate)
    }

    pub fn carrier_hz(&self) -> f32 {
        self.carrier_hz
    }
}

impl Effect for RingModulator {
    fn process(&mut self, block: &mut [f32]) {
        if !self.params.enabled {
            return;
        }
        for sample in block.iter_mut() {
            let carrier = (TAU * self.phase).sin() as f32;
            let dry = *sample;
            *sample = dry * self.dry_gain + dry * carrier * self.wet_gain;

            self.phase += self.increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.increment = self.carrier_hz as f64 / sample_rate as f64;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn get_params(&self) -> Value {
        json!({
            "carrier_hz": self.carrier_hz,
            "dry_gain": self.dry_gain,
            "wet_gain": self.wet_gain,
        })
    }

    impl_effect_common!(RingModulator, "ring_mod", "Ring Modulator");
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rejects_carrier_above_nyquist() {
        assert!(RingModulator::new(30000.0, 0.5, 0.5, 48000).is_err());
        assert!(RingModulator::new(50.0, 1.5, 0.5, 48000).is_err());
    }

    #[test]
    fn test_robot_follows_carrier_envelope() {
        let mut ring = RingModulator::robot(48000).unwrap();
        let mut block = vec![1.0_f32; 960];
        ring.process(&mut block);

        // Quarter period of 50 Hz is 240 samples: carrier peak
        assert_abs_diff_eq!(block[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(block[240], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(block[720], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_reset_restarts_carrier() {
        let mut ring = RingModulator::robot(48000).unwrap();
        let mut block = vec![1.0_f32; 100];
        ring.process(&mut block);
        ring.reset();
        let mut again = vec![1.0_f32; 1];
        ring.process(&mut again);
        assert_abs_diff_eq!(again[0], 0.5, epsilon = 1e-6);
    }
}
