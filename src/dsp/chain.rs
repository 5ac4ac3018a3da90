//! Voice chain construction
//!
//! Each voice profile maps to a fixed ordered list of effects. Every chain
//! ends in the same compressor so levels stay consistent across profiles:
//!
//! - None:     compressor
//! - BrightUp: pitch ×1.35 → high shelf +6 dB @ 4 kHz → high pass 150 Hz → compressor
//! - DeepDown: pitch ×0.75 → low shelf +5 dB @ 200 Hz → low pass 3 kHz → compressor
//! - Robot:    50 Hz ring modulation, half dry → compressor

use std::fmt;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::biquad::BiquadFilter;
use super::compressor::Compressor;
use super::effect::Effect;
use super::pitch_shift::{PitchShifter, DEFAULT_DELAY_WINDOW_SECS};
use super::ring_mod::RingModulator;
use crate::error::{Result, StudioError};

/// Voice transformation applied to the recorded audio track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceProfile {
    #[default]
    None,
    BrightUp,
    DeepDown,
    Robot,
}

impl VoiceProfile {
    pub const ALL: [VoiceProfile; 4] = [
        VoiceProfile::None,
        VoiceProfile::BrightUp,
        VoiceProfile::DeepDown,
        VoiceProfile::Robot,
    ];

    /// Pitch ratio for profiles that shift pitch
    pub fn pitch_ratio(&self) -> Option<f64> {
        match self {
            VoiceProfile::BrightUp => Some(1.35),
            VoiceProfile::DeepDown => Some(0.75),
            VoiceProfile::None | VoiceProfile::Robot => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VoiceProfile::None => "Unprocessed voice, level-controlled",
            VoiceProfile::BrightUp => "Pitch up ×1.35 with added air",
            VoiceProfile::DeepDown => "Pitch down ×0.75 with warm lows",
            VoiceProfile::Robot => "50 Hz ring modulation",
        }
    }
}

impl fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoiceProfile::None => "none",
            VoiceProfile::BrightUp => "bright_up",
            VoiceProfile::DeepDown => "deep_down",
            VoiceProfile::Robot => "robot",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for VoiceProfile {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(VoiceProfile::None),
            "bright_up" | "bright" => Ok(VoiceProfile::BrightUp),
            "deep_down" | "deep" => Ok(VoiceProfile::DeepDown),
            "robot" => Ok(VoiceProfile::Robot),
            _ => Err(StudioError::invalid_parameter(
                "voice_profile",
                s,
                "none, bright_up, deep_down or robot",
            )),
        }
    }
}

/// Ordered list of effects, processed index 0 first
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    sample_rate: u32,
    max_block_size: usize,
}

impl EffectChain {
    pub fn new(sample_rate: u32, max_block_size: usize) -> Self {
        Self {
            effects: Vec::new(),
            sample_rate,
            max_block_size,
        }
    }

    /// Append an effect, preparing it for the chain's format
    pub fn push(&mut self, mut effect: Box<dyn Effect>) {
        effect.prepare(self.sample_rate, self.max_block_size);
        self.effects.push(effect);
    }

    /// Prepare all effects for processing
    pub fn prepare(&mut self, sample_rate: u32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        for effect in &mut self.effects {
            effect.prepare(sample_rate, max_block_size);
        }
    }

    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Run the block through every effect in order
    pub fn process(&mut self, block: &mut [f32]) {
        for effect in &mut self.effects {
            effect.process(block);
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }

    /// Effect type identifiers in processing order
    pub fn effect_types(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_type()).collect()
    }

    /// Chain manifest for diagnostics
    pub fn to_json(&self) -> Value {
        let effects: Vec<Value> = self
            .effects
            .iter()
            .map(|e| {
                json!({
                    "id": e.id(),
                    "type": e.effect_type(),
                    "enabled": e.is_enabled(),
                    "params": e.get_params(),
                })
            })
            .collect();

        json!({
            "effects": effects,
            "sample_rate": self.sample_rate,
            "max_block_size": self.max_block_size,
        })
    }
}

/// A built chain together with the profile it was built for
pub struct VoiceChain {
    profile: VoiceProfile,
    chain: EffectChain,
}

impl VoiceChain {
    pub fn profile(&self) -> VoiceProfile {
        self.profile
    }

    pub fn process(&mut self, block: &mut [f32]) {
        self.chain.process(block);
    }

    pub fn reset(&mut self) {
        self.chain.reset();
    }

    pub fn effects(&self) -> &EffectChain {
        &self.chain
    }
}

/// Builds a [`VoiceChain`] for a profile
#[derive(Debug, Clone)]
pub struct VoiceChainBuilder {
    sample_rate: u32,
    max_block_size: usize,
    delay_window_secs: f64,
}

impl VoiceChainBuilder {
    pub fn new(sample_rate: u32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            delay_window_secs: DEFAULT_DELAY_WINDOW_SECS,
        }
    }

    /// Override the pitch shifter's delay window
    pub fn delay_window(mut self, secs: f64) -> Self {
        self.delay_window_secs = secs;
        self
    }

    pub fn build(&self, profile: VoiceProfile) -> Result<VoiceChain> {
        let sr = self.sample_rate;
        let mut chain = EffectChain::new(sr, self.max_block_size);

        match profile {
            VoiceProfile::None => {}
            VoiceProfile::BrightUp => {
                chain.push(Box::new(self.pitch_shifter(1.35)?));
                chain.push(Box::new(BiquadFilter::high_shelf(4000.0, 6.0, sr)?));
                chain.push(Box::new(BiquadFilter::high_pass(150.0, sr)?));
            }
            VoiceProfile::DeepDown => {
                chain.push(Box::new(self.pitch_shifter(0.75)?));
                chain.push(Box::new(BiquadFilter::low_shelf(200.0, 5.0, sr)?));
                chain.push(Box::new(BiquadFilter::low_pass(3000.0, sr)?));
            }
            VoiceProfile::Robot => {
                chain.push(Box::new(RingModulator::robot(sr)?));
            }
        }
        chain.push(Box::new(Compressor::new(sr)));

        info!(
            "Built {} voice chain: {}",
            profile,
            chain.effect_types().join(" → ")
        );

        Ok(VoiceChain { profile, chain })
    }

    fn pitch_shifter(&self, ratio: f64) -> Result<PitchShifter> {
        PitchShifter::with_window(
            ratio,
            self.delay_window_secs,
            self.sample_rate,
            self.max_block_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(VoiceProfile::None => vec!["compressor"])]
    #[test_case(VoiceProfile::BrightUp => vec!["pitch_shift", "biquad", "biquad", "compressor"])]
    #[test_case(VoiceProfile::DeepDown => vec!["pitch_shift", "biquad", "biquad", "compressor"])]
    #[test_case(VoiceProfile::Robot => vec!["ring_mod", "compressor"])]
    fn test_chain_layout(profile: VoiceProfile) -> Vec<&'static str> {
        use pretty_assertions::assert_eq;
        let chain = VoiceChainBuilder::new(48000, 4096).build(profile).unwrap();
        assert_eq!(chain.profile(), profile);
        chain.effects().effect_types()
    }

    #[test]
    fn test_profile_parsing() {
        use pretty_assertions::assert_eq;
        for profile in VoiceProfile::ALL {
            assert_eq!(profile.to_string().parse::<VoiceProfile>().unwrap(), profile);
        }
        assert_eq!("bright-up".parse::<VoiceProfile>().unwrap(), VoiceProfile::BrightUp);
        assert!("choir".parse::<VoiceProfile>().is_err());
    }

    #[test]
    fn test_bad_window_rejected() {
        let result = VoiceChainBuilder::new(48000, 512)
            .delay_window(0.0)
            .build(VoiceProfile::DeepDown);
        assert!(result.is_err());
    }

    #[test]
    fn test_block_length_preserved() {
        use pretty_assertions::assert_eq;
        for profile in VoiceProfile::ALL {
            let mut chain = VoiceChainBuilder::new(48000, 1024).build(profile).unwrap();
            let mut block = vec![0.1_f32; 1024];
            chain.process(&mut block);
            assert_eq!(block.len(), 1024);
            assert!(block.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_manifest_lists_effects() {
        use pretty_assertions::assert_eq;
        let chain = VoiceChainBuilder::new(48000, 512)
            .build(VoiceProfile::BrightUp)
            .unwrap();
        let manifest = chain.effects().to_json();
        assert_eq!(manifest["effects"].as_array().map(|a| a.len()), Some(4));
        assert_eq!(manifest["effects"][0]["params"]["pitch_ratio"], 1.35);
    }
}
