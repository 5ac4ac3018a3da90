//! Voice DSP
//!
//! In-place mono effects and the per-profile chain that feeds the recorded
//! audio track. All effects implement the `Effect` trait.

mod biquad;
mod chain;
mod compressor;
mod effect;
mod pitch_shift;
mod ring_mod;

pub use biquad::{BiquadCoeffs, BiquadFilter, FilterType, PASS_Q, SHELF_Q};
pub use chain::{EffectChain, VoiceChain, VoiceChainBuilder, VoiceProfile};
pub use compressor::{db_to_linear, linear_to_db, Compressor, CompressorParams};
pub use effect::{Effect, EffectParams};
pub use pitch_shift::{crossfade_gain, PitchShifter, DEFAULT_DELAY_WINDOW_SECS};
pub use ring_mod::{RingModulator, ROBOT_CARRIER_HZ};
