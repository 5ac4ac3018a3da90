//! Audio Module
//!
//! Sample-level plumbing shared by the DSP chain and the collaborator link:
//! - Fixed-size block framing of device callbacks
//! - Float ↔ 16-bit PCM conversion and packetizing
//! - Microphone stand-ins (tone generator, WAV file)

pub mod convert;
pub mod frame;
pub mod source;

pub use convert::{
    decode_base64, encode_base64, float_to_pcm16, float_to_pcm16_into, pcm16_le_bytes_to_float,
    pcm16_to_le_bytes, PcmFramer, PcmPacket, Resampler, COLLABORATOR_SAMPLE_RATE, PCM_MIME_TYPE,
};
pub use frame::{AudioFrame, BlockFramer};
pub use source::{AudioSource, ToneSource, WavSource};

/// Default device sample rate (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default processing block size in samples
pub const DEFAULT_BLOCK_SIZE: usize = 4096;
