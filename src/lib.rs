//! Chalkcast - real-time voice transformation, avatar animation and recording
//!
//! Live microphone audio feeds two paths:
//! 1. Loudness analysis drives a procedurally animated classroom avatar that
//!    is redrawn every display tick
//! 2. A voice chain (pitch shift, filters, compressor) produces the audio track
//!
//! Both tracks are composed into timestamped segments and collected into one
//! artifact per recording session. While recording, the raw microphone audio
//! is also forwarded to an optional conversational collaborator.
//!
//! # Architecture
//!
//! - [`audio`]: block framing, PCM conversion, input sources
//! - [`dsp`]: effects and voice chains
//! - [`analysis`]: spectral loudness
//! - [`animation`]: avatar state derivation
//! - [`render`]: software renderer
//! - [`recorder`]: codec negotiation, composition, sessions
//! - [`collaborator`]: AI collaborator link and transcript
//! - [`pipeline`] and [`scheduler`]: per-session wiring and the callback timeline

pub mod analysis;
pub mod animation;
pub mod audio;
pub mod cli;
pub mod collaborator;
pub mod config;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod recorder;
pub mod render;
pub mod scheduler;

pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use pipeline::{AppState, StudioPipeline};
