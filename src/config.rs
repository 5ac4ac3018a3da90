//! Studio configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or `{}`) is
//! a valid configuration.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_ANALYSIS_SIZE;
use crate::audio::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
use crate::collaborator::Language;
use crate::dsp::{VoiceProfile, DEFAULT_DELAY_WINDOW_SECS};
use crate::error::{Result, StudioError};
use crate::recorder::{default_codec_preferences, CodecChoice, CodecNegotiator, DEFAULT_TIMESLICE_MS};
use crate::render::{AspectRatio, BoardText, DEFAULT_CANVAS_HEIGHT};

/// Default display tick rate
pub const DEFAULT_FPS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Device sample rate in Hz
    pub sample_rate: u32,
    /// Samples per audio callback
    pub block_size: usize,
    /// Display ticks per second
    pub fps: u32,
    /// Pitch shifter grain window
    pub delay_window_ms: f64,
    /// Loudness FFT size
    pub analysis_size: usize,
    pub canvas_height: u32,
    pub aspect_ratio: AspectRatio,
    pub voice_profile: VoiceProfile,
    pub language: Language,
    /// Container preference table, most preferred first
    pub codec_preferences: Vec<CodecChoice>,
    /// Encoder segment length
    pub timeslice_ms: u64,
    pub board_text: BoardText,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            fps: DEFAULT_FPS,
            delay_window_ms: DEFAULT_DELAY_WINDOW_SECS * 1000.0,
            analysis_size: DEFAULT_ANALYSIS_SIZE,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            aspect_ratio: AspectRatio::default(),
            voice_profile: VoiceProfile::default(),
            language: Language::default(),
            codec_preferences: default_codec_preferences(),
            timeslice_ms: DEFAULT_TIMESLICE_MS,
            board_text: BoardText::default(),
        }
    }
}

impl StudioConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: StudioConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(StudioError::invalid_parameter(
                "sample_rate",
                self.sample_rate,
                "8000 to 192000 Hz",
            ));
        }
        if !(64..=16_384).contains(&self.block_size) {
            return Err(StudioError::invalid_parameter("block_size", self.block_size, "64 to 16384"));
        }
        if !(1..=120).contains(&self.fps) {
            return Err(StudioError::invalid_parameter("fps", self.fps, "1 to 120"));
        }
        if !(self.delay_window_ms.is_finite() && (5.0..=500.0).contains(&self.delay_window_ms)) {
            return Err(StudioError::invalid_parameter(
                "delay_window_ms",
                self.delay_window_ms,
                "5 to 500 ms",
            ));
        }
        if !self.analysis_size.is_power_of_two() || self.analysis_size < 32 {
            return Err(StudioError::invalid_parameter(
                "analysis_size",
                self.analysis_size,
                "a power of two >= 32",
            ));
        }
        if !(16..=4320).contains(&self.canvas_height) {
            return Err(StudioError::invalid_parameter(
                "canvas_height",
                self.canvas_height,
                "16 to 4320",
            ));
        }
        if self.timeslice_ms == 0 {
            return Err(StudioError::invalid_parameter("timeslice_ms", self.timeslice_ms, "> 0"));
        }
        if let Some(bad) = self
            .codec_preferences
            .iter()
            .find(|c| c.mime_type.trim().is_empty() || c.extension.trim().is_empty())
        {
            return Err(StudioError::Configuration {
                reason: format!("codec preference {:?} needs a MIME type and extension", bad),
            });
        }
        Ok(())
    }

    pub fn delay_window_secs(&self) -> f64 {
        self.delay_window_ms / 1000.0
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.aspect_ratio.canvas_size(self.canvas_height)
    }

    pub fn codec_negotiator(&self) -> CodecNegotiator {
        CodecNegotiator::new(self.codec_preferences.clone())
    }
}
