//! Scene description handed to the renderer each frame

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::animation::{AvatarState, CameraTransform};
use crate::error::{Result, StudioError};

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// Canvas aspect ratio
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "3:4")]
    Classic,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Classic,
        AspectRatio::Square,
    ];

    /// (width units, height units)
    pub fn ratio(&self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (9, 16),
            AspectRatio::Landscape => (16, 9),
            AspectRatio::Classic => (3, 4),
            AspectRatio::Square => (1, 1),
        }
    }

    /// Canvas size for a fixed height
    pub fn canvas_size(&self, height: u32) -> (u32, u32) {
        let (w, h) = self.ratio();
        ((height * w / h).max(1), height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.ratio();
        write!(f, "{}:{}", w, h)
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.to_string() == s.trim())
            .ok_or_else(|| StudioError::invalid_parameter("aspect_ratio", s, "9:16, 16:9, 3:4 or 1:1"))
    }
}

/// Decorative chalkboard text, one string per corner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardText {
    pub top_left: String,
    pub top_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
}

impl Default for BoardText {
    fn default() -> Self {
        Self {
            top_left: "E = mc²".to_string(),
            top_right: "1010101".to_string(),
            bottom_left: "√x".to_string(),
            bottom_right: "∑".to_string(),
        }
    }
}

/// Everything one frame depends on
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub avatar: &'a AvatarState,
    pub camera: &'a CameraTransform,
    /// Normalized pointer position, [-1, 1]²
    pub pointer: (f32, f32),
    /// Wall-clock milliseconds, drives the typing animation
    pub now_ms: u64,
    pub board_text: &'a BoardText,
    /// Latest user transcript line, if still on screen
    pub caption: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AspectRatio::Portrait => (607, 1080))]
    #[test_case(AspectRatio::Landscape => (1920, 1080))]
    #[test_case(AspectRatio::Classic => (810, 1080))]
    #[test_case(AspectRatio::Square => (1080, 1080))]
    fn test_canvas_size(ratio: AspectRatio) -> (u32, u32) {
        ratio.canvas_size(DEFAULT_CANVAS_HEIGHT)
    }

    #[test]
    fn test_ratio_round_trips_through_text() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.to_string().parse::<AspectRatio>().unwrap(), ratio);
        }
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_serde_uses_ratio_strings() {
        let json = serde_json::to_string(&AspectRatio::Landscape).unwrap();
        assert_eq!(json, "\"16:9\"");
    }
}
