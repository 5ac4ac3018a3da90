//! Audio feature extraction driving the avatar

mod loudness;

pub use loudness::{LoudnessExtractor, DEFAULT_ANALYSIS_SIZE, MAX_DECIBELS, MIN_DECIBELS};
