//! Avatar animation
//!
//! Input events write `InputState` and the camera; the audio callback writes
//! loudness; the frame tick derives `AvatarState` from both.

mod blink;
mod engine;
mod state;

pub use blink::{BlinkTimer, BLINK_DURATION_MS, BLINK_PERIOD_MS};
pub use engine::{AnimationEngine, EYE_FOLLOW_RATE};
pub use state::{
    AvatarState, CameraTransform, DragState, InputState, KeySide, MAX_SCALE, MIN_SCALE,
    WHEEL_SENSITIVITY, ZOOM_STEP,
};
