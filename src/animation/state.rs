//! Animation state types
//!
//! `InputState` is written only by input events, `AvatarState` only by the
//! frame tick, and `CameraTransform` only by drag/wheel/zoom gestures.

use serde::{Deserialize, Serialize};

/// Smallest camera zoom
pub const MIN_SCALE: f32 = 0.2;

/// Largest camera zoom
pub const MAX_SCALE: f32 = 5.0;

/// Scale change per wheel unit
pub const WHEEL_SENSITIVITY: f32 = 0.001;

/// Scale change per zoom button press
pub const ZOOM_STEP: f32 = 0.1;

/// Pose of the avatar for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarState {
    /// Mouth openness in [0, 1]
    pub mouth_open: f32,
    /// Gaze x in [-1, 1]
    pub eye_x: f32,
    /// Gaze y in [-1, 1]
    pub eye_y: f32,
    pub blinking: bool,
    pub left_key_active: bool,
    pub right_key_active: bool,
    pub pointer_active: bool,
}

impl AvatarState {
    /// True while either paw should be typing
    pub fn is_typing(&self) -> bool {
        self.left_key_active || self.right_key_active
    }
}

/// Which paw a key press drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Left,
    Right,
}

/// Raw input as reported by pointer and key events
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Pointer x normalized to [-1, 1] across the viewport
    pub pointer_x: f32,
    /// Pointer y normalized to [-1, 1] across the viewport
    pub pointer_y: f32,
    /// Raw pointer position in viewport pixels
    pub raw_x: f32,
    pub raw_y: f32,
    pub pointer_down: bool,
    pub left_key: bool,
    pub right_key: bool,
}

impl InputState {
    /// Record a pointer position inside a viewport of `width` × `height`
    pub fn set_pointer(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.raw_x = x;
        self.raw_y = y;
        if width > 0.0 && height > 0.0 {
            self.pointer_x = ((x / width) * 2.0 - 1.0).clamp(-1.0, 1.0);
            self.pointer_y = ((y / height) * 2.0 - 1.0).clamp(-1.0, 1.0);
        }
    }

    pub fn set_key(&mut self, side: KeySide, held: bool) {
        match side {
            KeySide::Left => self.left_key = held,
            KeySide::Right => self.right_key = held,
        }
    }
}

/// Camera pan and zoom applied to the whole avatar scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl CameraTransform {
    /// Apply a wheel gesture; positive `delta_y` zooms out
    pub fn wheel(&mut self, delta_y: f32) {
        self.set_scale(self.scale - delta_y * WHEEL_SENSITIVITY);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }
}

/// Pointer drag in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start_x: f32,
    pub start_y: f32,
    pub start_offset_x: f32,
    pub start_offset_y: f32,
}

impl DragState {
    pub fn begin(x: f32, y: f32, camera: &CameraTransform) -> Self {
        Self {
            start_x: x,
            start_y: y,
            start_offset_x: camera.offset_x,
            start_offset_y: camera.offset_y,
        }
    }

    /// Offset = offset at drag start + pointer delta
    pub fn apply(&self, x: f32, y: f32, camera: &mut CameraTransform) {
        camera.offset_x = self.start_offset_x + (x - self.start_x);
        camera.offset_y = self.start_offset_y + (y - self.start_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pointer_normalization() {
        let mut input = InputState::default();
        input.set_pointer(0.0, 300.0, 800.0, 600.0);
        assert_eq!(input.pointer_x, -1.0);
        assert_eq!(input.pointer_y, 0.0);
        input.set_pointer(1000.0, 600.0, 800.0, 600.0);
        assert_eq!(input.pointer_x, 1.0);
        assert_eq!(input.pointer_y, 1.0);
    }

    #[test]
    fn test_wheel_clamps_scale() {
        let mut camera = CameraTransform::default();
        camera.wheel(-500.0);
        assert_relative_eq!(camera.scale, 1.5, epsilon = 1e-6);
        camera.wheel(-100_000.0);
        assert_eq!(camera.scale, MAX_SCALE);
        camera.wheel(100_000.0);
        assert_eq!(camera.scale, MIN_SCALE);
    }

    #[test]
    fn test_zoom_buttons_and_reset() {
        let mut camera = CameraTransform::default();
        camera.zoom_in();
        camera.zoom_in();
        assert_relative_eq!(camera.scale, 1.2, epsilon = 1e-6);
        camera.zoom_out();
        assert_relative_eq!(camera.scale, 1.1, epsilon = 1e-6);
        camera.offset_x = 40.0;
        camera.reset();
        assert_eq!(camera, CameraTransform::default());
    }

    #[test]
    fn test_drag_offsets_from_start() {
        let mut camera = CameraTransform {
            offset_x: 10.0,
            offset_y: -5.0,
            scale: 1.0,
        };
        let drag = DragState::begin(100.0, 100.0, &camera);
        drag.apply(130.0, 90.0, &mut camera);
        assert_eq!((camera.offset_x, camera.offset_y), (40.0, -15.0));
        // Absolute, not cumulative
        drag.apply(130.0, 90.0, &mut camera);
        assert_eq!((camera.offset_x, camera.offset_y), (40.0, -15.0));
    }
}
