//! Per-tick animation state derivation

use log::debug;

use super::blink::BlinkTimer;
use super::state::{AvatarState, CameraTransform, DragState, InputState, KeySide};

/// Fraction of the remaining distance the eyes travel each tick
pub const EYE_FOLLOW_RATE: f32 = 0.1;

/// Derives `AvatarState` from loudness, input and elapsed time
#[derive(Debug, Clone, Default)]
pub struct AnimationEngine {
    avatar: AvatarState,
    input: InputState,
    camera: CameraTransform,
    drag: Option<DragState>,
    blink: BlinkTimer,
    /// Latest loudness written by the audio callback
    loudness: f32,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blink_timer(blink: BlinkTimer) -> Self {
        Self {
            blink,
            ..Self::default()
        }
    }

    pub fn avatar(&self) -> &AvatarState {
        &self.avatar
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn camera(&self) -> &CameraTransform {
        &self.camera
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Audio-side write of the latest loudness
    pub fn set_loudness(&mut self, loudness: f32) {
        self.loudness = if loudness.is_finite() {
            loudness.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn loudness(&self) -> f32 {
        self.loudness
    }

    /// Advance one display tick, `elapsed_ms` after the session clock started
    pub fn tick(&mut self, elapsed_ms: u64) -> &AvatarState {
        let target_x = self.input.pointer_x;
        let target_y = self.input.pointer_y;

        let avatar = &mut self.avatar;
        avatar.mouth_open = self.loudness;
        avatar.eye_x = (avatar.eye_x + (target_x - avatar.eye_x) * EYE_FOLLOW_RATE).clamp(-1.0, 1.0);
        avatar.eye_y = (avatar.eye_y + (target_y - avatar.eye_y) * EYE_FOLLOW_RATE).clamp(-1.0, 1.0);
        avatar.blinking = self.blink.is_blinking(elapsed_ms);
        avatar.left_key_active = self.input.left_key;
        avatar.right_key_active = self.input.right_key;
        avatar.pointer_active = self.input.pointer_down;

        &self.avatar
    }

    /// Pointer pressed at viewport position (x, y); starts a camera drag
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.input.pointer_down = true;
        self.drag = Some(DragState::begin(x, y, &self.camera));
        debug!("Drag started at ({}, {})", x, y);
    }

    /// Pointer moved inside a `width` × `height` viewport
    pub fn pointer_move(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.input.set_pointer(x, y, width, height);
        if let Some(drag) = &self.drag {
            drag.apply(x, y, &mut self.camera);
        }
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_down = false;
        self.drag = None;
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.camera.wheel(delta_y);
    }

    pub fn key_down(&mut self, side: KeySide) {
        self.input.set_key(side, true);
    }

    pub fn key_up(&mut self, side: KeySide) {
        self.input.set_key(side, false);
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_converges_within_44_ticks() {
        let mut engine = AnimationEngine::new();
        engine.pointer_move(800.0, 600.0, 800.0, 600.0);

        let mut ticks = 0;
        while (1.0 - engine.avatar().eye_x).abs() > 0.01 {
            engine.tick(0);
            ticks += 1;
            assert!(ticks <= 44, "eye still at {}", engine.avatar().eye_x);
        }
        assert!((1.0 - engine.avatar().eye_y).abs() <= 0.01);
    }

    #[test]
    fn test_first_tick_moves_ten_percent() {
        let mut engine = AnimationEngine::new();
        engine.pointer_move(0.0, 300.0, 800.0, 600.0);
        let avatar = engine.tick(0);
        assert!((avatar.eye_x + 0.1).abs() < 1e-6);
        assert_eq!(avatar.eye_y, 0.0);
    }

    #[test]
    fn test_mouth_mirrors_raw_loudness() {
        let mut engine = AnimationEngine::new();
        engine.set_loudness(0.42);
        assert_eq!(engine.tick(0).mouth_open, 0.42);
        engine.set_loudness(3.0);
        assert_eq!(engine.tick(0).mouth_open, 1.0);
        engine.set_loudness(f32::NAN);
        assert_eq!(engine.tick(0).mouth_open, 0.0);
    }

    #[test]
    fn test_flags_copied_from_input() {
        let mut engine = AnimationEngine::new();
        engine.key_down(KeySide::Left);
        engine.pointer_down(10.0, 10.0);
        let avatar = *engine.tick(0);
        assert!(avatar.left_key_active && avatar.pointer_active);
        assert!(!avatar.right_key_active);

        engine.key_up(KeySide::Left);
        engine.pointer_up();
        let avatar = *engine.tick(0);
        assert!(!avatar.is_typing() && !avatar.pointer_active);
    }

    #[test]
    fn test_drag_moves_camera_only_while_down() {
        let mut engine = AnimationEngine::new();
        engine.pointer_down(100.0, 100.0);
        engine.pointer_move(150.0, 120.0, 800.0, 600.0);
        assert_eq!(engine.camera().offset_x, 50.0);
        assert_eq!(engine.camera().offset_y, 20.0);

        engine.pointer_up();
        engine.pointer_move(400.0, 400.0, 800.0, 600.0);
        assert_eq!(engine.camera().offset_x, 50.0);
    }

    #[test]
    fn test_blink_follows_session_clock() {
        let mut engine = AnimationEngine::new();
        assert!(!engine.tick(1000).blinking);
        assert!(engine.tick(3550).blinking);
        assert!(!engine.tick(3700).blinking);
    }
}
