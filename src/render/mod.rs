//! Software rendering of the classroom scene
//!
//! Everything draws into a pre-allocated RGBA8 [`Surface`]; frames are handed
//! to the recorder as PNG.

mod avatar;
mod glyphs;
mod scene;
mod surface;

pub use avatar::{
    base_scale, key_lit, keyboard_effector, mouse_effector, AvatarRenderer, DESK_MOUSE_CENTER,
    GRID_SIZE, KEYBOARD_CENTER, KEYBOARD_PAW, MOUSE_RANGE,
};
pub use glyphs::{draw_text, glyph, has_glyph, text_width, TextAlign, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use scene::{AspectRatio, BoardText, Scene, DEFAULT_CANVAS_HEIGHT};
pub use surface::{quad_point, Path, Rgba, Surface, MAX_PATH_POINTS};
