//! Chalkboard classroom and fox teacher renderer
//!
//! Full redraw every call. Scene coordinates are relative to the canvas
//! center (plus camera offset) and scaled by `min(w, h) / 800 × zoom`, so the
//! character keeps its proportions on every aspect ratio.

use super::glyphs::{draw_text, text_width, TextAlign};
use super::scene::Scene;
use super::surface::{Path, Rgba, Surface};
use crate::animation::{AvatarState, CameraTransform};

/// Reference canvas extent for scene coordinates
const REFERENCE_EXTENT: f32 = 800.0;

/// Chalk grid spacing in pixels
pub const GRID_SIZE: u32 = 100;

/// Mousepad center on the desk
pub const DESK_MOUSE_CENTER: (f32, f32) = (180.0, 320.0);

/// Mouse travel from the pad center at full gaze deflection
pub const MOUSE_RANGE: (f32, f32) = (80.0, 40.0);

/// Keyboard center on the desk
pub const KEYBOARD_CENTER: (f32, f32) = (0.0, 320.0);

/// Resting position of the typing paw
pub const KEYBOARD_PAW: (f32, f32) = (-40.0, 320.0);

const SHOULDER_LEFT: (f32, f32) = (-60.0, 130.0);
const SHOULDER_RIGHT: (f32, f32) = (60.0, 130.0);

mod palette {
    use super::Rgba;

    pub const CHALKBOARD: Rgba = Rgba::rgb(0x2D, 0x4F, 0x38);
    pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);
    pub const SUSPENDERS: Rgba = Rgba::rgb(0x37, 0x47, 0x4F);
    pub const GOLD: Rgba = Rgba::rgb(0xFF, 0xD7, 0x00);
    pub const EAR: Rgba = Rgba::rgb(0xE6, 0x51, 0x00);
    pub const EAR_INNER: Rgba = Rgba::rgb(0xFF, 0xE0, 0xB2);
    pub const FUR: Rgba = Rgba::rgb(0xFB, 0x8C, 0x00);
    pub const MUZZLE: Rgba = Rgba::rgb(0xFF, 0xF3, 0xE0);
    pub const DARK_BROWN: Rgba = Rgba::rgb(0x3E, 0x27, 0x23);
    pub const GLASSES: Rgba = Rgba::rgb(0x33, 0x33, 0x33);
    pub const PUPIL: Rgba = Rgba::rgb(0x21, 0x21, 0x21);
    pub const TONGUE: Rgba = Rgba::rgb(0xFF, 0x8A, 0x80);
    pub const WOOD: Rgba = Rgba::rgb(0x8D, 0x6E, 0x63);
    pub const WOOD_EDGE: Rgba = Rgba::rgb(0x5D, 0x40, 0x37);
    pub const STAND: Rgba = Rgba::rgb(0xD7, 0xCC, 0xC8);
    pub const STAND_BASE: Rgba = Rgba::rgb(0xBC, 0xAA, 0xA4);
    pub const BEIGE: Rgba = Rgba::rgb(0xE0, 0xD8, 0xC8);
    pub const GREY: Rgba = Rgba::rgb(0x9E, 0x9E, 0x9E);
    pub const MOUSEPAD: Rgba = Rgba::rgb(0x45, 0x5A, 0x64);
    pub const PLASTIC: Rgba = Rgba::rgb(0xEE, 0xEE, 0xEE);
    pub const PLASTIC_EDGE: Rgba = Rgba::rgb(0x99, 0x99, 0x99);
    pub const KEY_LIT: Rgba = Rgba::rgb(0x81, 0xC7, 0x84);
    pub const CLICK: Rgba = Rgba::rgba(76, 175, 80, 128);
    pub const CAPTION: Rgba = Rgba::rgb(0xFF, 0xB7, 0x4D);
}

/// Scale from scene units to pixels
pub fn base_scale(width: u32, height: u32, camera: &CameraTransform) -> f32 {
    width.min(height) as f32 / REFERENCE_EXTENT * camera.scale
}

/// Where the mouse paw rests, in scene coordinates, for a normalized pointer
pub fn mouse_effector(pointer: (f32, f32)) -> (f32, f32) {
    (
        DESK_MOUSE_CENTER.0 + pointer.0.clamp(-1.0, 1.0) * MOUSE_RANGE.0,
        DESK_MOUSE_CENTER.1 + pointer.1.clamp(-1.0, 1.0) * MOUSE_RANGE.1,
    )
}

/// Where the typing paw rests, in scene coordinates
pub fn keyboard_effector(avatar: &AvatarState, now_ms: u64) -> (f32, f32) {
    let offset = if avatar.is_typing() {
        (now_ms as f32 / 50.0).sin() * 5.0
    } else {
        0.0
    };
    (KEYBOARD_PAW.0, KEYBOARD_PAW.1 + offset)
}

/// Deterministic stand-in for random key flashes (~30% lit, changes every 100ms)
pub fn key_lit(now_ms: u64, row: u32, col: u32) -> bool {
    let mut h = (now_ms / 100)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(((row as u64) << 8) | col as u64);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h % 10 >= 7
}

fn rotate(point: (f32, f32), angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (
        point.0 * cos - point.1 * sin,
        point.0 * sin + point.1 * cos,
    )
}

/// Maps scene coordinates onto the surface
#[derive(Debug, Clone, Copy)]
struct Pen {
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl Pen {
    fn at(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y + y * self.scale)
    }

    fn len(&self, v: f32) -> f32 {
        v * self.scale
    }

    fn rect(&self, s: &mut Surface, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let (px, py) = self.at(x, y);
        s.fill_rect(px, py, self.len(w), self.len(h), color);
    }

    /// Filled rectangle with an outline straddling its edge
    fn outlined_rect(&self, s: &mut Surface, rect: [f32; 4], fill: Rgba, edge: Rgba, width: f32) {
        let [x, y, w, h] = rect;
        self.rect(s, x, y, w, h, fill);
        let (px, py) = self.at(x, y);
        s.stroke_rect(px, py, self.len(w), self.len(h), self.len(width), edge);
    }

    fn rounded(&self, s: &mut Surface, rect: [f32; 4], radius: f32, color: Rgba) {
        let [x, y, w, h] = rect;
        let (px, py) = self.at(x, y);
        s.fill_rounded_rect(px, py, self.len(w), self.len(h), self.len(radius), color);
    }

    fn outlined_rounded(
        &self,
        s: &mut Surface,
        rect: [f32; 4],
        radius: f32,
        fill: Rgba,
        edge: Rgba,
        width: f32,
    ) {
        let [x, y, w, h] = rect;
        let half = width / 2.0;
        self.rounded(s, [x - half, y - half, w + width, h + width], radius + half, edge);
        self.rounded(s, [x + half, y + half, w - width, h - width], (radius - half).max(0.0), fill);
    }

    fn ellipse(&self, s: &mut Surface, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba) {
        let (px, py) = self.at(cx, cy);
        s.fill_ellipse(px, py, self.len(rx), self.len(ry), color);
    }

    fn circle(&self, s: &mut Surface, cx: f32, cy: f32, r: f32, color: Rgba) {
        self.ellipse(s, cx, cy, r, r, color);
    }

    fn ring(&self, s: &mut Surface, cx: f32, cy: f32, r: f32, width: f32, color: Rgba) {
        let (px, py) = self.at(cx, cy);
        s.stroke_circle(px, py, self.len(r), self.len(width), color);
    }

    fn line(&self, s: &mut Surface, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let (x0, y0) = self.at(from.0, from.1);
        let (x1, y1) = self.at(to.0, to.1);
        s.draw_line(x0, y0, x1, y1, self.len(width), color);
    }

    fn quad(
        &self,
        s: &mut Surface,
        from: (f32, f32),
        control: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgba,
    ) {
        s.stroke_quad(
            self.at(from.0, from.1),
            self.at(control.0, control.1),
            self.at(to.0, to.1),
            self.len(width),
            color,
        );
    }

    fn polygon(&self, s: &mut Surface, path: &mut Path, points: &[(f32, f32)], color: Rgba) {
        path.clear();
        for &(x, y) in points {
            let (px, py) = self.at(x, y);
            path.line_to(px, py);
        }
        s.fill_polygon(path.points(), color);
    }
}

/// Draws the full frame
#[derive(Debug, Clone, Default)]
pub struct AvatarRenderer {
    /// Scratch outline reused by every filled shape
    path: Path,
}

impl AvatarRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, surface: &mut Surface, scene: &Scene<'_>) {
        let (w, h) = (surface.width(), surface.height());

        draw_board(surface, scene);

        let camera = scene.camera;
        let pen = Pen {
            origin_x: w as f32 / 2.0 + camera.offset_x,
            origin_y: h as f32 / 2.0 + camera.offset_y,
            scale: base_scale(w, h, camera),
        };
        self.draw_body(surface, &pen);
        self.draw_head(surface, &pen, scene.avatar);
        self.draw_desk(surface, &pen);
        self.draw_peripherals(surface, &pen, scene);
        self.draw_arms(surface, &pen, scene);

        if let Some(caption) = scene.caption.filter(|c| !c.is_empty()) {
            draw_caption(surface, caption);
        }
    }

    fn draw_body(&mut self, s: &mut Surface, pen: &Pen) {
        let body = Pen {
            origin_y: pen.origin_y + pen.len(80.0),
            ..*pen
        };

        // Shirt: curved shoulders tapering into the torso
        self.path.clear();
        let start = body.at(-70.0, 40.0);
        let control = body.at(0.0, 20.0);
        let shoulder = body.at(70.0, 40.0);
        let hip_r = body.at(75.0, 250.0);
        let hip_l = body.at(-75.0, 250.0);
        self.path
            .move_to(start.0, start.1)
            .quad_to(control.0, control.1, shoulder.0, shoulder.1)
            .line_to(hip_r.0, hip_r.1)
            .line_to(hip_l.0, hip_l.1);
        s.fill_polygon(self.path.points(), palette::WHITE);

        body.rect(s, -45.0, 40.0, 12.0, 210.0, palette::SUSPENDERS);
        body.rect(s, 33.0, 40.0, 12.0, 210.0, palette::SUSPENDERS);
        body.circle(s, -39.0, 180.0, 3.0, palette::GOLD);
        body.circle(s, 39.0, 180.0, 3.0, palette::GOLD);
    }

    fn draw_head(&mut self, s: &mut Surface, pen: &Pen, avatar: &AvatarState) {
        let head = Pen {
            origin_y: pen.origin_y + pen.len(80.0),
            ..*pen
        };
        let path = &mut self.path;

        for side in [-1.0_f32, 1.0] {
            head.polygon(
                s,
                path,
                &[(side * 60.0, -80.0), (side * 90.0, -160.0), (side * 20.0, -100.0)],
                palette::EAR,
            );
            head.polygon(
                s,
                path,
                &[(side * 60.0, -80.0), (side * 80.0, -140.0), (side * 35.0, -95.0)],
                palette::EAR_INNER,
            );
        }

        head.ellipse(s, 0.0, -20.0, 90.0, 85.0, palette::FUR);

        // Muzzle
        path.clear();
        let p = |x, y| head.at(x, y);
        let (m0, c1, m1, c2, m2, c3, m3, c4) = (
            p(-90.0, 0.0),
            p(-50.0, 60.0),
            p(0.0, 65.0),
            p(50.0, 60.0),
            p(90.0, 0.0),
            p(90.0, -40.0),
            p(0.0, -40.0),
            p(-90.0, -40.0),
        );
        path.move_to(m0.0, m0.1)
            .quad_to(c1.0, c1.1, m1.0, m1.1)
            .quad_to(c2.0, c2.1, m2.0, m2.1)
            .quad_to(c3.0, c3.1, m3.0, m3.1)
            .quad_to(c4.0, c4.1, m0.0, m0.1);
        s.fill_polygon(path.points(), palette::MUZZLE);

        head.circle(s, 0.0, 30.0, 12.0, palette::DARK_BROWN);

        // Glasses
        head.ring(s, -35.0, -15.0, 28.0, 5.0, palette::GLASSES);
        head.ring(s, 35.0, -15.0, 28.0, 5.0, palette::GLASSES);
        head.line(s, (-7.0, -15.0), (7.0, -15.0), 5.0, palette::GLASSES);

        let pupil_x = avatar.eye_x * 10.0;
        let pupil_y = avatar.eye_y * 8.0;
        if avatar.blinking {
            head.line(s, (-50.0, -15.0), (-20.0, -15.0), 4.0, palette::GLASSES);
            head.line(s, (20.0, -15.0), (50.0, -15.0), 4.0, palette::GLASSES);
        } else {
            for eye in [-35.0_f32, 35.0] {
                head.circle(s, eye, -15.0, 26.0, palette::WHITE);
                head.circle(s, eye + pupil_x, -15.0 + pupil_y, 8.0, palette::PUPIL);
                head.circle(s, eye - 3.0 + pupil_x, -18.0 + pupil_y, 3.0, palette::WHITE);
            }
        }

        // Lip sync
        let mouth_h = (avatar.mouth_open * 30.0).max(2.0);
        head.ellipse(s, 0.0, 50.0, 10.0, mouth_h, palette::DARK_BROWN);
        if mouth_h > 5.0 {
            let (tx, ty) = head.at(0.0, 50.0 + mouth_h - 5.0);
            let r = head.len(6.0);
            s.fill_upper_half_ellipse(tx, ty, r, r, palette::TONGUE);
        }
    }

    fn draw_desk(&mut self, s: &mut Surface, pen: &Pen) {
        pen.outlined_rounded(
            s,
            [-350.0, 220.0, 700.0, 300.0],
            10.0,
            palette::WOOD,
            palette::WOOD_EDGE,
            4.0,
        );
        pen.rect(s, -340.0, 225.0, 680.0, 15.0, palette::WHITE.with_alpha(0.1));

        // Monitor on the left
        let monitor = Pen {
            origin_x: pen.origin_x + pen.len(-200.0),
            origin_y: pen.origin_y + pen.len(180.0),
            ..*pen
        };
        monitor.outlined_rect(s, [-40.0, 40.0, 80.0, 60.0], palette::STAND, palette::WOOD_EDGE, 4.0);
        monitor.outlined_rect(
            s,
            [-60.0, 90.0, 120.0, 20.0],
            palette::STAND_BASE,
            palette::WOOD_EDGE,
            4.0,
        );
        monitor.outlined_rounded(
            s,
            [-90.0, -70.0, 180.0, 130.0],
            8.0,
            palette::BEIGE,
            palette::GREY,
            4.0,
        );
        monitor.rounded(s, [-80.0, -60.0, 160.0, 100.0], 4.0, palette::CHALKBOARD);
    }

    fn draw_peripherals(&mut self, s: &mut Surface, pen: &Pen, scene: &Scene<'_>) {
        let (avatar, now_ms) = (scene.avatar, scene.now_ms);
        let (mx, my) = mouse_effector(scene.pointer);
        let (pad_x, pad_y) = DESK_MOUSE_CENTER;

        pen.ellipse(s, pad_x, pad_y, 60.0, 50.0, palette::MOUSEPAD);
        pen.quad(
            s,
            (mx, my - 15.0),
            (pad_x, pad_y - 60.0),
            (pad_x - 50.0, pad_y - 80.0),
            2.0,
            palette::GLASSES,
        );

        pen.ellipse(s, mx, my, 19.0, 26.0, palette::PLASTIC_EDGE);
        pen.ellipse(s, mx, my, 18.0, 25.0, palette::PLASTIC);
        pen.line(s, (mx - 18.0, my - 5.0), (mx + 18.0, my - 5.0), 1.0, palette::PLASTIC_EDGE);
        pen.line(s, (mx, my - 5.0), (mx, my - 25.0), 1.0, palette::PLASTIC_EDGE);
        if avatar.pointer_active {
            let (cx, cy) = pen.at(mx, my - 10.0);
            s.fill_upper_half_ellipse(cx, cy, pen.len(15.0), pen.len(12.0), palette::CLICK);
        }

        // Keyboard in slight perspective
        let (kx, ky) = KEYBOARD_CENTER;
        let outline = [
            (kx - 91.0, ky - 31.0),
            (kx + 91.0, ky - 31.0),
            (kx + 101.0, ky + 31.0),
            (kx - 101.0, ky + 31.0),
        ];
        pen.polygon(s, &mut self.path, &outline, palette::PLASTIC_EDGE);
        let body = [
            (kx - 90.0, ky - 30.0),
            (kx + 90.0, ky - 30.0),
            (kx + 100.0, ky + 30.0),
            (kx - 100.0, ky + 30.0),
        ];
        pen.polygon(s, &mut self.path, &body, palette::PLASTIC);

        let typing = avatar.is_typing();
        for row in 0..3u32 {
            for col in 0..8u32 {
                let lit = typing && key_lit(now_ms, row, col);
                let skew = row as f32 * 2.0;
                pen.rect(
                    s,
                    kx - 80.0 + col as f32 * 20.0 - skew,
                    ky - 20.0 + row as f32 * 14.0,
                    18.0,
                    12.0,
                    if lit { palette::KEY_LIT } else { palette::WHITE },
                );
            }
        }
    }

    fn draw_arms(&mut self, s: &mut Surface, pen: &Pen, scene: &Scene<'_>) {
        // Mouse arm: wrist at the mouse, elbow bowed outwards
        let wrist = mouse_effector(scene.pointer);
        let elbow = (
            wrist.0 + (SHOULDER_RIGHT.0 - wrist.0) * 0.5 + 60.0,
            wrist.1 + (SHOULDER_RIGHT.1 - wrist.1) * 0.5 + 20.0,
        );
        pen.quad(s, wrist, elbow, SHOULDER_RIGHT, 26.0, palette::WHITE);
        let paw = rotate((5.0, -5.0), -0.2);
        let tips = rotate((5.0, -2.0), -0.2);
        pen.ellipse(s, wrist.0 + paw.0, wrist.1 + paw.1, 22.0, 18.0, palette::FUR);
        pen.ellipse(s, wrist.0 + tips.0, wrist.1 + tips.1, 15.0, 10.0, palette::MUZZLE);

        // Keyboard arm
        let wrist = keyboard_effector(scene.avatar, scene.now_ms);
        let elbow = (
            wrist.0 + (SHOULDER_LEFT.0 - wrist.0) * 0.5 - 60.0,
            wrist.1 + (SHOULDER_LEFT.1 - wrist.1) * 0.5 + 20.0,
        );
        pen.quad(s, wrist, elbow, SHOULDER_LEFT, 26.0, palette::WHITE);
        let tips = rotate((0.0, 3.0), 0.3);
        pen.ellipse(s, wrist.0, wrist.1, 22.0, 18.0, palette::FUR);
        pen.ellipse(s, wrist.0 + tips.0, wrist.1 + tips.1, 15.0, 10.0, palette::MUZZLE);
    }
}

fn draw_board(s: &mut Surface, scene: &Scene<'_>) {
    let (w, h) = (s.width() as f32, s.height() as f32);
    s.clear(palette::CHALKBOARD);

    let chalk = palette::WHITE.with_alpha(0.1);
    let mut x = 0;
    while x <= s.width() {
        s.fill_rect(x as f32 - 1.0, 0.0, 2.0, h, chalk);
        x += GRID_SIZE;
    }
    let mut y = 0;
    while y <= s.height() {
        s.fill_rect(0.0, y as f32 - 1.0, w, 2.0, chalk);
        y += GRID_SIZE;
    }

    let faint = palette::WHITE.with_alpha(0.15);
    let text = scene.board_text;
    draw_text(s, &text.top_left, 50.0, 100.0, 4.0, TextAlign::Left, faint);
    draw_text(s, &text.bottom_left, 50.0, h - 50.0, 4.0, TextAlign::Left, faint);
    draw_text(s, &text.bottom_right, w - 50.0, h - 50.0, 4.0, TextAlign::Right, faint);
    draw_text(s, &text.top_right, w - 50.0, 100.0, 2.0, TextAlign::Right, faint);
}

fn draw_caption(s: &mut Surface, caption: &str) {
    let (w, h) = (s.width() as f32, s.height() as f32);
    let text_h = (w / 30.0).floor().max(7.0);
    let pixel = (text_h / 7.0).floor().max(1.0);
    let text_w = text_width(caption, pixel);
    let pad = 20.0;

    s.fill_rect(
        w / 2.0 - text_w / 2.0 - pad,
        h - 80.0 - text_h,
        text_w + pad * 2.0,
        text_h + pad,
        Rgba::rgba(0, 0, 0, 153),
    );
    draw_text(s, caption, w / 2.0, h - 80.0, pixel, TextAlign::Center, palette::CAPTION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scene::BoardText;

    fn scene<'a>(
        avatar: &'a AvatarState,
        camera: &'a CameraTransform,
        board: &'a BoardText,
        caption: Option<&'a str>,
    ) -> Scene<'a> {
        Scene {
            avatar,
            camera,
            pointer: (0.0, 0.0),
            now_ms: 0,
            board_text: board,
            caption,
        }
    }

    #[test]
    fn test_mouse_effector_follows_pointer() {
        assert_eq!(mouse_effector((1.0, -1.0)), (260.0, 280.0));
        assert_eq!(mouse_effector((0.0, 0.0)), DESK_MOUSE_CENTER);
        // Stays on the desk for out-of-range input
        assert_eq!(mouse_effector((3.0, 2.0)), (260.0, 360.0));
    }

    #[test]
    fn test_pointer_moves_the_mouse_arm_in_the_frame() {
        let avatar = AvatarState::default();
        let camera = CameraTransform::default();
        let board = BoardText::default();
        let mut renderer = AvatarRenderer::new();

        let mut centred = Surface::new(180, 320).unwrap();
        renderer.render(&mut centred, &scene(&avatar, &camera, &board, None));

        let mut moved = Surface::new(180, 320).unwrap();
        let mut shifted = scene(&avatar, &camera, &board, None);
        shifted.pointer = (1.0, -1.0);
        renderer.render(&mut moved, &shifted);

        assert_ne!(centred.data(), moved.data());
    }

    #[test]
    fn test_keyboard_paw_moves_only_while_typing() {
        let idle = AvatarState::default();
        assert_eq!(keyboard_effector(&idle, 1234), KEYBOARD_PAW);

        let typing = AvatarState {
            left_key_active: true,
            ..Default::default()
        };
        let (x, y) = keyboard_effector(&typing, 1234);
        assert_eq!(x, KEYBOARD_PAW.0);
        assert!((y - (KEYBOARD_PAW.1 + (1234.0_f32 / 50.0).sin() * 5.0)).abs() < 1e-4);
    }

    #[test]
    fn test_base_scale_follows_short_side_and_zoom() {
        let camera = CameraTransform {
            scale: 2.0,
            ..Default::default()
        };
        assert_eq!(base_scale(607, 1080, &camera), 607.0 / 800.0 * 2.0);
    }

    #[test]
    fn test_key_flashes_light_about_a_third() {
        let mut lit = 0;
        let mut total = 0;
        for frame in 0..100u64 {
            for row in 0..3 {
                for col in 0..8 {
                    total += 1;
                    if key_lit(frame * 100, row, col) {
                        lit += 1;
                    }
                }
            }
        }
        let share = lit as f32 / total as f32;
        assert!((0.2..0.4).contains(&share), "lit share {}", share);
        assert_eq!(key_lit(5000, 1, 2), key_lit(5099, 1, 2));
    }

    #[test]
    fn test_render_draws_background_and_character() {
        let mut surface = Surface::new(270, 480).unwrap();
        let avatar = AvatarState::default();
        let camera = CameraTransform::default();
        let board = BoardText::default();
        let mut renderer = AvatarRenderer::new();
        renderer.render(&mut surface, &scene(&avatar, &camera, &board, None));

        // Corner away from grid lines and text is plain chalkboard
        assert_eq!(surface.pixel(30, 30), Some(palette::CHALKBOARD));
        // Cheek fur between the left glasses ring and the ear
        let scale = base_scale(270, 480, &camera);
        let x = (135.0 - 60.0 * scale) as u32;
        let y = (240.0 + 30.0 * scale) as u32;
        assert_eq!(surface.pixel(x, y), Some(palette::FUR));
    }

    #[test]
    fn test_caption_strip_drawn_when_present() {
        let avatar = AvatarState::default();
        let camera = CameraTransform::default();
        let board = BoardText::default();
        let mut renderer = AvatarRenderer::new();

        let mut plain = Surface::new(300, 400).unwrap();
        renderer.render(&mut plain, &scene(&avatar, &camera, &board, None));
        let mut captioned = Surface::new(300, 400).unwrap();
        renderer.render(&mut captioned, &scene(&avatar, &camera, &board, Some("HELLO")));

        assert_ne!(plain.data(), captioned.data());
    }

    #[test]
    fn test_render_is_a_pure_redraw() {
        let avatar = AvatarState::default();
        let camera = CameraTransform::default();
        let board = BoardText::default();
        let mut renderer = AvatarRenderer::new();
        let mut surface = Surface::new(200, 200).unwrap();

        renderer.render(&mut surface, &scene(&avatar, &camera, &board, None));
        let first = surface.data().to_vec();
        renderer.render(&mut surface, &scene(&avatar, &camera, &board, None));
        assert_eq!(first, surface.data());
    }
}
