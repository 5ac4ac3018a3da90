//! RGBA8 drawing surface
//!
//! A fixed-size pixel buffer with the handful of filled and stroked shapes
//! the avatar needs. Every primitive clips to the surface and blends with
//! source-over alpha. Nothing here allocates after construction.

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};

use crate::error::{Result, StudioError};

/// Straight-alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::rgb(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }

    /// Same color at `alpha` in [0, 1]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

/// Maximum vertices in a [`Path`]
pub const MAX_PATH_POINTS: usize = 96;

/// Segments used to flatten one quadratic curve
const CURVE_STEPS: usize = 12;

/// Fixed-capacity polygon outline built from lines and quadratic curves
#[derive(Debug, Clone)]
pub struct Path {
    points: [(f32, f32); MAX_PATH_POINTS],
    len: usize,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Self {
            points: [(0.0, 0.0); MAX_PATH_POINTS],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points[..self.len]
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.len = 0;
        self.push(x, y);
        self
    }

    /// Points past capacity are dropped
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.push(x, y);
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        let (x0, y0) = match self.len {
            0 => (x, y),
            n => self.points[n - 1],
        };
        for step in 1..=CURVE_STEPS {
            let (px, py) = quad_point((x0, y0), (cx, cy), (x, y), step as f32 / CURVE_STEPS as f32);
            self.push(px, py);
        }
        self
    }

    fn push(&mut self, x: f32, y: f32) {
        if self.len < MAX_PATH_POINTS {
            self.points[self.len] = (x, y);
            self.len += 1;
        }
    }
}

/// Point on a quadratic Bézier at parameter `t`
pub fn quad_point(p0: (f32, f32), c: (f32, f32), p1: (f32, f32), t: f32) -> (f32, f32) {
    let u = 1.0 - t;
    (
        u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p1.0,
        u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p1.1,
    )
}

/// Pre-allocated RGBA8 pixel buffer
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    /// Row-major RGBA bytes
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::invalid_parameter(
                "canvas_size",
                format!("{}x{}", width, height),
                "non-zero width and height",
            ));
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        })
    }

    /// Reallocate for a new canvas size; contents are cleared
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::rgba(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    #[inline]
    fn blend(&mut self, x: usize, y: usize, color: Rgba) {
        let i = (y * self.width as usize + x) * 4;
        if color.a == 255 {
            self.data[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
            return;
        }
        let a = color.a as u32;
        let inv = 255 - a;
        let mix = |src: u8, dst: u8| ((src as u32 * a + dst as u32 * inv + 127) / 255) as u8;
        self.data[i] = mix(color.r, self.data[i]);
        self.data[i + 1] = mix(color.g, self.data[i + 1]);
        self.data[i + 2] = mix(color.b, self.data[i + 2]);
        self.data[i + 3] = (a + self.data[i + 3] as u32 * inv / 255).min(255) as u8;
    }

    /// Fill pixels whose centers fall in [x0, x1) on row `y`
    fn span(&mut self, y: i64, x0: f32, x1: f32, color: Rgba) {
        if y < 0 || y >= self.height as i64 || color.a == 0 {
            return;
        }
        let start = (x0 - 0.5).ceil().max(0.0) as i64;
        let end = ((x1 - 0.5).ceil() as i64).min(self.width as i64);
        for x in start..end {
            self.blend(x as usize, y as usize, color);
        }
    }

    /// Rows whose centers fall in [y0, y1)
    fn rows(&self, y0: f32, y1: f32) -> std::ops::Range<i64> {
        let start = (y0 - 0.5).ceil().max(0.0) as i64;
        let end = ((y1 - 0.5).ceil() as i64).min(self.height as i64);
        start..end.max(start)
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        for row in self.rows(y, y + h) {
            self.span(row, x, x + w, color);
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgba) {
        let half = width / 2.0;
        self.fill_rect(x - half, y - half, w + width, width, color);
        self.fill_rect(x - half, y + h - half, w + width, width, color);
        self.fill_rect(x - half, y + half, width, h - width, color);
        self.fill_rect(x + w - half, y + half, width, h - width, color);
    }

    pub fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgba) {
        let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        for row in self.rows(y, y + h) {
            let cy = row as f32 + 0.5;
            let inset = if cy < y + r {
                corner_inset(r, y + r - cy)
            } else if cy > y + h - r {
                corner_inset(r, cy - (y + h - r))
            } else {
                0.0
            };
            self.span(row, x + inset, x + w - inset, color);
        }
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba) {
        self.ellipse_rows(cx, cy, rx, ry, cy + ry, color);
    }

    /// Upper half of an ellipse (flat side down)
    pub fn fill_upper_half_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba) {
        self.ellipse_rows(cx, cy, rx, ry, cy, color);
    }

    fn ellipse_rows(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, bottom: f32, color: Rgba) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        for row in self.rows(cy - ry, bottom) {
            let dy = (row as f32 + 0.5 - cy) / ry;
            let t = 1.0 - dy * dy;
            if t <= 0.0 {
                continue;
            }
            let half = rx * t.sqrt();
            self.span(row, cx - half, cx + half, color);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        self.fill_ellipse(cx, cy, radius, radius, color);
    }

    /// Ring of `width` centered on the circle of `radius`
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, width: f32, color: Rgba) {
        let outer = radius + width / 2.0;
        let inner = (radius - width / 2.0).max(0.0);
        for row in self.rows(cy - outer, cy + outer) {
            let dy = row as f32 + 0.5 - cy;
            let o = outer * outer - dy * dy;
            if o <= 0.0 {
                continue;
            }
            let ox = o.sqrt();
            let i = inner * inner - dy * dy;
            if i <= 0.0 {
                self.span(row, cx - ox, cx + ox, color);
            } else {
                let ix = i.sqrt();
                self.span(row, cx - ox, cx - ix, color);
                self.span(row, cx + ix, cx + ox, color);
            }
        }
    }

    /// Line segment with round caps
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Rgba) {
        let half = (width / 2.0).max(0.5);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len_sq = dx * dx + dy * dy;

        let min_x = x0.min(x1) - half;
        let max_x = x0.max(x1) + half;
        for row in self.rows(y0.min(y1) - half, y0.max(y1) + half) {
            let py = row as f32 + 0.5;
            let start = (min_x - 0.5).ceil().max(0.0) as i64;
            let end = ((max_x - 0.5).ceil() as i64).min(self.width as i64);
            for col in start..end {
                let px = col as f32 + 0.5;
                let t = if len_sq > 0.0 {
                    (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (qx, qy) = (x0 + t * dx - px, y0 + t * dy - py);
                if qx * qx + qy * qy <= half * half {
                    self.blend(col as usize, row as usize, color);
                }
            }
        }
    }

    /// Stroke a quadratic curve as a chain of round-capped segments
    pub fn stroke_quad(
        &mut self,
        p0: (f32, f32),
        control: (f32, f32),
        p1: (f32, f32),
        width: f32,
        color: Rgba,
    ) {
        let mut prev = p0;
        for step in 1..=CURVE_STEPS {
            let next = quad_point(p0, control, p1, step as f32 / CURVE_STEPS as f32);
            self.draw_line(prev.0, prev.1, next.0, next.1, width, color);
            prev = next;
        }
    }

    /// Even-odd scanline fill of a closed polygon
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let (min_y, max_y) = points
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));

        let mut crossings = [0.0_f32; MAX_PATH_POINTS];
        for row in self.rows(min_y, max_y) {
            let y = row as f32 + 0.5;
            let mut count = 0;
            for i in 0..points.len() {
                let (ax, ay) = points[i];
                let (bx, by) = points[(i + 1) % points.len()];
                if (ay <= y && by > y) || (by <= y && ay > y) {
                    if count < crossings.len() {
                        crossings[count] = ax + (y - ay) / (by - ay) * (bx - ax);
                        count += 1;
                    }
                }
            }
            let hits = &mut crossings[..count];
            hits.sort_unstable_by(|a, b| a.total_cmp(b));
            for pair in hits.chunks_exact(2) {
                let (a, b) = (pair[0], pair[1]);
                self.span(row, a, b, color);
            }
        }
    }

    /// Encode the current contents as PNG into `out`
    pub fn encode_png(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut encoder = Encoder::new(&mut *out, self.width, self.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(Compression::Fast);
        encoder.set_filter(FilterType::NoFilter);

        let mut writer = encoder.write_header().map_err(png_error)?;
        writer.write_image_data(&self.data).map_err(png_error)?;
        writer.finish().map_err(png_error)?;
        Ok(())
    }
}

fn png_error(e: png::EncodingError) -> StudioError {
    StudioError::Encoding {
        reason: format!("PNG: {}", e),
    }
}

/// Horizontal inset of a rounded corner `dy` above/below the arc center
fn corner_inset(radius: f32, dy: f32) -> f32 {
    let t = radius * radius - dy * dy;
    radius - t.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgba::from_hex("#2D4F38"), Some(Rgba::rgb(0x2D, 0x4F, 0x38)));
        assert_eq!(Rgba::from_hex("2D4F38"), None);
        assert_eq!(Rgba::from_hex("#12"), None);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Surface::new(0, 10).is_err());
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut surface = Surface::new(10, 10).unwrap();
        surface.fill_rect(-5.0, -5.0, 8.0, 8.0, RED);
        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(3, 3), Some(Rgba::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_alpha_blend_over_opaque() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.clear(Rgba::rgb(0, 0, 0));
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::rgb(255, 255, 255).with_alpha(0.5));
        let px = surface.pixel(0, 0).unwrap();
        assert!((127..=129).contains(&px.r));
        assert_eq!(px.a, 255);
    }

    #[test]
    fn test_circle_and_ring() {
        let mut surface = Surface::new(40, 40).unwrap();
        surface.fill_circle(20.0, 20.0, 10.0, RED);
        assert_eq!(surface.pixel(20, 20), Some(RED));
        assert_eq!(surface.pixel(2, 2).map(|p| p.a), Some(0));

        let mut ring = Surface::new(40, 40).unwrap();
        ring.stroke_circle(20.0, 20.0, 10.0, 2.0, RED);
        assert_eq!(ring.pixel(20, 20).map(|p| p.a), Some(0));
        assert_eq!(ring.pixel(30, 20), Some(RED));
    }

    #[test]
    fn test_polygon_fill() {
        let mut surface = Surface::new(20, 20).unwrap();
        surface.fill_polygon(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)], RED);
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(18, 18).map(|p| p.a), Some(0));
    }

    #[test]
    fn test_path_flattens_curves() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).quad_to(10.0, 10.0, 20.0, 0.0);
        assert_eq!(path.points().len(), 1 + CURVE_STEPS);
        assert_eq!(path.points()[CURVE_STEPS], (20.0, 0.0));
    }

    #[test]
    fn test_png_signature() {
        let surface = Surface::new(4, 4).unwrap();
        let mut out = Vec::new();
        surface.encode_png(&mut out).unwrap();
        assert_eq!(&out[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
