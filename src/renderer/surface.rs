//! Drawing surface abstraction
//!
//! The render pass only needs six verbs. Coordinates are pixels with the
//! origin at the top-left corner and y pointing down.

use crate::sim::ColorToken;

/// Linear RGBA
pub type Color = [f32; 4];

/// Something the render pass can draw on
pub trait Surface {
    /// Width in pixels
    fn width(&self) -> f32;

    /// Height in pixels
    fn height(&self) -> f32;

    fn clear_and_fill_background(&mut self, color: Color);

    fn draw_filled_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color);

    fn draw_filled_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn draw_text(&mut self, text: &str, x: f32, y: f32);
}

/// Convert 8-bit sRGB-style channels to a color
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Colours used by the render pass ("Default Dark" base16 scheme)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub gridline: Color,
    pub ground: Color,
    /// Entities without a fill colour
    pub default_fill: Color,
    /// base08..base0F
    pub accents: [Color; 8],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: rgb(0x18, 0x18, 0x18),
            gridline: rgb(0x28, 0x28, 0x28),
            ground: rgb(0x58, 0x58, 0x58),
            default_fill: rgb(0xd8, 0xd8, 0xd8),
            accents: [
                rgb(0xab, 0x46, 0x42),
                rgb(0xdc, 0x96, 0x56),
                rgb(0xf7, 0xca, 0x88),
                rgb(0xa1, 0xb5, 0x6c),
                rgb(0x86, 0xc1, 0xb9),
                rgb(0x7c, 0xaf, 0xc2),
                rgb(0xba, 0x8b, 0xaf),
                rgb(0xa1, 0x69, 0x46),
            ],
        }
    }
}

impl Palette {
    pub fn resolve(&self, token: Option<ColorToken>) -> Color {
        match token {
            None => self.default_fill,
            Some(ColorToken::Base08) => self.accents[0],
            Some(ColorToken::Base09) => self.accents[1],
            Some(ColorToken::Base0A) => self.accents[2],
            Some(ColorToken::Base0B) => self.accents[3],
            Some(ColorToken::Base0C) => self.accents[4],
            Some(ColorToken::Base0D) => self.accents[5],
            Some(ColorToken::Base0E) => self.accents[6],
            Some(ColorToken::Base0F) => self.accents[7],
            Some(ColorToken::Rgb(r, g, b)) => rgb(r, g, b),
        }
    }
}

/// Surface that records every call, for render pass tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Circle { x: f32, y: f32, radius: f32, color: Color },
    Line { from: (f32, f32), to: (f32, f32), color: Color },
    Rect { x: f32, y: f32, width: f32, height: f32, color: Color },
    Text { text: String, x: f32, y: f32 },
}

#[cfg(test)]
impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn circles(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Circle { .. }))
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear_and_fill_background(&mut self, color: Color) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_filled_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        self.calls.push(DrawCall::Circle { x, y, radius, color });
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
        self.calls.push(DrawCall::Line {
            from: (x0, y0),
            to: (x1, y1),
            color,
        });
    }

    fn draw_filled_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.calls.push(DrawCall::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
    }
}
