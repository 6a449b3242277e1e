//! Debug visualization utilities
//!
//! Renderer-agnostic debug output. Navigation code emits points, lines,
//! areas and text into a [`DebugSink`]; the host decides whether to draw,
//! collect or ignore them. Every call is fire-and-forget.

mod visualization;

pub use visualization::*;

use glam::Vec2;

/// Color representation for debug visualization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Creates a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Creates a color from a packed 0xRRGGBB value
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }
}

/// Common debug colors
impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.5, 0.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
}

/// Receiver of debug primitives
///
/// All methods default to no-ops so implementors only override what they
/// can render.
pub trait DebugSink {
    fn add_point(&mut self, _point: Vec2, _color: Color) {}

    fn add_line(&mut self, _start: Vec2, _end: Vec2, _color: Color) {}

    fn add_area(&mut self, _points: &[Vec2], _color: Color) {}

    fn add_text(&mut self, _point: Vec2, _text: &str, _color: Color) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {}

/// Debug line
#[derive(Debug, Clone, PartialEq)]
pub struct DebugLine {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Color,
}

/// Debug text label
#[derive(Debug, Clone, PartialEq)]
pub struct DebugText {
    pub position: Vec2,
    pub text: String,
    pub color: Color,
}

/// Collection of debug drawing primitives
#[derive(Debug, Default)]
pub struct DebugDraw {
    pub points: Vec<(Vec2, Color)>,
    pub lines: Vec<DebugLine>,
    pub areas: Vec<(Vec<Vec2>, Color)>,
    pub text: Vec<DebugText>,
}

impl DebugDraw {
    /// Creates a new debug draw collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all debug drawing primitives
    pub fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.areas.clear();
        self.text.clear();
    }

    /// Gets the total number of debug primitives
    pub fn primitive_count(&self) -> usize {
        self.points.len() + self.lines.len() + self.areas.len() + self.text.len()
    }

    /// Checks if the debug draw is empty
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}

impl DebugSink for DebugDraw {
    fn add_point(&mut self, point: Vec2, color: Color) {
        self.points.push((point, color));
    }

    fn add_line(&mut self, start: Vec2, end: Vec2, color: Color) {
        self.lines.push(DebugLine { start, end, color });
    }

    fn add_area(&mut self, points: &[Vec2], color: Color) {
        self.areas.push((points.to_vec(), color));
    }

    fn add_text(&mut self, point: Vec2, text: &str, color: Color) {
        self.text.push(DebugText {
            position: point,
            text: text.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let mut draw = DebugDraw::new();
        assert!(draw.is_empty());

        draw.add_point(Vec2::ZERO, Color::RED);
        draw.add_line(Vec2::ZERO, Vec2::ONE, Color::GREEN);
        draw.add_area(&[Vec2::ZERO, Vec2::X, Vec2::Y], Color::BLUE);
        draw.add_text(Vec2::ONE, "corner", Color::WHITE);
        assert_eq!(draw.primitive_count(), 4);
        assert_eq!(draw.text[0].text, "corner");

        draw.clear();
        assert!(draw.is_empty());
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullDebugSink;
        sink.add_point(Vec2::ZERO, Color::RED);
        sink.add_text(Vec2::ZERO, "ignored", Color::RED);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(Color::from_hex(0xff0000), Color::RED);
    }
}
