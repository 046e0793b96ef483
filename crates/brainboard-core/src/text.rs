//! Font sizes, glyph boxes and text measurement.

use kurbo::{Point, Rect};

/// Font size of free text elements.
pub const TEXT_FONT_SIZE: f64 = 16.0;

/// Font size of sticker glyphs.
pub const STICKER_FONT_SIZE: f64 = 32.0;

/// Font size of note bodies.
pub const NOTE_FONT_SIZE: f64 = 14.0;

/// Vertical advance between wrapped note lines.
pub const NOTE_LINE_HEIGHT: f64 = 18.0;

/// Horizontal inset of note text from the note's left edge.
pub const NOTE_PADDING: f64 = 10.0;

/// Baseline of the first note line, relative to the note's top edge.
pub const NOTE_FIRST_BASELINE: f64 = 20.0;

/// Family used for every text element.
pub const FONT_FAMILY: &str = "Arial";

/// CSS font shorthand for a given size, as understood by canvas surfaces.
pub fn css_font(font_size: f64) -> String {
    format!("{font_size}px {FONT_FAMILY}")
}

/// Measures rendered text width.
///
/// Implemented by drawing surfaces; [`ApproximateMetrics`] stands in when no
/// surface is available.
pub trait TextMetrics {
    /// Width in pixels of `text` at `font_size`.
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed-advance estimate: every character is 0.6 em wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl TextMetrics for ApproximateMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * 0.6
    }
}

impl<T: TextMetrics + ?Sized> TextMetrics for &T {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        (**self).text_width(text, font_size)
    }
}

/// Selection box around a single line of text drawn with its baseline at
/// `anchor`.
///
/// The box hangs `font_size` above the baseline and reaches 4px below it.
pub fn glyph_box(anchor: Point, width: f64, font_size: f64) -> Rect {
    Rect::new(anchor.x, anchor.y - font_size, anchor.x + width, anchor.y + 4.0)
}
