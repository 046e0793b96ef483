//! Drawing surface abstraction.

use crate::images::ImageHandle;
use brainboard_core::text::TextMetrics;
use kurbo::{BezPath, Rect, Shape as _, Size};
use peniko::Color;

/// Immediate-mode 2D target the renderer paints into.
///
/// Coordinates are board pixels. Text is drawn with its baseline at the
/// given origin, in the board's single font family.
pub trait Surface {
    /// Surface size in pixels.
    fn size(&self) -> Size;

    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: Color);

    /// Stroke `path` with round caps and joins.
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64);

    fn fill_path(&mut self, path: &BezPath, color: Color);

    fn fill_text(&mut self, text: &str, origin: kurbo::Point, font_size: f64, color: Color);

    /// Draw a decoded image scaled into `dest`.
    fn draw_image(&mut self, image: &ImageHandle, dest: Rect);

    /// Width of `text` at `font_size`.
    fn measure_text(&self, text: &str, font_size: f64) -> f64;

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.stroke_path(&rect.to_path(0.1), color, width);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_path(&rect.to_path(0.1), color);
    }
}

/// Lets core geometry measure text through a surface.
pub struct SurfaceMetrics<'a, S: Surface + ?Sized>(pub &'a S);

impl<S: Surface + ?Sized> TextMetrics for SurfaceMetrics<'_, S> {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        self.0.measure_text(text, font_size)
    }
}

/// CSS color string for canvas-style backends.
pub fn css_color(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!(
            "rgba({}, {}, {}, {})",
            rgba.r,
            rgba.g,
            rgba.b,
            f64::from(rgba.a) / 255.0
        )
    }
}
