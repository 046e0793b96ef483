//! Software raster surface and PNG export.

use crate::images::ImageHandle;
use crate::surface::Surface;
use brainboard_core::text::{ApproximateMetrics, TextMetrics};
use kurbo::{BezPath, PathEl, Point, Rect, Size};
use peniko::Color;
use std::io::Cursor;
use thiserror::Error;
use tiny_skia::{
    ColorU8, FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export size {0}x{1}")]
    Size(u32, u32),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// [`Surface`] backed by a [`Pixmap`].
///
/// Text is measured but not drawn; this backend has no font rasterizer.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, ExportError> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(ExportError::Size(width, height))
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA8 at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Encode the surface as an RGBA8 PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let (width, height) = (self.width(), self.height());
        let rgba: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        let image =
            image::RgbaImage::from_raw(width, height, rgba).ok_or(ExportError::Size(width, height))?;
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    fn clear(&mut self, color: Color) {
        let c = color.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        let Some(path) = skia_path(path) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        let Some(path) = skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn fill_text(&mut self, text: &str, _origin: Point, _font_size: f64, _color: Color) {
        log::trace!("raster surface skips text {text:?}");
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        let Some(source) = image.rgba().and_then(|rgba| premultiplied(image.width(), image.height(), rgba))
        else {
            log::debug!("no pixels for {}, skipping", image.url());
            return;
        };
        let sx = dest.width() / f64::from(image.width());
        let sy = dest.height() / f64::from(image.height());
        let transform =
            Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, dest.x0 as f32, dest.y0 as f32);
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &PixmapPaint::default(), transform, None);
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        ApproximateMetrics.text_width(text, font_size)
    }
}

fn paint(color: Color) -> Paint<'static> {
    let c = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Pixmap from straight-alpha RGBA8 pixels.
fn premultiplied(width: u32, height: u32, rgba: &[u8]) -> Option<Pixmap> {
    let size = IntSize::from_wh(width, height)?;
    let data = rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size)
}
