//! A surface that records draw calls instead of rasterizing them.

use crate::images::ImageHandle;
use crate::surface::Surface;
use brainboard_core::text::{ApproximateMetrics, TextMetrics};
use kurbo::{BezPath, PathEl, Point, Rect, Size};
use peniko::Color;

/// One recorded draw call. Colors are stored as RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear([u8; 4]),
    StrokePath {
        path: Vec<PathEl>,
        color: [u8; 4],
        width: f64,
    },
    FillPath {
        path: Vec<PathEl>,
        color: [u8; 4],
    },
    FillText {
        text: String,
        origin: Point,
        font_size: f64,
        color: [u8; 4],
    },
    DrawImage {
        url: String,
        dest: Rect,
    },
}

fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// Records every call; measures text with [`ApproximateMetrics`].
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded frame, leaving the surface empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Every text string drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(rgba(color)));
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.elements().to_vec(),
            color: rgba(color),
            width,
        });
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::FillPath {
            path: path.elements().to_vec(),
            color: rgba(color),
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            origin,
            font_size,
            color: rgba(color),
        });
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        self.commands.push(DrawCommand::DrawImage {
            url: image.url().to_string(),
            dest,
        });
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        ApproximateMetrics.text_width(text, font_size)
    }
}
