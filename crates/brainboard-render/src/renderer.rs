//! Paints a board onto a [`Surface`].

use crate::images::{ImageCache, ImageLoader, NullLoader};
use crate::raster::{ExportError, PixmapSurface};
use crate::surface::{Surface, SurfaceMetrics};
use brainboard_core::board::BoardState;
use brainboard_core::element::{Element, ElementId, HexColor, Shape};
use brainboard_core::geometry::{HANDLE_PAINT_SIZE, arrow_head, wrap_text};
use brainboard_core::text::{
    NOTE_FIRST_BASELINE, NOTE_FONT_SIZE, NOTE_LINE_HEIGHT, NOTE_PADDING, STICKER_FONT_SIZE,
    TEXT_FONT_SIZE,
};
use kurbo::{BezPath, Circle, Point, Rect, Shape as _};
use peniko::Color;
use std::collections::HashSet;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The board to render.
    pub board: &'a BoardState,
    /// Element to outline with a selection overlay.
    pub selected: Option<ElementId>,
    /// Element still being drawn, painted above everything else.
    pub preview: Option<&'a Element>,
    /// Paint grid lines. Defaults to the board's grid setting.
    pub show_grid: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(board: &'a BoardState) -> Self {
        Self {
            board,
            selected: None,
            preview: None,
            show_grid: board.grid.show_grid,
        }
    }

    pub fn with_selection(mut self, selected: Option<ElementId>) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_preview(mut self, preview: Option<&'a Element>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_grid(mut self, show_grid: bool) -> Self {
        self.show_grid = show_grid;
        self
    }
}

/// Paints boards; owns the image cache and the loader that fills it.
pub struct BoardRenderer<L: ImageLoader = NullLoader> {
    images: ImageCache,
    loader: L,
    background_color: Color,
    grid_color: Color,
    selection_color: Color,
    note_text_color: Color,
}

impl Default for BoardRenderer<NullLoader> {
    fn default() -> Self {
        Self::new(NullLoader)
    }
}

impl<L: ImageLoader> BoardRenderer<L> {
    pub fn new(loader: L) -> Self {
        Self {
            images: ImageCache::new(),
            loader,
            background_color: Color::WHITE,
            grid_color: Color::from_rgba8(224, 224, 224, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            note_text_color: Color::BLACK,
        }
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    /// Paint one full frame.
    pub fn render(&mut self, surface: &mut dyn Surface, ctx: &RenderContext) {
        let board = ctx.board;
        surface.clear(self.background_color);

        if ctx.show_grid {
            self.render_grid(surface, board.grid.size);
        }

        for layer in board.layers().iter().filter(|l| l.visible) {
            for element in &layer.elements {
                self.render_element(surface, element);
            }
        }

        if let Some(preview) = ctx.preview {
            self.render_element(surface, preview);
        }

        if let Some(element) = ctx.selected.and_then(|id| board.active_layer().element(id)) {
            self.render_selection(surface, element);
        }

        self.prune_images(board);
    }

    /// Rasterize the visible layers of `board` into a `width` x `height`
    /// PNG, without grid or selection.
    pub fn export_png(
        &mut self,
        board: &BoardState,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, ExportError> {
        let mut surface = PixmapSurface::new(width, height)?;
        self.render(&mut surface, &RenderContext::new(board).with_grid(false));
        let png = surface.encode_png()?;
        log::info!("exported {width}x{height} PNG ({} bytes)", png.len());
        Ok(png)
    }

    /// Forget images no element on `board` refers to any more.
    fn prune_images(&mut self, board: &BoardState) {
        if self.images.is_empty() {
            return;
        }
        let referenced: HashSet<&str> = board
            .layers()
            .iter()
            .flat_map(|layer| &layer.elements)
            .filter_map(|element| match element.shape() {
                Shape::Image(image) => Some(image.image_url.as_str()),
                _ => None,
            })
            .collect();
        for url in self.images.retain(|url| referenced.contains(url)) {
            self.loader.forget(&url);
        }
    }

    fn render_grid(&self, surface: &mut dyn Surface, grid_size: f64) {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return;
        }
        let size = surface.size();
        let mut path = BezPath::new();

        // Vertical lines
        let mut x = 0.0;
        while x <= size.width {
            path.move_to(Point::new(x, 0.0));
            path.line_to(Point::new(x, size.height));
            x += grid_size;
        }

        // Horizontal lines
        let mut y = 0.0;
        while y <= size.height {
            path.move_to(Point::new(0.0, y));
            path.line_to(Point::new(size.width, y));
            y += grid_size;
        }

        surface.stroke_path(&path, self.grid_color, 1.0);
    }

    fn render_element(&mut self, surface: &mut dyn Surface, element: &Element) {
        if !element.is_well_formed() {
            return;
        }
        let color = paint_color(&element.color);
        let width = f64::from(element.stroke_width);

        match element.shape() {
            Shape::Pen { points } => stroke_polyline(surface, points, color, width),
            Shape::EraserStroke { points } => {
                stroke_polyline(surface, points, self.background_color, width)
            }
            Shape::Arrow { points } => {
                let [start, .., end] = points.as_slice() else {
                    return;
                };
                let (start, end) = (*start, *end);
                let mut shaft = BezPath::new();
                shaft.move_to(start);
                shaft.line_to(end);
                surface.stroke_path(&shaft, color, width);

                let [tip, left, right] = arrow_head(start, end, width);
                let mut head = BezPath::new();
                head.move_to(tip);
                head.line_to(left);
                head.line_to(right);
                head.close_path();
                surface.fill_path(&head, color);
            }
            Shape::Rectangle(geom) => surface.stroke_rect(geom.rect(), color, width),
            Shape::Circle(geom) => {
                let radius = geom.width.abs() / 2.0;
                let center = Point::new(geom.x + geom.width / 2.0, geom.y + geom.width / 2.0);
                surface.stroke_path(&Circle::new(center, radius).to_path(0.1), color, width);
            }
            Shape::Image(image) => {
                // Not loaded yet: skip this frame, the next repaint retries.
                if let Some(handle) = self.images.request(&image.image_url, &mut self.loader) {
                    surface.draw_image(handle, image.bounds.rect());
                }
            }
            Shape::Note(note) => {
                let rect = note.bounds.rect();
                surface.fill_rect(rect, color);
                let max_width = rect.width() - 2.0 * NOTE_PADDING;
                let lines = wrap_text(&note.text, max_width, |line| {
                    surface.measure_text(line, NOTE_FONT_SIZE)
                });
                for (i, line) in lines.iter().enumerate() {
                    let origin = Point::new(
                        rect.x0 + NOTE_PADDING,
                        rect.y0 + NOTE_FIRST_BASELINE + i as f64 * NOTE_LINE_HEIGHT,
                    );
                    surface.fill_text(line, origin, NOTE_FONT_SIZE, self.note_text_color);
                }
            }
            Shape::Text { anchor, text } => surface.fill_text(text, *anchor, TEXT_FONT_SIZE, color),
            Shape::Sticker { anchor, token } => {
                surface.fill_text(token, *anchor, STICKER_FONT_SIZE, color)
            }
        }
    }

    fn render_selection(&self, surface: &mut dyn Surface, element: &Element) {
        let Some(bounds) = element.bounds(&SurfaceMetrics(&*surface)) else {
            return;
        };
        surface.stroke_rect(bounds.inflate(2.0, 2.0), self.selection_color, 1.0);

        let half = HANDLE_PAINT_SIZE / 2.0;
        let corners = [
            Point::new(bounds.x0, bounds.y0),
            Point::new(bounds.x1, bounds.y0),
            Point::new(bounds.x1, bounds.y1),
            Point::new(bounds.x0, bounds.y1),
        ];
        for corner in corners {
            let handle = Rect::new(corner.x - half, corner.y - half, corner.x + half, corner.y + half);
            surface.fill_rect(handle, self.selection_color);
        }
    }
}

/// Element color, or the default ink if it does not parse.
fn paint_color(color: &HexColor) -> Color {
    color.to_color().unwrap_or_else(|| {
        log::debug!("unparseable color {}, using default ink", color.as_str());
        HexColor::default().to_color().unwrap_or(Color::BLACK)
    })
}

fn stroke_polyline(surface: &mut dyn Surface, points: &[Point], color: Color, width: f64) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    let mut path = BezPath::new();
    path.move_to(first);
    if rest.is_empty() {
        // Single click: a zero-length segment still shows as a round dot.
        path.line_to(first);
    }
    for &p in rest {
        path.line_to(p);
    }
    surface.stroke_path(&path, color, width);
}
