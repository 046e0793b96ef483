//! Drawable elements.
//!
//! An [`Element`] carries the fields every kind shares; the kind-specific
//! geometry lives in [`Shape`], so a note's text or a pen's path is only
//! reachable after matching on the variant.

use crate::geometry::{
    bounding_box_of_path, distance, is_near, point_in_rect, point_to_segment_dist, rect_edges,
    rect_landmarks,
};
use crate::text::{STICKER_FONT_SIZE, TEXT_FONT_SIZE, TextMetrics, glyph_box};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Author id of the local user.
pub const LOCAL_OWNER_ID: u32 = 1;

/// Default stroke width for new elements.
pub const DEFAULT_STROKE_WIDTH: u32 = 2;

/// Select-tool proximity radius for path kinds.
pub const PATH_SELECT_RADIUS: f64 = 10.0;

/// Select-tool proximity radius for glyph kinds.
pub const GLYPH_SELECT_RADIUS: f64 = 20.0;

/// Generate a new time-ordered element id.
pub fn new_element_id() -> ElementId {
    Uuid::now_v7()
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

fn default_owner_id() -> u32 {
    LOCAL_OWNER_ID
}

/// A CSS-style hex color string (`#rgb`, `#rrggbb` or `#rrggbbaa`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub const DEFAULT_INK: &'static str = "#4B5563";
    pub const NOTE_YELLOW: &'static str = "#FFEB3B";
    pub const BACKGROUND: &'static str = "#FFFFFF";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a peniko color. Returns `None` for anything that is not a
    /// well-formed hex color.
    pub fn to_color(&self) -> Option<Color> {
        let hex = self.0.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let nibble = |i: usize| {
            u8::from_str_radix(hex.get(i..i + 1)?, 16)
                .ok()
                .map(|v| v * 17)
        };
        match hex.len() {
            3 => Some(Color::from_rgba8(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
            6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INK)
    }
}

impl From<&str> for HexColor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Axis-aligned box geometry. Width and height may be negative while a box
/// is being drawn up or left of its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxGeom {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxGeom {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle covering the box.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// An image placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageShape {
    #[serde(flatten)]
    pub bounds: BoxGeom,
    pub image_url: String,
}

/// A sticky note: a filled box with wrapped text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteShape {
    #[serde(flatten)]
    pub bounds: BoxGeom,
    #[serde(default)]
    pub text: String,
}

/// Kind-specific element geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Shape {
    Pen {
        points: Vec<Point>,
    },
    Rectangle(BoxGeom),
    /// Square box; the radius is `width / 2`.
    Circle(BoxGeom),
    Text {
        anchor: Point,
        text: String,
    },
    Sticker {
        anchor: Point,
        #[serde(rename = "stickerToken")]
        token: String,
    },
    Image(ImageShape),
    Arrow {
        points: Vec<Point>,
    },
    Note(NoteShape),
    /// A path painted in the background color.
    EraserStroke {
        points: Vec<Point>,
    },
}

/// Element kind without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Pen,
    Rectangle,
    Circle,
    Text,
    Sticker,
    Image,
    Arrow,
    Note,
    EraserStroke,
}

impl ElementKind {
    /// Whether the kind is described by a bounding box.
    pub fn is_box(self) -> bool {
        matches!(
            self,
            ElementKind::Rectangle | ElementKind::Circle | ElementKind::Image | ElementKind::Note
        )
    }
}

impl Shape {
    pub fn kind(&self) -> ElementKind {
        match self {
            Shape::Pen { .. } => ElementKind::Pen,
            Shape::Rectangle(_) => ElementKind::Rectangle,
            Shape::Circle(_) => ElementKind::Circle,
            Shape::Text { .. } => ElementKind::Text,
            Shape::Sticker { .. } => ElementKind::Sticker,
            Shape::Image(_) => ElementKind::Image,
            Shape::Arrow { .. } => ElementKind::Arrow,
            Shape::Note(_) => ElementKind::Note,
            Shape::EraserStroke { .. } => ElementKind::EraserStroke,
        }
    }

    fn path(&self) -> Option<&[Point]> {
        match self {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                Some(points)
            }
            _ => None,
        }
    }

    fn box_geom(&self) -> Option<&BoxGeom> {
        match self {
            Shape::Rectangle(b) | Shape::Circle(b) => Some(b),
            Shape::Image(image) => Some(&image.bounds),
            Shape::Note(note) => Some(&note.bounds),
            _ => None,
        }
    }

    fn box_geom_mut(&mut self) -> Option<&mut BoxGeom> {
        match self {
            Shape::Rectangle(b) | Shape::Circle(b) => Some(b),
            Shape::Image(image) => Some(&mut image.bounds),
            Shape::Note(note) => Some(&mut note.bounds),
            _ => None,
        }
    }
}

/// One drawable object on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    id: ElementId,
    pub color: HexColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    #[serde(default = "default_owner_id")]
    pub owner_id: u32,
    #[serde(flatten)]
    shape: Shape,
}

impl Element {
    /// Create a new element with a fresh id.
    pub fn new(shape: Shape, color: HexColor, stroke_width: u32, owner_id: u32) -> Self {
        Self {
            id: new_element_id(),
            color,
            stroke_width: stroke_width.max(1),
            owner_id,
            shape,
        }
    }

    /// Create a new element with the local user's defaults.
    pub fn local(shape: Shape) -> Self {
        Self::new(shape, HexColor::default(), DEFAULT_STROKE_WIDTH, LOCAL_OWNER_ID)
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Path points for pen, arrow and eraser strokes.
    pub fn path(&self) -> Option<&[Point]> {
        self.shape.path()
    }

    /// Box geometry for rectangles, circles, images and notes.
    pub fn box_geom(&self) -> Option<BoxGeom> {
        self.shape.box_geom().copied()
    }

    /// Whether the element carries everything its kind needs to be painted
    /// and hit-tested.
    pub fn is_well_formed(&self) -> bool {
        let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
        match &self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                !points.is_empty() && points.iter().all(finite)
            }
            Shape::Rectangle(b) | Shape::Circle(b) => b.is_finite(),
            Shape::Image(image) => image.bounds.is_finite() && !image.image_url.is_empty(),
            Shape::Note(note) => note.bounds.is_finite(),
            Shape::Text { anchor, .. } | Shape::Sticker { anchor, .. } => finite(anchor),
        }
    }

    /// Reference point used for dragging: first path point, box origin, or
    /// glyph anchor.
    pub fn anchor(&self) -> Option<Point> {
        match &self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                points.first().copied()
            }
            Shape::Text { anchor, .. } | Shape::Sticker { anchor, .. } => Some(*anchor),
            shape => shape.box_geom().map(BoxGeom::origin),
        }
    }

    /// Move the anchor and every path point by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                for p in points.iter_mut() {
                    *p += delta;
                }
            }
            Shape::Text { anchor, .. } | Shape::Sticker { anchor, .. } => *anchor += delta,
            shape => {
                if let Some(b) = shape.box_geom_mut() {
                    b.x += delta.x;
                    b.y += delta.y;
                }
            }
        }
    }

    /// Replace the box geometry. Circles keep height equal to width.
    ///
    /// Returns false for kinds without a box.
    pub fn set_box(&mut self, geom: BoxGeom) -> bool {
        let is_circle = matches!(self.shape, Shape::Circle(_));
        match self.shape.box_geom_mut() {
            Some(b) => {
                *b = geom;
                if is_circle {
                    b.height = b.width;
                }
                true
            }
            None => false,
        }
    }

    /// Path to push points onto while drawing.
    pub(crate) fn path_mut(&mut self) -> Option<&mut Vec<Point>> {
        match &mut self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                Some(points)
            }
            _ => None,
        }
    }

    /// Replace text content. Notes and text take `text`; stickers take their
    /// token. Returns false for other kinds.
    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match &mut self.shape {
            Shape::Text { text, .. } | Shape::Note(NoteShape { text, .. }) => {
                *text = value.into();
                true
            }
            Shape::Sticker { token, .. } => {
                *token = value.into();
                true
            }
            _ => false,
        }
    }

    /// Bounding box in canvas coordinates. Glyph kinds are measured with
    /// `metrics`.
    pub fn bounds(&self, metrics: &dyn TextMetrics) -> Option<Rect> {
        match &self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                bounding_box_of_path(points)
            }
            Shape::Circle(b) => Some(BoxGeom::new(b.x, b.y, b.width, b.width).rect()),
            Shape::Text { anchor, text } => Some(glyph_box(
                *anchor,
                metrics.text_width(text, TEXT_FONT_SIZE),
                TEXT_FONT_SIZE,
            )),
            Shape::Sticker { anchor, token } => Some(glyph_box(
                *anchor,
                metrics.text_width(token, STICKER_FONT_SIZE),
                STICKER_FONT_SIZE,
            )),
            shape => shape.box_geom().map(BoxGeom::rect),
        }
    }

    /// Select-tool hit test.
    pub fn hit_test(&self, point: Point) -> bool {
        if !self.is_well_formed() {
            return false;
        }
        match &self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                points.iter().any(|p| is_near(point, *p, PATH_SELECT_RADIUS))
            }
            Shape::Text { anchor, .. } | Shape::Sticker { anchor, .. } => {
                is_near(point, *anchor, GLYPH_SELECT_RADIUS)
            }
            shape => shape
                .box_geom()
                .is_some_and(|b| point_in_rect(point, b.rect())),
        }
    }

    /// Eraser predicate: whether an eraser of `radius` at `point` removes
    /// this element.
    pub fn erase_hit(&self, point: Point, radius: f64) -> bool {
        if !self.is_well_formed() {
            return false;
        }
        match &self.shape {
            Shape::Pen { points } | Shape::Arrow { points } | Shape::EraserStroke { points } => {
                points.iter().any(|p| is_near(point, *p, radius))
            }
            Shape::Text { anchor, .. } | Shape::Sticker { anchor, .. } => {
                is_near(point, *anchor, radius)
            }
            Shape::Circle(b) => {
                let r = b.width.abs() / 2.0;
                let center = Point::new(b.x + b.width / 2.0, b.y + b.width / 2.0);
                let d = distance(point, center);
                d < radius || (d - r).abs() < radius
            }
            shape => shape.box_geom().is_some_and(|b| {
                let rect = b.rect();
                rect_landmarks(rect).iter().any(|p| is_near(point, *p, radius))
                    || point_in_rect(point, rect)
                    || rect_edges(rect)
                        .iter()
                        .any(|(a, c)| point_to_segment_dist(point, *a, *c) < radius)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproximateMetrics;

    fn rect_element(x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::local(Shape::Rectangle(BoxGeom::new(x, y, w, h)))
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = Element::local(Shape::Pen { points: vec![Point::ZERO] });
        let b = Element::local(Shape::Pen { points: vec![Point::ZERO] });
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_hex_color_parsing() {
        let c = HexColor::new("#ff0000").to_color().unwrap().to_rgba8();
        assert_eq!((c.r, c.g, c.b, c.a), (255, 0, 0, 255));
        let c = HexColor::new("#0f08").to_color();
        assert!(c.is_none());
        let c = HexColor::new("#0f0").to_color().unwrap().to_rgba8();
        assert_eq!((c.r, c.g, c.b), (0, 255, 0));
        assert!(HexColor::new("red").to_color().is_none());
        assert!(HexColor::new("#zzzzzz").to_color().is_none());
    }

    #[test]
    fn test_serde_shape() {
        let el = Element::new(
            Shape::Sticker {
                anchor: Point::new(5.0, 6.0),
                token: "⭐".to_string(),
            },
            HexColor::new("#000000"),
            2,
            1,
        );
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["kind"], "sticker");
        assert_eq!(json["stickerToken"], "⭐");
        assert_eq!(json["strokeWidth"], 2);
        assert_eq!(json["ownerId"], 1);

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn test_serde_box_kinds_flatten() {
        let el = Element::local(Shape::Image(ImageShape {
            bounds: BoxGeom::new(1.0, 2.0, 200.0, 200.0),
            image_url: "https://example.com/cat.png".to_string(),
        }));
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["imageUrl"], "https://example.com/cat.png");
        assert_eq!(json["width"], 200.0);

        let eraser: Element = serde_json::from_str(
            r##"{"id":"018f3a4e-0000-7000-8000-000000000001","color":"#ffffff","kind":"eraser-stroke","points":[{"x":1.0,"y":2.0}]}"##,
        )
        .unwrap();
        assert_eq!(eraser.kind(), ElementKind::EraserStroke);
        assert_eq!(eraser.stroke_width, DEFAULT_STROKE_WIDTH);
    }

    #[test]
    fn test_rectangle_hit_test() {
        let el = rect_element(10.0, 10.0, 100.0, 50.0);
        assert!(el.hit_test(Point::new(50.0, 30.0)));
        assert!(!el.hit_test(Point::new(200.0, 30.0)));
    }

    #[test]
    fn test_pen_hit_test_radius() {
        let el = Element::local(Shape::Pen {
            points: vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)],
        });
        assert!(el.hit_test(Point::new(52.0, 5.0)));
        assert!(!el.hit_test(Point::new(25.0, 0.0)));
    }

    #[test]
    fn test_glyph_hit_test_radius() {
        let el = Element::local(Shape::Text {
            anchor: Point::new(100.0, 100.0),
            text: "hello".to_string(),
        });
        assert!(el.hit_test(Point::new(115.0, 100.0)));
        assert!(!el.hit_test(Point::new(120.0, 100.0)));
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let el = Element::local(Shape::Pen { points: vec![] });
        assert!(!el.is_well_formed());
        assert!(!el.hit_test(Point::ZERO));
        assert!(!el.erase_hit(Point::ZERO, 100.0));
        assert!(el.anchor().is_none());
    }

    #[test]
    fn test_translate_moves_every_point() {
        let mut el = Element::local(Shape::Arrow {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        });
        el.translate(Vec2::new(5.0, -5.0));
        assert_eq!(el.path().unwrap(), &[Point::new(5.0, -5.0), Point::new(15.0, 5.0)]);
    }

    #[test]
    fn test_circle_set_box_forces_square() {
        let mut el = Element::local(Shape::Circle(BoxGeom::new(0.0, 0.0, 40.0, 40.0)));
        assert!(el.set_box(BoxGeom::new(0.0, 0.0, 60.0, 10.0)));
        assert_eq!(el.box_geom().unwrap(), BoxGeom::new(0.0, 0.0, 60.0, 60.0));

        let mut pen = Element::local(Shape::Pen { points: vec![Point::ZERO] });
        assert!(!pen.set_box(BoxGeom::default()));
    }

    #[test]
    fn test_erase_rectangle() {
        let el = rect_element(0.0, 0.0, 100.0, 100.0);
        // Inside.
        assert!(el.erase_hit(Point::new(50.0, 50.0), 10.0));
        // Near an edge, away from any landmark.
        assert!(el.erase_hit(Point::new(25.0, -5.0), 10.0));
        // Outside and far.
        assert!(!el.erase_hit(Point::new(150.0, 50.0), 10.0));
    }

    #[test]
    fn test_erase_circle_ring_and_center() {
        let el = Element::local(Shape::Circle(BoxGeom::new(0.0, 0.0, 100.0, 100.0)));
        assert!(el.erase_hit(Point::new(50.0, 50.0), 10.0));
        assert!(el.erase_hit(Point::new(50.0, 3.0), 10.0));
        assert!(!el.erase_hit(Point::new(50.0, 25.0), 10.0));
    }

    #[test]
    fn test_glyph_bounds() {
        let el = Element::local(Shape::Sticker {
            anchor: Point::new(10.0, 100.0),
            token: "ab".to_string(),
        });
        let bounds = el.bounds(&ApproximateMetrics).unwrap();
        assert!((bounds.y0 - 68.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 2.0 * 32.0 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_set_text() {
        let mut note = Element::local(Shape::Note(NoteShape {
            bounds: BoxGeom::new(0.0, 0.0, 200.0, 150.0),
            text: String::new(),
        }));
        assert!(note.set_text("todo"));
        assert!(matches!(note.shape(), Shape::Note(n) if n.text == "todo"));
        let mut rect = rect_element(0.0, 0.0, 1.0, 1.0);
        assert!(!rect.set_text("nope"));
    }
}
