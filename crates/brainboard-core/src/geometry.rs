//! Geometry and hit-testing primitives.
//!
//! Everything in this module is a pure function of its inputs. Coordinates are
//! canvas-surface pixels (after device-pixel-ratio scaling).

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Grid size for snapping (matches the painted grid).
pub const GRID_SIZE: f64 = 20.0;

/// Half-extent of a resize handle's hit zone.
pub const HANDLE_HIT_SIZE: f64 = 8.0;

/// Side of the painted resize handle squares.
pub const HANDLE_PAINT_SIZE: f64 = 8.0;

/// Shortest arrowhead, regardless of stroke width.
pub const ARROW_HEAD_MIN_LENGTH: f64 = 25.0;

/// Arrowhead length per unit of stroke width.
pub const ARROW_HEAD_STROKE_SCALE: f64 = 5.0;

/// Half-angle between the shaft and each arrowhead barb.
pub const ARROW_HEAD_HALF_ANGLE: f64 = PI / 6.0;

/// Corner of a bounding box, used for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    #[serde(rename = "nw")]
    TopLeft,
    #[serde(rename = "ne")]
    TopRight,
    #[serde(rename = "sw")]
    BottomLeft,
    #[serde(rename = "se")]
    BottomRight,
}

impl Corner {
    /// Test order for overlapping hit zones.
    pub const PRECEDENCE: [Corner; 4] = [
        Corner::BottomRight,
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Position of this corner on a (normalized) rectangle.
    pub fn of(self, rect: Rect) -> Point {
        let rect = rect.abs();
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }

    /// Unit direction pointing from the opposite corner towards this one.
    pub fn direction(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

/// Snap a point to the nearest grid intersection.
///
/// Identity when `enabled` is false.
pub fn snap_to_grid(point: Point, grid_size: f64, enabled: bool) -> Point {
    if !enabled {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Axis-aligned bounding box of a path.
///
/// A single-point path yields a zero-area box; an empty path yields `None`.
pub fn bounding_box_of_path(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let init = Rect::new(first.x, first.y, first.x, first.y);
    Some(points.iter().skip(1).fold(init, |acc, p| {
        Rect::new(
            acc.x0.min(p.x),
            acc.y0.min(p.y),
            acc.x1.max(p.x),
            acc.y1.max(p.y),
        )
    }))
}

/// Euclidean distance.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Strictly closer than `radius`.
pub fn is_near(point: Point, target: Point, radius: f64) -> bool {
    distance(point, target) < radius
}

/// Inclusive containment; the rectangle is normalized first so boxes drawn
/// up/left of their anchor behave the same as the others.
pub fn point_in_rect(point: Point, rect: Rect) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Inclusive circle containment.
pub fn point_in_circle(point: Point, center: Point, radius: f64) -> bool {
    distance(point, center) <= radius
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    distance(point, a + seg * t)
}

/// The four edges of a rectangle, clockwise from the top.
pub fn rect_edges(rect: Rect) -> [(Point, Point); 4] {
    let rect = rect.abs();
    let tl = Point::new(rect.x0, rect.y0);
    let tr = Point::new(rect.x1, rect.y0);
    let br = Point::new(rect.x1, rect.y1);
    let bl = Point::new(rect.x0, rect.y1);
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

/// Corners and edge midpoints of a rectangle.
pub fn rect_landmarks(rect: Rect) -> [Point; 8] {
    let rect = rect.abs();
    let center = rect.center();
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x0, rect.y1),
        Point::new(rect.x1, rect.y1),
        Point::new(center.x, rect.y0),
        Point::new(center.x, rect.y1),
        Point::new(rect.x0, center.y),
        Point::new(rect.x1, center.y),
    ]
}

/// Which resize handle (if any) lies under `point`.
///
/// Each handle is a square of half-extent `handle_hit_size` centered on a
/// corner of `bbox`. Corners are tested in [`Corner::PRECEDENCE`] order.
pub fn resize_handle_at(point: Point, bbox: Rect, handle_hit_size: f64) -> Option<Corner> {
    Corner::PRECEDENCE.into_iter().find(|corner| {
        let c = corner.of(bbox);
        (point.x - c.x).abs() <= handle_hit_size && (point.y - c.y).abs() <= handle_hit_size
    })
}

/// Greedy word wrap.
///
/// Words accumulate on a line while `measure(line + " " + word)` fits in
/// `max_width`. A word wider than `max_width` sits alone on its own line and
/// is never split.
pub fn wrap_text<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Arrowhead triangle `[tip, left barb, right barb]` for a shaft from `start`
/// to `end`.
pub fn arrow_head(start: Point, end: Point, stroke_width: f64) -> [Point; 3] {
    let length = (stroke_width * ARROW_HEAD_STROKE_SCALE).max(ARROW_HEAD_MIN_LENGTH);
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let barb = |offset: f64| {
        Point::new(
            end.x - length * (angle + offset).cos(),
            end.y - length * (angle + offset).sin(),
        )
    };
    [end, barb(-ARROW_HEAD_HALF_ANGLE), barb(ARROW_HEAD_HALF_ANGLE)]
}
