//! Tool selection and per-user tool settings.

use crate::element::{DEFAULT_STROKE_WIDTH, HexColor};
use serde::{Deserialize, Serialize};

/// Default eraser radius in pixels.
pub const DEFAULT_ERASER_RADIUS: f64 = 10.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Select,
    #[default]
    Pen,
    Rectangle,
    Circle,
    Text,
    Sticker,
    Image,
    Arrow,
    Note,
    Eraser,
}

impl ToolKind {
    /// Tools that enter the drawing state on pointer-down.
    pub fn is_drawing(self) -> bool {
        matches!(
            self,
            ToolKind::Pen | ToolKind::Arrow | ToolKind::Rectangle | ToolKind::Circle
        )
    }

    /// Tools that ask a content collaborator for input before inserting.
    pub fn is_placement(self) -> bool {
        matches!(
            self,
            ToolKind::Text | ToolKind::Sticker | ToolKind::Image | ToolKind::Note
        )
    }
}

/// Current tool plus the style applied to new elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub color: HexColor,
    pub stroke_width: u32,
    pub eraser_radius: f64,
    pub note_color: HexColor,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            color: HexColor::default(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            eraser_radius: DEFAULT_ERASER_RADIUS,
            note_color: HexColor::new(HexColor::NOTE_YELLOW),
        }
    }
}
