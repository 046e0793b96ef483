//! Board state: layers, history, tool settings and grid, plus its
//! persisted form.

use crate::config::BoardConfig;
use crate::element::{Element, ElementId, ElementKind, HexColor};
use crate::geometry::{point_in_rect, snap_to_grid};
use crate::history::{History, Snapshot};
use crate::layer::{Layer, LayerId, LayerMove, LayerStack};
use crate::storage::{StorageError, StorageResult};
use crate::tools::ToolSettings;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Grid display and snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub size: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            show_grid: false,
            snap_to_grid: false,
            size: crate::geometry::GRID_SIZE,
        }
    }
}

/// Everything one board session owns.
///
/// History always describes the active layer. Switching or deleting the
/// active layer re-seeds it from the new active layer's elements.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    layers: LayerStack,
    history: History,
    pub tools: ToolSettings,
    pub grid: GridSettings,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}

impl BoardState {
    /// Create a new board with one empty layer.
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            layers: LayerStack::default(),
            history: History::new(Vec::new(), config.history_limit),
            tools: ToolSettings {
                eraser_radius: config.eraser_radius,
                ..ToolSettings::default()
            },
            grid: GridSettings {
                size: config.grid_size,
                ..GridSettings::default()
            },
        }
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn active_layer(&self) -> &Layer {
        self.layers.active()
    }

    pub fn is_active_locked(&self) -> bool {
        self.layers.active().locked
    }

    /// Apply grid snapping if it is enabled.
    pub fn snap(&self, point: Point) -> Point {
        snap_to_grid(point, self.grid.size, self.grid.snap_to_grid)
    }

    /// Total element count across every layer.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(|l| l.elements.len()).sum()
    }

    /// Push the active layer's elements as a new history entry.
    pub(crate) fn commit(&mut self) {
        let snapshot = self.layers.active().elements.clone();
        self.history.push(snapshot);
    }

    fn reseed_history(&mut self) {
        let snapshot = self.layers.active().elements.clone();
        self.history.reset(snapshot);
    }

    /// Step the active layer back one history entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.layers.active_mut().elements = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Step the active layer forward one history entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.layers.active_mut().elements = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Append a finished element to the active layer and record it.
    ///
    /// Refused on a locked layer.
    pub fn insert_element(&mut self, element: Element) -> bool {
        if self.is_active_locked() {
            log::debug!("refusing insert on locked layer {}", self.layers.active_id());
            return false;
        }
        self.layers.active_mut().elements.push(element);
        self.commit();
        true
    }

    /// Mutate one element of the active layer and record the result if
    /// anything changed. Returns false if the element is missing, the layer
    /// is locked, or `f` left the element untouched.
    pub fn update_element(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) -> bool {
        if self.is_active_locked() {
            log::debug!("refusing update on locked layer {}", self.layers.active_id());
            return false;
        }
        let Some(element) = self.layers.active_mut().element_mut(id) else {
            return false;
        };
        let before = element.clone();
        f(element);
        if *element == before {
            return false;
        }
        self.commit();
        true
    }

    /// Change an element's color.
    pub fn recolor(&mut self, id: ElementId, color: HexColor) -> bool {
        self.update_element(id, |e| e.color = color)
    }

    /// Replace the text of a note or text element, or a sticker's token.
    pub fn retext(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update_element(id, |e| {
            e.set_text(text);
        })
    }

    /// Topmost note in the active layer containing `point`.
    pub fn note_at(&self, point: Point) -> Option<ElementId> {
        self.layers
            .active()
            .topmost(|e| {
                e.kind() == ElementKind::Note
                    && e.box_geom().is_some_and(|b| point_in_rect(point, b.rect()))
            })
            .map(Element::id)
    }

    /// Append a new layer and make it active.
    pub fn add_layer(&mut self) -> LayerId {
        let id = self.layers.add();
        self.reseed_history();
        id
    }

    pub fn delete_layer(&mut self, id: &str) -> bool {
        let was_active = self.layers.active_id() == id;
        if !self.layers.delete(id) {
            return false;
        }
        if was_active {
            self.reseed_history();
        }
        true
    }

    pub fn select_layer(&mut self, id: &str) -> bool {
        if self.layers.active_id() == id {
            return self.layers.get(id).is_some();
        }
        if !self.layers.select(id) {
            return false;
        }
        self.reseed_history();
        true
    }

    pub fn set_layer_visible(&mut self, id: &str, visible: bool) -> bool {
        self.layers.set_visible(id, visible)
    }

    pub fn set_layer_locked(&mut self, id: &str, locked: bool) -> bool {
        self.layers.set_locked(id, locked)
    }

    pub fn move_layer(&mut self, id: &str, direction: LayerMove) -> bool {
        self.layers.move_layer(id, direction)
    }

    /// Empty every layer and record an empty snapshot.
    pub fn clear_board(&mut self) {
        self.layers.clear_all();
        self.commit();
    }

    /// Empty the active layer only. Refused on a locked layer.
    pub fn clear_active_layer(&mut self) -> bool {
        if self.is_active_locked() {
            return false;
        }
        self.layers.active_mut().elements.clear();
        self.commit();
        true
    }

    /// Append an element that arrived from a remote collaborator.
    ///
    /// Goes to the addressed layer, or the active layer if that layer is
    /// unknown here. Bypasses history. Elements whose id is already on the
    /// board are ignored.
    pub fn apply_remote_draw(&mut self, element: Element, layer_id: &str) -> bool {
        if self.layers.find(element.id()).is_some() {
            log::debug!("ignoring duplicate remote element {}", element.id());
            return false;
        }
        match self.layers.get_mut(layer_id) {
            Some(layer) => layer.elements.push(element),
            None => {
                log::debug!("remote layer {layer_id} unknown, using active layer");
                self.layers.active_mut().elements.push(element);
            }
        }
        true
    }

    /// A remote collaborator cleared the board: empty every layer and drop
    /// all history.
    pub fn apply_remote_clear(&mut self) {
        self.layers.clear_all();
        self.history.reset(Vec::new());
    }

    /// Persisted form of this board.
    pub fn to_persisted(&self) -> PersistedBoard {
        PersistedBoard {
            layers: self.layers.layers().to_vec(),
            active_layer_id: self.layers.active_id().to_string(),
            history: self.history.entries().to_vec(),
            history_index: self.history.cursor(),
            current_color: self.tools.color.clone(),
            line_width: self.tools.stroke_width,
            show_grid: self.grid.show_grid,
            snap_to_grid: self.grid.snap_to_grid,
        }
    }

    /// Rebuild a board from its persisted form. Returns `None` if the layer
    /// list is empty, the active layer is missing, or the history cursor is
    /// out of range.
    pub fn from_persisted(persisted: PersistedBoard, config: &BoardConfig) -> Option<Self> {
        let layers = LayerStack::from_parts(persisted.layers, persisted.active_layer_id)?;
        let history =
            History::from_parts(persisted.history, persisted.history_index, config.history_limit)?;
        let mut board = Self::new(config);
        board.layers = layers;
        board.history = history;
        board.tools.color = persisted.current_color;
        board.tools.stroke_width = persisted.line_width.max(1);
        board.grid.show_grid = persisted.show_grid;
        board.grid.snap_to_grid = persisted.snap_to_grid;
        Some(board)
    }

    /// Compact JSON used for persistence.
    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(&self.to_persisted())?)
    }

    /// Pretty-printed JSON for export.
    pub fn export_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_persisted())?)
    }

    /// Parse an exported board. Does not fall back to a default board.
    pub fn import_json(json: &str, config: &BoardConfig) -> StorageResult<Self> {
        let persisted: PersistedBoard = serde_json::from_str(json)?;
        Self::from_persisted(persisted, config).ok_or_else(|| {
            StorageError::Serialization("inconsistent board state".to_string())
        })
    }

    /// Parse persisted state, falling back to an empty board if it is
    /// malformed.
    pub fn from_json_or_default(json: &str, config: &BoardConfig) -> Self {
        match Self::import_json(json, config) {
            Ok(board) => board,
            Err(e) => {
                log::warn!("discarding malformed board state: {e}");
                Self::new(config)
            }
        }
    }
}

/// Serialized board shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBoard {
    pub layers: Vec<Layer>,
    pub active_layer_id: LayerId,
    pub history: Vec<Snapshot>,
    pub history_index: usize,
    pub current_color: HexColor,
    pub line_width: u32,
    #[serde(default)]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
}
