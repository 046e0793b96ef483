//! Pointer-driven tool state machine.
//!
//! The engine turns pointer events into element creation, selection, drag,
//! resize and erase operations on a [`BoardState`]. It owns only transient
//! interaction state; everything persistent lives on the board.

use crate::board::BoardState;
use crate::element::{
    BoxGeom, Element, ElementId, ImageShape, LOCAL_OWNER_ID, NoteShape, Shape,
};
use crate::geometry::{Corner, HANDLE_HIT_SIZE, distance, resize_handle_at};
use crate::layer::LayerId;
use crate::tools::ToolKind;
use kurbo::{Point, Size, Vec2};
use std::f64::consts::SQRT_2;

/// Smallest width or height a resize can produce.
pub const MIN_RESIZE_SIZE: f64 = 20.0;

/// Smallest radius a circle resize can produce.
pub const MIN_CIRCLE_RADIUS: f64 = 20.0;

/// Size of a freshly placed note.
pub const DEFAULT_NOTE_SIZE: Size = Size::new(200.0, 150.0);

/// Size of a freshly placed image.
pub const DEFAULT_IMAGE_SIZE: Size = Size::new(200.0, 200.0);

/// Transient interaction state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A pen, arrow or box element is being drawn.
    Drawing { element: Element, anchor: Point },
    /// An element follows the pointer.
    Dragging {
        id: ElementId,
        offset: Vec2,
        original: Element,
    },
    /// A box element is being resized from `corner`; `fixed` is the
    /// opposite corner.
    Resizing {
        id: ElementId,
        corner: Corner,
        fixed: Point,
        original: Element,
    },
}

/// Content supplied by the text/sticker/image/note input collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementContent {
    Text(String),
    Sticker(String),
    Image { url: String },
    Note(String),
}

/// A placement tool was clicked and is waiting for content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub tool: ToolKind,
    pub position: Point,
}

/// What an input event did.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A drawing gesture started.
    DrawStarted,
    /// An element was selected; on an unlocked layer a drag or resize is
    /// now in progress.
    Selected(ElementId),
    SelectionCleared,
    /// A finalized element was appended to `layer_id`.
    Added { layer_id: LayerId, element: Element },
    /// An existing element changed in place.
    Updated(ElementId),
    /// An erase gesture removed `count` elements.
    Erased { count: usize },
    /// The UI should collect content for a discrete placement.
    PlacementRequested(PlacementRequest),
    /// The gesture targeted a locked layer and was ignored.
    LayerLocked,
}

/// The tool state machine.
#[derive(Debug, Clone)]
pub struct Engine {
    state: InteractionState,
    selected: Option<ElementId>,
    pending: Option<PlacementRequest>,
    handle_hit_size: f64,
    owner_id: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(HANDLE_HIT_SIZE)
    }
}

impl Engine {
    /// Create a new idle engine.
    pub fn new(handle_hit_size: f64) -> Self {
        Self {
            state: InteractionState::Idle,
            selected: None,
            pending: None,
            handle_hit_size,
            owner_id: LOCAL_OWNER_ID,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn pending_placement(&self) -> Option<PlacementRequest> {
        self.pending
    }

    /// The element being drawn, for preview painting.
    pub fn preview(&self) -> Option<&Element> {
        match &self.state {
            InteractionState::Drawing { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, board: &mut BoardState, tool: ToolKind) {
        self.cancel(board);
        board.tools.tool = tool;
    }

    /// Abandon the current gesture, restoring a dragged or resized element
    /// to its original geometry.
    pub fn cancel(&mut self, board: &mut BoardState) {
        match std::mem::take(&mut self.state) {
            InteractionState::Dragging { original, .. }
            | InteractionState::Resizing { original, .. } => {
                board.layers_mut().active_mut().replace(original);
            }
            InteractionState::Drawing { .. } | InteractionState::Idle => {}
        }
        self.pending = None;
    }

    /// Forget the selection, e.g. after the board was cleared remotely.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn pointer_down(&mut self, board: &mut BoardState, raw: Point) -> Option<EngineEvent> {
        let point = board.snap(raw);
        let tool = board.tools.tool;

        if tool.is_drawing() && board.note_at(point).is_some() {
            return None;
        }

        match tool {
            ToolKind::Select => self.begin_select(board, point),
            ToolKind::Eraser => self.erase_at(board, point),
            _ if board.is_active_locked() => Some(EngineEvent::LayerLocked),
            _ if tool.is_placement() => {
                let request = PlacementRequest {
                    tool,
                    position: point,
                };
                self.pending = Some(request);
                Some(EngineEvent::PlacementRequested(request))
            }
            _ => {
                let shape = match tool {
                    ToolKind::Pen => Shape::Pen { points: vec![point] },
                    ToolKind::Arrow => Shape::Arrow { points: vec![point] },
                    ToolKind::Rectangle => Shape::Rectangle(BoxGeom::new(point.x, point.y, 0.0, 0.0)),
                    _ => Shape::Circle(BoxGeom::new(point.x, point.y, 0.0, 0.0)),
                };
                let element = Element::new(
                    shape,
                    board.tools.color.clone(),
                    board.tools.stroke_width,
                    self.owner_id,
                );
                self.state = InteractionState::Drawing {
                    element,
                    anchor: point,
                };
                Some(EngineEvent::DrawStarted)
            }
        }
    }

    fn begin_select(&mut self, board: &mut BoardState, point: Point) -> Option<EngineEvent> {
        let layer = board.active_layer();

        // Handles of the current selection win over whatever lies beneath.
        // Elsewhere a box's handle zones count as part of the box.
        let on_selected_handle = self
            .selected
            .and_then(|id| layer.element(id))
            .filter(|e| e.is_well_formed())
            .and_then(|e| self.handle_at(e, point).map(|c| (e.clone(), c)));

        let (target, corner) = match on_selected_handle {
            Some((element, corner)) => (element, Some(corner)),
            None => match layer.topmost(|e| e.hit_test(point) || self.handle_at(e, point).is_some()) {
                Some(hit) => (hit.clone(), self.handle_at(hit, point)),
                None => {
                    self.selected = None;
                    return Some(EngineEvent::SelectionCleared);
                }
            },
        };

        let id = target.id();
        self.selected = Some(id);
        if layer.locked {
            return Some(EngineEvent::Selected(id));
        }

        self.state = match (corner, target.box_geom()) {
            (Some(corner), Some(geom)) => InteractionState::Resizing {
                id,
                corner,
                fixed: corner.opposite().of(geom.rect()),
                original: target,
            },
            _ => match target.anchor() {
                Some(anchor) => InteractionState::Dragging {
                    id,
                    offset: point - anchor,
                    original: target,
                },
                None => InteractionState::Idle,
            },
        };
        Some(EngineEvent::Selected(id))
    }

    /// Resize handle under `point`, for kinds that can be resized.
    fn handle_at(&self, element: &Element, point: Point) -> Option<Corner> {
        let geom = element.box_geom()?;
        resize_handle_at(point, geom.rect(), self.handle_hit_size)
    }

    pub fn pointer_move(&mut self, board: &mut BoardState, raw: Point) -> Option<EngineEvent> {
        let point = board.snap(raw);

        if matches!(self.state, InteractionState::Drawing { .. }) && board.note_at(point).is_some() {
            return self.pointer_up(board);
        }

        let vanished = match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Drawing { element, anchor } => {
                extend_drawing(element, *anchor, point);
                None
            }
            InteractionState::Dragging {
                id,
                offset,
                original,
            } => original.anchor().and_then(|start| {
                let delta = (point - *offset) - start;
                let mut moved = original.clone();
                moved.translate(delta);
                (!board.layers_mut().active_mut().replace(moved)).then_some(*id)
            }),
            InteractionState::Resizing {
                id,
                corner,
                fixed,
                original,
            } => {
                let is_circle = matches!(original.shape(), Shape::Circle(_));
                let mut resized = original.clone();
                resized.set_box(resized_box(*corner, *fixed, point, is_circle));
                (!board.layers_mut().active_mut().replace(resized)).then_some(*id)
            }
        };
        if let Some(id) = vanished {
            log::debug!("element {id} vanished mid-gesture");
            self.state = InteractionState::Idle;
        }
        None
    }

    pub fn pointer_up(&mut self, board: &mut BoardState) -> Option<EngineEvent> {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => None,
            InteractionState::Drawing { element, .. } => {
                let layer_id = board.layers().active_id().to_string();
                if !board.insert_element(element.clone()) {
                    return Some(EngineEvent::LayerLocked);
                }
                Some(EngineEvent::Added { layer_id, element })
            }
            InteractionState::Dragging { id, original, .. }
            | InteractionState::Resizing { id, original, .. } => {
                let changed = board
                    .active_layer()
                    .element(id)
                    .is_some_and(|current| *current != original);
                if !changed {
                    return None;
                }
                board.commit();
                Some(EngineEvent::Updated(id))
            }
        }
    }

    /// Remove every element of the active layer the eraser touches at
    /// `point`, as one history entry.
    pub fn erase_at(&mut self, board: &mut BoardState, point: Point) -> Option<EngineEvent> {
        if board.is_active_locked() {
            return Some(EngineEvent::LayerLocked);
        }
        let radius = board.tools.eraser_radius;
        let count = board
            .layers_mut()
            .active_mut()
            .remove_where(|e| e.erase_hit(point, radius));
        if count == 0 {
            return None;
        }
        if let Some(id) = self.selected {
            if board.active_layer().element(id).is_none() {
                self.selected = None;
            }
        }
        board.commit();
        Some(EngineEvent::Erased { count })
    }

    /// Finish a pending placement with content from the input collaborator.
    ///
    /// Empty text is treated as a cancelled placement.
    pub fn confirm_placement(
        &mut self,
        board: &mut BoardState,
        content: PlacementContent,
    ) -> Option<EngineEvent> {
        let request = self.pending.take()?;
        let at = request.position;

        let mut color = board.tools.color.clone();
        let shape = match content {
            PlacementContent::Text(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                Shape::Text { anchor: at, text }
            }
            PlacementContent::Sticker(token) => {
                if token.is_empty() {
                    return None;
                }
                Shape::Sticker { anchor: at, token }
            }
            PlacementContent::Image { url } => {
                if url.is_empty() {
                    return None;
                }
                Shape::Image(ImageShape {
                    bounds: BoxGeom::new(at.x, at.y, DEFAULT_IMAGE_SIZE.width, DEFAULT_IMAGE_SIZE.height),
                    image_url: url,
                })
            }
            PlacementContent::Note(text) => {
                color = board.tools.note_color.clone();
                Shape::Note(NoteShape {
                    bounds: BoxGeom::new(at.x, at.y, DEFAULT_NOTE_SIZE.width, DEFAULT_NOTE_SIZE.height),
                    text,
                })
            }
        };

        let element = Element::new(shape, color, board.tools.stroke_width, self.owner_id);
        let layer_id = board.layers().active_id().to_string();
        if !board.insert_element(element.clone()) {
            return Some(EngineEvent::LayerLocked);
        }
        Some(EngineEvent::Added { layer_id, element })
    }

    pub fn cancel_placement(&mut self) {
        self.pending = None;
    }
}

fn extend_drawing(element: &mut Element, anchor: Point, point: Point) {
    if let Some(points) = element.path_mut() {
        points.push(point);
        return;
    }
    let geom = match element.shape() {
        Shape::Circle(_) => {
            let diameter = 2.0 * distance(anchor, point);
            BoxGeom::new(anchor.x, anchor.y, diameter, diameter)
        }
        _ => BoxGeom::new(anchor.x, anchor.y, point.x - anchor.x, point.y - anchor.y),
    };
    element.set_box(geom);
}

/// Box spanned by the fixed corner and the pointer, growing towards
/// `corner`. Never flips and never shrinks below [`MIN_RESIZE_SIZE`], or
/// [`MIN_CIRCLE_RADIUS`] for circles.
fn resized_box(corner: Corner, fixed: Point, pointer: Point, is_circle: bool) -> BoxGeom {
    let dir = corner.direction();
    let (width, height) = if is_circle {
        let side = (distance(fixed, pointer) / SQRT_2).max(2.0 * MIN_CIRCLE_RADIUS);
        (side, side)
    } else {
        (
            (dir.x * (pointer.x - fixed.x)).max(MIN_RESIZE_SIZE),
            (dir.y * (pointer.y - fixed.y)).max(MIN_RESIZE_SIZE),
        )
    };
    let x = if dir.x > 0.0 { fixed.x } else { fixed.x - width };
    let y = if dir.y > 0.0 { fixed.y } else { fixed.y - height };
    BoxGeom::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, HexColor};
    use crate::layer::DEFAULT_LAYER_ID;

    fn board_with(tool: ToolKind) -> BoardState {
        let mut board = BoardState::default();
        board.tools.tool = tool;
        board
    }

    fn draw_rect(engine: &mut Engine, board: &mut BoardState, from: Point, to: Point) -> Element {
        board.tools.tool = ToolKind::Rectangle;
        engine.pointer_down(board, from);
        engine.pointer_move(board, to);
        match engine.pointer_up(board) {
            Some(EngineEvent::Added { element, .. }) => element,
            other => panic!("expected Added, got {other:?}"),
        }
    }

    #[test]
    fn test_pen_stroke_undo_redo() {
        let mut board = board_with(ToolKind::Pen);
        board.tools.color = HexColor::new("#ff0000");
        let mut engine = Engine::default();

        assert_eq!(engine.pointer_down(&mut board, Point::new(0.0, 0.0)), Some(EngineEvent::DrawStarted));
        engine.pointer_move(&mut board, Point::new(10.0, 10.0));
        engine.pointer_move(&mut board, Point::new(20.0, 0.0));
        let added = engine.pointer_up(&mut board);
        assert!(matches!(added, Some(EngineEvent::Added { ref layer_id, .. }) if layer_id == DEFAULT_LAYER_ID));

        let elements = &board.active_layer().elements;
        assert_eq!(elements.len(), 1);
        let stroke = elements[0].clone();
        assert_eq!(
            stroke.path().unwrap(),
            &[Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)]
        );

        assert!(board.undo());
        assert!(board.active_layer().elements.is_empty());
        assert!(board.redo());
        let restored = &board.active_layer().elements[0];
        assert_eq!(restored.path(), stroke.path());
        assert_eq!(restored.color.as_str(), "#ff0000");
    }

    #[test]
    fn test_rectangle_negative_extent() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(100.0, 100.0), Point::new(40.0, 60.0));
        let geom = rect.box_geom().unwrap();
        assert!((geom.width + 60.0).abs() < f64::EPSILON);
        assert!((geom.height + 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_diameter_from_drag() {
        let mut board = board_with(ToolKind::Circle);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(0.0, 0.0));
        engine.pointer_move(&mut board, Point::new(30.0, 40.0));
        engine.pointer_up(&mut board);
        let geom = board.active_layer().elements[0].box_geom().unwrap();
        assert_eq!(geom, BoxGeom::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_click_without_drag_keeps_degenerate_box() {
        let mut board = board_with(ToolKind::Rectangle);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(5.0, 5.0));
        assert!(matches!(engine.pointer_up(&mut board), Some(EngineEvent::Added { .. })));
        assert_eq!(board.active_layer().elements[0].box_geom().unwrap().width, 0.0);
    }

    #[test]
    fn test_pointer_coordinates_are_snapped() {
        let mut board = board_with(ToolKind::Pen);
        board.grid.snap_to_grid = true;
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(9.0, 31.0));
        engine.pointer_move(&mut board, Point::new(52.0, 48.0));
        engine.pointer_up(&mut board);
        assert_eq!(
            board.active_layer().elements[0].path().unwrap(),
            &[Point::new(0.0, 40.0), Point::new(60.0, 40.0)]
        );
    }

    #[test]
    fn test_select_and_drag() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(10.0, 10.0), Point::new(110.0, 60.0));

        board.tools.tool = ToolKind::Select;
        assert_eq!(engine.pointer_down(&mut board, Point::new(50.0, 30.0)), Some(EngineEvent::Selected(rect.id())));
        engine.pointer_move(&mut board, Point::new(70.0, 50.0));
        assert_eq!(engine.pointer_up(&mut board), Some(EngineEvent::Updated(rect.id())));

        let moved = board.active_layer().element(rect.id()).unwrap().box_geom().unwrap();
        assert_eq!(moved, BoxGeom::new(30.0, 30.0, 100.0, 50.0));
        assert!(board.undo());
        let back = board.active_layer().element(rect.id()).unwrap().box_geom().unwrap();
        assert_eq!(back, BoxGeom::new(10.0, 10.0, 100.0, 50.0));
    }

    #[test]
    fn test_click_without_move_pushes_no_history() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        draw_rect(&mut engine, &mut board, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
        let entries = board.history().len();

        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(50.0, 30.0));
        assert_eq!(engine.pointer_up(&mut board), None);
        assert_eq!(board.history().len(), entries);
    }

    #[test]
    fn test_select_topmost_first() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let top = draw_rect(&mut engine, &mut board, Point::new(40.0, 40.0), Point::new(140.0, 140.0));

        board.tools.tool = ToolKind::Select;
        assert_eq!(engine.pointer_down(&mut board, Point::new(50.0, 50.0)), Some(EngineEvent::Selected(top.id())));
    }

    #[test]
    fn test_miss_clears_selection() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(50.0, 50.0));
        engine.pointer_up(&mut board);
        assert!(engine.selected().is_some());
        assert_eq!(engine.pointer_down(&mut board, Point::new(500.0, 500.0)), Some(EngineEvent::SelectionCleared));
        assert_eq!(engine.selected(), None);
        assert_eq!(*engine.state(), InteractionState::Idle);
    }

    #[test]
    fn test_resize_from_corner_keeps_opposite_fixed() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));

        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(99.0, 101.0));
        assert!(matches!(engine.state(), InteractionState::Resizing { corner: Corner::BottomRight, .. }));
        engine.pointer_move(&mut board, Point::new(150.0, 130.0));
        engine.pointer_up(&mut board);
        let geom = board.active_layer().element(rect.id()).unwrap().box_geom().unwrap();
        assert_eq!(geom, BoxGeom::new(0.0, 0.0, 150.0, 130.0));

        // Top-left handle: bottom-right stays put, size is clamped.
        engine.pointer_down(&mut board, Point::new(2.0, 2.0));
        engine.pointer_move(&mut board, Point::new(200.0, 200.0));
        engine.pointer_up(&mut board);
        let geom = board.active_layer().element(rect.id()).unwrap().box_geom().unwrap();
        assert_eq!(geom, BoxGeom::new(130.0, 110.0, MIN_RESIZE_SIZE, MIN_RESIZE_SIZE));
    }

    #[test]
    fn test_circle_resize_stays_square() {
        let mut board = board_with(ToolKind::Circle);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(0.0, 0.0));
        engine.pointer_move(&mut board, Point::new(50.0, 0.0));
        engine.pointer_up(&mut board);

        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(100.0, 100.0));
        engine.pointer_move(&mut board, Point::new(200.0, 150.0));
        engine.pointer_up(&mut board);
        let geom = board.active_layer().elements[0].box_geom().unwrap();
        assert!((geom.width - geom.height).abs() < f64::EPSILON);
        let expected = (200.0f64.powi(2) + 150.0f64.powi(2)).sqrt() / SQRT_2;
        assert!((geom.width - expected).abs() < 1e-9);
    }

    #[test]
    fn test_circle_resize_minimum_radius() {
        let mut board = board_with(ToolKind::Circle);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(0.0, 0.0));
        engine.pointer_move(&mut board, Point::new(50.0, 0.0));
        engine.pointer_up(&mut board);

        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(100.0, 100.0));
        engine.pointer_move(&mut board, Point::new(10.0, 10.0));
        engine.pointer_up(&mut board);
        let geom = board.active_layer().elements[0].box_geom().unwrap();
        assert_eq!(geom, BoxGeom::new(0.0, 0.0, 2.0 * MIN_CIRCLE_RADIUS, 2.0 * MIN_CIRCLE_RADIUS));
    }

    #[test]
    fn test_resize_rectangle_drawn_backwards() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(100.0, 100.0), Point::new(0.0, 0.0));
        assert_eq!(rect.box_geom().unwrap(), BoxGeom::new(100.0, 100.0, -100.0, -100.0));

        // The visual top-left corner is a handle even though it is the
        // drag end, and the visual bottom-right stays fixed.
        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(1.0, 1.0));
        assert!(matches!(
            engine.state(),
            InteractionState::Resizing { corner: Corner::TopLeft, fixed, .. } if *fixed == Point::new(100.0, 100.0)
        ));
        engine.pointer_move(&mut board, Point::new(-50.0, -20.0));
        assert_eq!(engine.pointer_up(&mut board), Some(EngineEvent::Updated(rect.id())));
        let geom = board.active_layer().element(rect.id()).unwrap().box_geom().unwrap();
        assert_eq!(geom, BoxGeom::new(-50.0, -20.0, 150.0, 120.0));
    }

    #[test]
    fn test_selected_handle_wins_over_element_above() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let below = draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let above = draw_rect(&mut engine, &mut board, Point::new(80.0, 80.0), Point::new(200.0, 200.0));

        board.tools.tool = ToolKind::Select;
        assert_eq!(engine.pointer_down(&mut board, Point::new(50.0, 50.0)), Some(EngineEvent::Selected(below.id())));
        engine.pointer_up(&mut board);

        // (100, 100) is inside `above`, but it is also the selected box's corner.
        assert_eq!(engine.pointer_down(&mut board, Point::new(100.0, 100.0)), Some(EngineEvent::Selected(below.id())));
        assert!(matches!(
            engine.state(),
            InteractionState::Resizing { id, corner: Corner::BottomRight, .. } if *id == below.id()
        ));
        engine.pointer_up(&mut board);

        // Without a selection on that corner, the topmost box wins.
        engine.clear_selection();
        assert_eq!(engine.pointer_down(&mut board, Point::new(100.0, 100.0)), Some(EngineEvent::Selected(above.id())));
    }

    #[test]
    fn test_locked_layer_blocks_engine() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        board.set_layer_locked(DEFAULT_LAYER_ID, true);

        board.tools.tool = ToolKind::Pen;
        assert_eq!(engine.pointer_down(&mut board, Point::new(300.0, 300.0)), Some(EngineEvent::LayerLocked));

        board.tools.tool = ToolKind::Select;
        assert_eq!(engine.pointer_down(&mut board, Point::new(50.0, 50.0)), Some(EngineEvent::Selected(rect.id())));
        engine.pointer_move(&mut board, Point::new(80.0, 80.0));
        assert_eq!(engine.pointer_up(&mut board), None);
        assert_eq!(board.active_layer().elements[0], rect);

        assert_eq!(engine.erase_at(&mut board, Point::new(50.0, 50.0)), Some(EngineEvent::LayerLocked));
        assert_eq!(board.active_layer().elements.len(), 1);
    }

    #[test]
    fn test_erase_monotonic() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        draw_rect(&mut engine, &mut board, Point::new(300.0, 300.0), Point::new(400.0, 400.0));
        board.tools.tool = ToolKind::Pen;
        engine.pointer_down(&mut board, Point::new(45.0, 200.0));
        engine.pointer_move(&mut board, Point::new(55.0, 200.0));
        engine.pointer_up(&mut board);
        let entries = board.history().len();

        let p = Point::new(50.0, 50.0);
        let before = board.active_layer().elements.len();
        assert_eq!(engine.erase_at(&mut board, p), Some(EngineEvent::Erased { count: 1 }));
        let after = &board.active_layer().elements;
        assert!(after.len() <= before);
        let radius = board.tools.eraser_radius;
        assert!(after.iter().all(|e| !e.erase_hit(p, radius)));
        assert_eq!(board.history().len(), entries + 1);

        assert_eq!(engine.erase_at(&mut board, Point::new(1000.0, 1000.0)), None);
    }

    #[test]
    fn test_placement_flow() {
        let mut board = board_with(ToolKind::Note);
        let mut engine = Engine::default();
        let event = engine.pointer_down(&mut board, Point::new(10.0, 20.0));
        assert!(matches!(event, Some(EngineEvent::PlacementRequested(PlacementRequest { tool: ToolKind::Note, .. }))));

        let added = engine.confirm_placement(&mut board, PlacementContent::Note("ship it".to_string()));
        let Some(EngineEvent::Added { element, .. }) = added else {
            panic!("expected Added");
        };
        assert_eq!(element.kind(), ElementKind::Note);
        assert_eq!(element.color.as_str(), HexColor::NOTE_YELLOW);
        assert_eq!(element.box_geom().unwrap(), BoxGeom::new(10.0, 20.0, 200.0, 150.0));
        assert!(engine.pending_placement().is_none());
        assert!(engine.confirm_placement(&mut board, PlacementContent::Text("late".into())).is_none());
    }

    #[test]
    fn test_empty_text_placement_is_dropped() {
        let mut board = board_with(ToolKind::Text);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(10.0, 20.0));
        assert!(engine.confirm_placement(&mut board, PlacementContent::Text("  ".into())).is_none());
        assert!(board.active_layer().elements.is_empty());
    }

    #[test]
    fn test_note_precedence_over_draw_start() {
        let mut board = board_with(ToolKind::Note);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(0.0, 0.0));
        engine.confirm_placement(&mut board, PlacementContent::Note(String::new()));

        board.tools.tool = ToolKind::Pen;
        assert_eq!(engine.pointer_down(&mut board, Point::new(50.0, 50.0)), None);
        assert_eq!(*engine.state(), InteractionState::Idle);
    }

    #[test]
    fn test_drawing_into_note_finalizes() {
        let mut board = board_with(ToolKind::Note);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(100.0, 0.0));
        engine.confirm_placement(&mut board, PlacementContent::Note(String::new()));

        board.tools.tool = ToolKind::Pen;
        engine.pointer_down(&mut board, Point::new(0.0, 50.0));
        engine.pointer_move(&mut board, Point::new(50.0, 50.0));
        let event = engine.pointer_move(&mut board, Point::new(150.0, 50.0));
        let Some(EngineEvent::Added { element, .. }) = event else {
            panic!("expected Added");
        };
        assert_eq!(element.path().unwrap().len(), 2);
        assert_eq!(*engine.state(), InteractionState::Idle);
        assert_eq!(engine.pointer_up(&mut board), None);
    }

    #[test]
    fn test_resize_handles_only_for_box_kinds() {
        let mut board = board_with(ToolKind::Pen);
        let mut engine = Engine::default();
        engine.pointer_down(&mut board, Point::new(0.0, 0.0));
        engine.pointer_move(&mut board, Point::new(100.0, 100.0));
        engine.pointer_up(&mut board);

        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(100.0, 100.0));
        assert!(matches!(engine.state(), InteractionState::Dragging { .. }));
    }

    #[test]
    fn test_cancel_restores_dragged_element() {
        let mut board = BoardState::default();
        let mut engine = Engine::default();
        let rect = draw_rect(&mut engine, &mut board, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        board.tools.tool = ToolKind::Select;
        engine.pointer_down(&mut board, Point::new(50.0, 50.0));
        engine.pointer_move(&mut board, Point::new(90.0, 90.0));
        engine.set_tool(&mut board, ToolKind::Pen);
        assert_eq!(board.active_layer().elements[0], rect);
        assert_eq!(board.tools.tool, ToolKind::Pen);
    }
}
