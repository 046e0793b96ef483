//! One embedded board: board state, tool engine, persistence and
//! collaboration wired together.
//!
//! The host forwards pointer input and calls [`Brainboard::tick`] from its
//! frame loop. Failures never escape input handlers; they are logged and
//! queued as [`Notice`]s for the UI.

use crate::board::BoardState;
use crate::collab::{
    BridgeMessage, Channel, CollaborationBridge, Collaborator, LOCAL_USER_ID, Presence,
    PresenceSimulator,
};
use crate::config::BoardConfig;
use crate::element::{Element, ElementId, HexColor};
use crate::engine::{Engine, EngineEvent, PlacementContent};
use crate::layer::{LayerId, LayerMove};
use crate::storage::{AutoSaveManager, BlobStore};
use crate::tools::ToolKind;
use kurbo::Point;
use std::sync::Arc;
use std::time::Duration;

/// Palette handed to invited collaborators, in order.
const COLLABORATOR_COLORS: [&str; 4] = ["#33FF57", "#3357FF", "#F333FF", "#FF33A8"];

/// Something the UI may want to tell the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The collaboration channel opened.
    Connected,
    /// Persisting the board failed.
    SaveFailed(String),
    /// Sending to collaborators failed.
    BroadcastFailed(String),
    /// A collaborator cleared the board.
    BoardCleared { by: u32 },
}

/// An embedded board session.
pub struct Brainboard<S: BlobStore> {
    config: BoardConfig,
    board: BoardState,
    engine: Engine,
    autosave: AutoSaveManager<S>,
    bridge: Option<CollaborationBridge>,
    presence: Presence,
    simulator: Option<PresenceSimulator>,
    notices: Vec<Notice>,
    was_connected: bool,
    closed: bool,
}

impl<S: BlobStore> Brainboard<S> {
    /// Open the board named by `config`, restoring it from `store` if a
    /// usable save exists.
    pub fn open(config: BoardConfig, store: Arc<S>) -> Self {
        let mut autosave = AutoSaveManager::new(store, &config);
        let board = autosave.restore(&config);
        log::info!(
            "opened board {} with {} elements",
            config.board_id,
            board.element_count()
        );
        Self {
            engine: Engine::new(config.handle_hit_size),
            config,
            board,
            autosave,
            bridge: None,
            presence: Presence::default(),
            simulator: None,
            notices: Vec::new(),
            was_connected: false,
            closed: false,
        }
    }

    /// Attach a collaboration channel. The board id is the namespace.
    pub fn connect(&mut self, channel: Box<dyn Channel>) {
        if let Some(mut old) = self.bridge.take() {
            old.close();
        }
        self.was_connected = false;
        self.bridge = Some(CollaborationBridge::new(channel, self.config.board_id.clone()));
    }

    /// Drive simulated peers with `simulator`.
    pub fn simulate_presence(&mut self, simulator: PresenceSimulator) {
        self.simulator = Some(simulator);
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.engine.selected()
    }

    pub fn is_connected(&self) -> bool {
        self.bridge.as_ref().is_some_and(CollaborationBridge::is_connected)
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn pointer_down(&mut self, point: Point) -> Option<EngineEvent> {
        let event = self.engine.pointer_down(&mut self.board, point);
        self.handle(event)
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<EngineEvent> {
        self.presence.apply_move(LOCAL_USER_ID, point);
        let event = self.engine.pointer_move(&mut self.board, point);
        self.handle(event)
    }

    pub fn pointer_up(&mut self) -> Option<EngineEvent> {
        let event = self.engine.pointer_up(&mut self.board);
        self.handle(event)
    }

    pub fn confirm_placement(&mut self, content: PlacementContent) -> Option<EngineEvent> {
        let event = self.engine.confirm_placement(&mut self.board, content);
        self.handle(event)
    }

    pub fn cancel_placement(&mut self) {
        self.engine.cancel_placement();
    }

    /// Insert a fully formed element, e.g. an eraser stroke, into the active
    /// layer and broadcast it.
    pub fn insert_element(&mut self, element: Element) -> bool {
        let layer_id = self.board.layers().active_id().to_string();
        if !self.board.insert_element(element.clone()) {
            return false;
        }
        self.handle(Some(EngineEvent::Added { layer_id, element }));
        true
    }

    /// Topmost note under `point`, for double-click editing.
    pub fn note_at(&self, point: Point) -> Option<ElementId> {
        self.board.note_at(point)
    }

    pub fn retext(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        let changed = self.board.retext(id, text);
        self.persist_if(changed)
    }

    pub fn recolor(&mut self, id: ElementId, color: HexColor) -> bool {
        let changed = self.board.recolor(id, color);
        self.persist_if(changed)
    }

    pub fn undo(&mut self) -> bool {
        self.engine.cancel(&mut self.board);
        let changed = self.board.undo();
        self.persist_if(changed)
    }

    pub fn redo(&mut self) -> bool {
        self.engine.cancel(&mut self.board);
        let changed = self.board.redo();
        self.persist_if(changed)
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.engine.set_tool(&mut self.board, tool);
    }

    pub fn set_color(&mut self, color: HexColor) {
        self.board.tools.color = color;
        self.autosave.mark_dirty();
    }

    pub fn set_stroke_width(&mut self, width: u32) {
        self.board.tools.stroke_width = width.max(1);
        self.autosave.mark_dirty();
    }

    pub fn set_eraser_radius(&mut self, radius: f64) {
        self.board.tools.eraser_radius = radius.max(1.0);
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.board.grid.show_grid = show;
        self.autosave.mark_dirty();
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.board.grid.snap_to_grid = snap;
        self.autosave.mark_dirty();
    }

    pub fn add_layer(&mut self) -> LayerId {
        self.engine.cancel(&mut self.board);
        let id = self.board.add_layer();
        self.persist();
        id
    }

    pub fn delete_layer(&mut self, id: &str) -> bool {
        self.engine.cancel(&mut self.board);
        let changed = self.board.delete_layer(id);
        self.persist_if(changed)
    }

    pub fn select_layer(&mut self, id: &str) -> bool {
        self.engine.cancel(&mut self.board);
        self.engine.clear_selection();
        let changed = self.board.select_layer(id);
        self.persist_if(changed)
    }

    pub fn set_layer_visible(&mut self, id: &str, visible: bool) -> bool {
        let changed = self.board.set_layer_visible(id, visible);
        self.persist_if(changed)
    }

    pub fn set_layer_locked(&mut self, id: &str, locked: bool) -> bool {
        let changed = self.board.set_layer_locked(id, locked);
        self.persist_if(changed)
    }

    pub fn move_layer(&mut self, id: &str, direction: LayerMove) -> bool {
        let changed = self.board.move_layer(id, direction);
        self.persist_if(changed)
    }

    /// Empty every layer and tell collaborators to do the same.
    pub fn clear_board(&mut self) {
        self.engine.cancel(&mut self.board);
        self.engine.clear_selection();
        self.board.clear_board();
        self.persist();
        self.broadcast(&BridgeMessage::Clear {
            user_id: LOCAL_USER_ID,
        });
    }

    /// Empty the active layer only.
    pub fn clear_active_layer(&mut self) -> bool {
        self.engine.cancel(&mut self.board);
        let changed = self.board.clear_active_layer();
        self.persist_if(changed)
    }

    /// Add a simulated collaborator and return its id, or `None` if the
    /// roster has no free id left.
    pub fn invite(&mut self, name: impl Into<String>, position: Point) -> Option<u32> {
        let id = self.presence.next_id()?;
        let color = COLLABORATOR_COLORS[(id as usize) % COLLABORATOR_COLORS.len()];
        self.presence.upsert(Collaborator {
            id,
            name: name.into(),
            color: HexColor::new(color),
            position,
            online: true,
        });
        if let Some(simulator) = &mut self.simulator {
            simulator.add_peer(id, position);
        }
        Some(id)
    }

    /// Mark a collaborator online or offline. Offline peers stop wandering.
    pub fn set_collaborator_online(&mut self, id: u32, online: bool) -> bool {
        if !self.presence.set_online(id, online) {
            return false;
        }
        if let Some(simulator) = &mut self.simulator {
            match (online, self.presence.get(id)) {
                (true, Some(user)) => simulator.add_peer(id, user.position),
                _ => simulator.remove_peer(id),
            }
        }
        true
    }

    pub fn export_json(&self) -> Option<String> {
        match self.board.export_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::error!("export failed: {e}");
                None
            }
        }
    }

    /// Replace the board with an exported one.
    pub fn import_json(&mut self, json: &str) -> crate::storage::StorageResult<()> {
        let board = BoardState::import_json(json, &self.config)?;
        self.engine.cancel(&mut self.board);
        self.engine.clear_selection();
        self.board = board;
        self.persist();
        Ok(())
    }

    /// Advance timers: channel delivery, simulated presence and the
    /// periodic autosave.
    pub fn tick(&mut self, dt: Duration) {
        let inbound = match &mut self.bridge {
            Some(bridge) => bridge.poll(dt),
            None => Vec::new(),
        };
        let connected = self.is_connected();
        if connected && !self.was_connected {
            self.notices.push(Notice::Connected);
        }
        self.was_connected = connected;

        for message in inbound {
            self.apply_remote(message);
        }

        let simulated = match &mut self.simulator {
            Some(simulator) => simulator.tick(dt),
            None => Vec::new(),
        };
        for message in simulated {
            self.apply_remote(message);
        }

        match self.autosave.maybe_save(&self.board) {
            Ok(true) => log::debug!("autosaved {}", self.autosave.key()),
            Ok(false) => {}
            Err(e) => self.save_failed(e.to_string()),
        }
    }

    /// Apply one message received from a collaborator.
    pub fn apply_remote(&mut self, message: BridgeMessage) {
        match message {
            BridgeMessage::Draw { element, layer_id } => {
                if self.board.apply_remote_draw(element, &layer_id) {
                    self.autosave.mark_dirty();
                }
            }
            BridgeMessage::UserMove { user_id, x, y } => {
                if !self.presence.apply_move(user_id, Point::new(x, y)) {
                    log::debug!("ignoring move of unknown user {user_id}");
                }
            }
            BridgeMessage::Clear { user_id } => {
                self.engine.cancel(&mut self.board);
                self.engine.clear_selection();
                self.board.apply_remote_clear();
                self.notices.push(Notice::BoardCleared { by: user_id });
                self.persist();
            }
        }
    }

    /// Save and disconnect. Called automatically on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.engine.cancel(&mut self.board);
        self.persist();
        if let Some(bridge) = &mut self.bridge {
            bridge.close();
        }
        log::info!("closed board {}", self.config.board_id);
    }

    fn handle(&mut self, event: Option<EngineEvent>) -> Option<EngineEvent> {
        match &event {
            Some(EngineEvent::Added { layer_id, element }) => {
                self.persist();
                self.broadcast(&BridgeMessage::Draw {
                    element: element.clone(),
                    layer_id: layer_id.clone(),
                });
            }
            Some(EngineEvent::Updated(_) | EngineEvent::Erased { .. }) => self.persist(),
            _ => {}
        }
        event
    }

    fn broadcast(&mut self, message: &BridgeMessage) {
        let Some(bridge) = &mut self.bridge else {
            return;
        };
        if let Err(e) = bridge.broadcast(message) {
            log::warn!("broadcast failed: {e}");
            self.notices.push(Notice::BroadcastFailed(e.to_string()));
        }
    }

    fn persist_if(&mut self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&mut self) {
        self.autosave.mark_dirty();
        if let Err(e) = self.autosave.save(&self.board) {
            self.save_failed(e.to_string());
        }
    }

    fn save_failed(&mut self, message: String) {
        log::error!("saving {} failed: {message}", self.autosave.key());
        self.notices.push(Notice::SaveFailed(message));
    }
}

impl<S: BlobStore> Drop for Brainboard<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{LoopbackChannel, ECHO_DELAY, OPEN_DELAY};
    use crate::storage::{MemoryStore, StorageError, StorageResult};

    fn session() -> (Brainboard<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Brainboard::open(BoardConfig::for_board("test"), store.clone()), store)
    }

    fn stroke(board: &mut Brainboard<MemoryStore>, from: Point, to: Point) -> Option<EngineEvent> {
        board.set_tool(ToolKind::Pen);
        board.pointer_down(from);
        board.pointer_move(to);
        board.pointer_up()
    }

    #[test]
    fn test_every_mutation_is_saved() {
        let (mut board, store) = session();
        stroke(&mut board, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        let saved = store.load("whiteboard_test").unwrap().unwrap();
        let restored = BoardState::import_json(&saved, board.config()).unwrap();
        assert_eq!(restored.element_count(), 1);

        board.undo();
        let saved = store.load("whiteboard_test").unwrap().unwrap();
        let restored = BoardState::import_json(&saved, board.config()).unwrap();
        assert_eq!(restored.element_count(), 0);
    }

    #[test]
    fn test_reopen_restores_board() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut board = Brainboard::open(BoardConfig::for_board("keep"), store.clone());
            stroke(&mut board, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
            board.set_show_grid(true);
        }
        let board = Brainboard::open(BoardConfig::for_board("keep"), store);
        assert_eq!(board.board().element_count(), 1);
        assert!(board.board().grid.show_grid);
        assert!(board.board().history().can_undo());
    }

    #[test]
    fn test_malformed_save_opens_default_board() {
        let store = Arc::new(MemoryStore::new());
        store.save("whiteboard_bad", "{{{{").unwrap();
        let board = Brainboard::open(BoardConfig::for_board("bad"), store);
        assert_eq!(board.board(), &BoardState::new(board.config()));
    }

    #[test]
    fn test_draw_is_broadcast_and_echo_deduplicated() {
        let (mut board, _store) = session();
        board.connect(Box::new(LoopbackChannel::seeded("test", 5)));
        board.tick(OPEN_DELAY);
        assert!(board.is_connected());
        assert_eq!(board.take_notices(), vec![Notice::Connected]);

        stroke(&mut board, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        board.tick(ECHO_DELAY);
        assert_eq!(board.board().element_count(), 1);
        assert!(board.take_notices().is_empty());
    }

    #[test]
    fn test_remote_messages() {
        let (mut board, _store) = session();
        let remote = Element::new(
            crate::element::Shape::Pen {
                points: vec![Point::new(1.0, 1.0)],
            },
            HexColor::new("#123456"),
            2,
            3,
        );
        board.apply_remote(BridgeMessage::Draw {
            element: remote,
            layer_id: "default".to_string(),
        });
        assert_eq!(board.board().element_count(), 1);
        assert!(!board.board().history().can_undo());

        board.apply_remote(BridgeMessage::UserMove { user_id: 3, x: 5.0, y: 6.0 });
        assert_eq!(board.presence().online_count(), 1);
        let id = board.invite("Alex", Point::ZERO).unwrap();
        board.apply_remote(BridgeMessage::UserMove { user_id: id, x: 5.0, y: 6.0 });
        assert_eq!(board.presence().get(id).unwrap().position, Point::new(5.0, 6.0));

        board.apply_remote(BridgeMessage::Clear { user_id: 3 });
        assert_eq!(board.board().element_count(), 0);
        assert_eq!(board.take_notices(), vec![Notice::BoardCleared { by: 3 }]);
    }

    #[test]
    fn test_simulated_peers_wander() {
        let (mut board, _store) = session();
        board.simulate_presence(PresenceSimulator::seeded(board.config().presence_interval(), 11));
        let id = board.invite("Alex", Point::new(200.0, 200.0)).unwrap();
        assert_eq!(board.presence().online_count(), 2);

        board.tick(Duration::from_secs(2));
        let peer = board.presence().get(id).unwrap();
        assert_ne!(peer.position, Point::new(200.0, 200.0));
        assert!((peer.position.x - 200.0).abs() <= 10.0);
    }

    #[test]
    fn test_offline_peers_stop_wandering() {
        let (mut board, _store) = session();
        board.simulate_presence(PresenceSimulator::seeded(board.config().presence_interval(), 3));
        let id = board.invite("Alex", Point::new(200.0, 200.0)).unwrap();
        assert!(board.set_collaborator_online(id, false));
        assert_eq!(board.presence().online_count(), 1);

        board.tick(Duration::from_secs(2));
        assert_eq!(board.presence().get(id).unwrap().position, Point::new(200.0, 200.0));

        assert!(board.set_collaborator_online(id, true));
        board.tick(Duration::from_secs(2));
        assert_ne!(board.presence().get(id).unwrap().position, Point::new(200.0, 200.0));
        assert!(!board.set_collaborator_online(99, true));
    }

    #[test]
    fn test_hostile_user_id_does_not_break_invite() {
        let (mut board, _store) = session();
        board.apply_remote(BridgeMessage::UserMove {
            user_id: u32::MAX,
            x: 0.0,
            y: 0.0,
        });
        assert_eq!(board.presence().users().len(), 1);
        assert_eq!(board.invite("Sam", Point::ZERO), Some(2));
    }

    #[test]
    fn test_undo_mid_drag_abandons_gesture() {
        let (mut board, _store) = session();
        board.set_tool(ToolKind::Rectangle);
        board.pointer_down(Point::new(0.0, 0.0));
        board.pointer_move(Point::new(100.0, 100.0));
        board.pointer_up();

        board.set_tool(ToolKind::Select);
        board.pointer_down(Point::new(50.0, 50.0));
        board.pointer_move(Point::new(70.0, 70.0));
        assert!(board.undo());
        assert_eq!(board.board().element_count(), 0);

        board.pointer_move(Point::new(90.0, 90.0));
        assert_eq!(board.pointer_up(), None);
        assert_eq!(board.board().element_count(), 0);
        assert!(board.redo());
        assert_eq!(board.board().element_count(), 1);
    }

    #[test]
    fn test_note_editing() {
        let (mut board, _store) = session();
        board.set_tool(ToolKind::Note);
        board.pointer_down(Point::new(10.0, 10.0));
        board.confirm_placement(PlacementContent::Note("draft".to_string()));

        let id = board.note_at(Point::new(50.0, 50.0)).unwrap();
        assert!(board.retext(id, "final"));
        assert!(board.recolor(id, HexColor::new("#FFFFFF")));
        assert!(board.undo());
        assert!(board.undo());
        assert!(matches!(
            board.board().active_layer().element(id).unwrap().shape(),
            crate::element::Shape::Note(n) if n.text == "draft"
        ));
    }

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn save(&self, _key: &str, _blob: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk full".to_string()))
        }

        fn load(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn clear(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_failure_becomes_notice() {
        let mut board = Brainboard::open(BoardConfig::default(), Arc::new(FailingStore));
        board.set_tool(ToolKind::Rectangle);
        board.pointer_down(Point::new(0.0, 0.0));
        board.pointer_move(Point::new(40.0, 40.0));
        assert!(matches!(board.pointer_up(), Some(EngineEvent::Added { .. })));
        assert_eq!(board.board().element_count(), 1);
        let notices = board.take_notices();
        assert!(matches!(notices.as_slice(), [Notice::SaveFailed(_)]));
    }

    #[test]
    fn test_clear_board_broadcasts() {
        let (mut board, _store) = session();
        board.connect(Box::new(LoopbackChannel::seeded("test", 5)));
        board.tick(OPEN_DELAY);
        stroke(&mut board, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        board.clear_board();
        assert_eq!(board.board().element_count(), 0);
        assert!(board.undo());
        assert_eq!(board.board().element_count(), 1);
    }

    #[test]
    fn test_import_export() {
        let (mut board, _store) = session();
        stroke(&mut board, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        let json = board.export_json().unwrap();

        let (mut other, _store) = session();
        other.import_json(&json).unwrap();
        assert_eq!(other.board(), board.board());
        assert!(other.import_json("nope").is_err());
    }
}
