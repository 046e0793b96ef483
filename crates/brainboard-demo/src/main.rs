//! Scripted headless session (native).

use brainboard_core::collab::{LoopbackChannel, OPEN_DELAY, PresenceSimulator};
use brainboard_core::{BoardConfig, Brainboard, MemoryStore, PlacementContent, ToolKind};
use brainboard_render::{BoardRenderer, RecordingSurface, RenderContext};
use kurbo::{Point, Size};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    env_logger::init();
    log::info!("Starting Brainboard demo");

    let config = BoardConfig::for_board("demo");
    let store = Arc::new(MemoryStore::new());
    let mut board = Brainboard::open(config.clone(), store.clone());
    board.connect(Box::new(LoopbackChannel::new(config.board_id.clone())));
    board.simulate_presence(PresenceSimulator::new(config.presence_interval()));
    if board.invite("Sam", Point::new(300.0, 200.0)).is_none() {
        log::warn!("no free collaborator id");
    }
    board.tick(OPEN_DELAY);

    // A pen stroke, undone and redone.
    board.set_tool(ToolKind::Pen);
    board.pointer_down(Point::new(0.0, 0.0));
    board.pointer_move(Point::new(10.0, 10.0));
    board.pointer_move(Point::new(20.0, 0.0));
    board.pointer_up();
    board.undo();
    board.redo();
    log::info!("after pen stroke: {} elements", board.board().element_count());

    // A rectangle and a note on a second layer.
    let layer = board.add_layer();
    board.set_tool(ToolKind::Rectangle);
    board.pointer_down(Point::new(50.0, 50.0));
    board.pointer_move(Point::new(150.0, 120.0));
    board.pointer_up();
    board.set_tool(ToolKind::Note);
    board.pointer_down(Point::new(200.0, 40.0));
    board.confirm_placement(PlacementContent::Note("Ship the renderer this week".into()));
    log::info!("layer {layer}: {} elements", board.board().active_layer().elements.len());

    // Erase the rectangle's corner.
    board.set_tool(ToolKind::Eraser);
    board.pointer_down(Point::new(150.0, 120.0));
    board.pointer_up();
    log::info!("after erase: {} elements", board.board().element_count());

    board.tick(Duration::from_secs(3));
    log::info!("{} collaborators online", board.presence().online_count());

    let mut surface = RecordingSurface::new(Size::new(800.0, 600.0));
    let mut renderer = BoardRenderer::default();
    let ctx = RenderContext::new(board.board()).with_selection(board.selected());
    renderer.render(&mut surface, &ctx);
    log::info!("rendered {} draw commands", surface.commands().len());

    match renderer.export_png(board.board(), 800, 600) {
        Ok(png) => log::info!("PNG snapshot is {} bytes", png.len()),
        Err(e) => log::error!("PNG export failed: {e}"),
    }

    let exported = board.export_json();
    board.close();
    drop(board);

    let reopened = Brainboard::open(config, store);
    log::info!(
        "reopened board with {} elements across {} layers",
        reopened.board().element_count(),
        reopened.board().layers().len()
    );
    if let Some(json) = exported {
        log::info!("export is {} bytes", json.len());
    }
}
