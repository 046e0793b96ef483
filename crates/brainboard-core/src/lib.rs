//! Brainboard Core Library
//!
//! Platform-agnostic board model, hit-testing, history, tool state machine,
//! persistence and collaboration for the Brainboard whiteboard.

pub mod board;
pub mod collab;
pub mod config;
pub mod element;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod session;
pub mod storage;
pub mod text;
pub mod tools;

pub use board::{BoardState, GridSettings, PersistedBoard};
pub use collab::{BridgeMessage, Channel, CollaborationBridge, ConnectionState, Presence};
pub use config::BoardConfig;
pub use element::{BoxGeom, Element, ElementId, ElementKind, HexColor, Shape};
pub use engine::{Engine, EngineEvent, InteractionState, PlacementContent, PlacementRequest};
pub use geometry::{Corner, GRID_SIZE, snap_to_grid};
pub use history::History;
pub use layer::{Layer, LayerId, LayerMove, LayerStack};
pub use session::{Brainboard, Notice};
pub use storage::{AutoSaveManager, BlobStore, MemoryStore, StorageError, StorageResult};
pub use text::{ApproximateMetrics, TextMetrics};
pub use tools::{ToolKind, ToolSettings};
