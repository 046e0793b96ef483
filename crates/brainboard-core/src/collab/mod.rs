//! Collaboration: the message schema, the channel abstraction, and the
//! bridge that feeds remote mutations into a board.

mod bridge;
mod loopback;
mod message;
mod presence;

#[cfg(target_arch = "wasm32")]
mod websocket;

pub use bridge::CollaborationBridge;
pub use loopback::{ECHO_DELAY, LoopbackChannel, OPEN_DELAY};
pub use message::BridgeMessage;
pub use presence::{Collaborator, LOCAL_USER_ID, Presence, PresenceSimulator, WANDER_RANGE};

#[cfg(target_arch = "wasm32")]
pub use websocket::WebSocketChannel;

use std::time::Duration;
use thiserror::Error;

/// Collaboration errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Channel is closed")]
    Closed,
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for collaboration operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Called once the channel is open.
pub type OpenCallback = Box<dyn FnMut()>;

/// Called with every inbound text payload.
pub type MessageCallback = Box<dyn FnMut(&str)>;

/// A bidirectional text channel to other collaborators.
///
/// Delivery is at-most-once with no ordering guarantee across senders.
pub trait Channel {
    /// Send a JSON payload.
    fn send(&mut self, payload: &str) -> BridgeResult<()>;

    /// Register a callback for when the connection opens.
    fn on_open(&mut self, callback: OpenCallback);

    /// Register a callback for inbound payloads.
    fn on_message(&mut self, callback: MessageCallback);

    /// Close the channel. Further sends fail with [`BridgeError::Closed`].
    fn close(&mut self);

    /// Let `elapsed` time pass. Transports driven by the host event loop
    /// ignore this.
    fn advance(&mut self, _elapsed: Duration) {}
}
