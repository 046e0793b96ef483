//! Connects a [`Channel`] to a board session.

use super::{BridgeError, BridgeMessage, BridgeResult, Channel, ConnectionState};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Owns a channel, tracks whether it is open, and buffers inbound payloads
/// until the session polls for them.
pub struct CollaborationBridge {
    channel: Box<dyn Channel>,
    namespace: String,
    state: Rc<Cell<ConnectionState>>,
    inbox: Rc<RefCell<VecDeque<String>>>,
}

impl CollaborationBridge {
    /// Create a new bridge and subscribe to `channel`.
    pub fn new(mut channel: Box<dyn Channel>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let state = Rc::new(Cell::new(ConnectionState::Connecting));
        let inbox = Rc::new(RefCell::new(VecDeque::new()));

        let open_state = state.clone();
        channel.on_open(Box::new(move || open_state.set(ConnectionState::Connected)));

        let sink = inbox.clone();
        channel.on_message(Box::new(move |payload: &str| {
            sink.borrow_mut().push_back(payload.to_string());
        }));

        Self {
            channel,
            namespace,
            state,
            inbox,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    /// Send a message to every other collaborator.
    ///
    /// Returns `Ok(false)` without sending while the channel is not open.
    pub fn broadcast(&mut self, message: &BridgeMessage) -> BridgeResult<bool> {
        if !self.is_connected() {
            log::debug!("bridge {} not connected, dropping outbound message", self.namespace);
            return Ok(false);
        }
        let payload = message.encode()?;
        match self.channel.send(&payload) {
            Ok(()) => Ok(true),
            Err(BridgeError::Closed) => {
                self.state.set(ConnectionState::Disconnected);
                Err(BridgeError::Closed)
            }
            Err(e) => {
                self.state.set(ConnectionState::Error);
                Err(e)
            }
        }
    }

    /// Advance the channel and return every well-formed inbound message.
    /// Malformed payloads are logged and dropped.
    pub fn poll(&mut self, elapsed: Duration) -> Vec<BridgeMessage> {
        self.channel.advance(elapsed);
        let payloads: Vec<String> = self.inbox.borrow_mut().drain(..).collect();
        payloads
            .iter()
            .filter_map(|payload| match BridgeMessage::decode(payload) {
                Ok(message) => Some(message),
                Err(e) => {
                    log::warn!("dropping inbound message on {}: {e}", self.namespace);
                    None
                }
            })
            .collect()
    }

    pub fn close(&mut self) {
        self.channel.close();
        self.state.set(ConnectionState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{LoopbackChannel, MessageCallback, OpenCallback, OPEN_DELAY};
    use crate::element::{Element, Shape};
    use kurbo::Point;

    /// Channel that delivers whatever the test pushes into it.
    struct ScriptedChannel {
        inbound: Rc<RefCell<Vec<String>>>,
        open_callbacks: Vec<OpenCallback>,
        message_callbacks: Vec<MessageCallback>,
    }

    impl Channel for ScriptedChannel {
        fn send(&mut self, _payload: &str) -> BridgeResult<()> {
            Ok(())
        }

        fn on_open(&mut self, callback: OpenCallback) {
            self.open_callbacks.push(callback);
        }

        fn on_message(&mut self, callback: MessageCallback) {
            self.message_callbacks.push(callback);
        }

        fn close(&mut self) {}

        fn advance(&mut self, _elapsed: Duration) {
            for callback in &mut self.open_callbacks {
                callback();
            }
            for payload in self.inbound.borrow_mut().drain(..) {
                for callback in &mut self.message_callbacks {
                    callback(&payload);
                }
            }
        }
    }

    #[test]
    fn test_broadcast_waits_for_open() {
        let mut bridge = CollaborationBridge::new(Box::new(LoopbackChannel::seeded("b", 3)), "b");
        let msg = BridgeMessage::Clear { user_id: 1 };
        assert_eq!(bridge.state(), ConnectionState::Connecting);
        assert!(!bridge.broadcast(&msg).unwrap());

        bridge.poll(OPEN_DELAY);
        assert!(bridge.is_connected());
        assert!(bridge.broadcast(&msg).unwrap());

        bridge.close();
        assert_eq!(bridge.state(), ConnectionState::Disconnected);
        assert!(!bridge.broadcast(&msg).unwrap());
    }

    #[test]
    fn test_malformed_inbound_is_dropped() {
        let inbound = Rc::new(RefCell::new(vec![
            "garbage".to_string(),
            r#"{"type":"userMove","userId":2,"x":1.0,"y":2.0}"#.to_string(),
        ]));
        let channel = ScriptedChannel {
            inbound: inbound.clone(),
            open_callbacks: Vec::new(),
            message_callbacks: Vec::new(),
        };
        let mut bridge = CollaborationBridge::new(Box::new(channel), "b");
        let messages = bridge.poll(Duration::ZERO);
        assert_eq!(messages, vec![BridgeMessage::UserMove { user_id: 2, x: 1.0, y: 2.0 }]);
        assert!(bridge.poll(Duration::ZERO).is_empty());
    }

    #[test]
    fn test_loopback_echo_round_trip() {
        let mut bridge = CollaborationBridge::new(Box::new(LoopbackChannel::seeded("b", 9)), "b");
        bridge.poll(OPEN_DELAY);
        let element = Element::local(Shape::Pen {
            points: vec![Point::new(3.0, 4.0)],
        });
        let sent = BridgeMessage::Draw {
            element: element.clone(),
            layer_id: "default".to_string(),
        };
        assert!(bridge.broadcast(&sent).unwrap());
        let echoed = bridge.poll(crate::collab::ECHO_DELAY);
        assert_eq!(echoed.len(), 1);
        let BridgeMessage::Draw { element: echo, layer_id } = &echoed[0] else {
            panic!("expected draw");
        };
        assert_eq!(layer_id, "default");
        assert_eq!(echo.id(), element.id());
        assert_ne!(echo.owner_id, element.owner_id);
    }
}
