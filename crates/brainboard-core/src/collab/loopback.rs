//! In-process stand-in for a collaboration server.
//!
//! Opens after a fixed delay and echoes every `draw` back to its subscribers
//! as if another participant had drawn it.

use super::{BridgeError, BridgeMessage, BridgeResult, Channel, MessageCallback, OpenCallback};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Delay before the simulated connection opens.
pub const OPEN_DELAY: Duration = Duration::from_millis(500);

/// Delay before a `draw` is echoed back.
pub const ECHO_DELAY: Duration = Duration::from_millis(300);

/// Remote owner ids assigned to echoed elements.
const ECHO_OWNERS: std::ops::RangeInclusive<u32> = 2..=4;

/// Simulated channel driven by [`Channel::advance`].
pub struct LoopbackChannel {
    namespace: String,
    clock: Duration,
    open: bool,
    closed: bool,
    open_callbacks: Vec<OpenCallback>,
    message_callbacks: Vec<MessageCallback>,
    /// Echoes waiting for their delivery time, in send order.
    pending: VecDeque<(Duration, String)>,
    rng: StdRng,
}

impl LoopbackChannel {
    /// Create a new loopback channel for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_rng(namespace, StdRng::from_os_rng())
    }

    /// Create a loopback channel with a deterministic generator.
    pub fn seeded(namespace: impl Into<String>, seed: u64) -> Self {
        Self::with_rng(namespace, StdRng::seed_from_u64(seed))
    }

    fn with_rng(namespace: impl Into<String>, rng: StdRng) -> Self {
        Self {
            namespace: namespace.into(),
            clock: Duration::ZERO,
            open: false,
            closed: false,
            open_callbacks: Vec::new(),
            message_callbacks: Vec::new(),
            pending: VecDeque::new(),
            rng,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_open(&self) -> bool {
        self.open && !self.closed
    }

    /// Number of echoes not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Channel for LoopbackChannel {
    fn send(&mut self, payload: &str) -> BridgeResult<()> {
        if self.closed {
            return Err(BridgeError::Closed);
        }
        if !self.open {
            return Err(BridgeError::Transport("connection not open yet".to_string()));
        }
        if let BridgeMessage::Draw {
            mut element,
            layer_id,
        } = BridgeMessage::decode(payload)?
        {
            element.owner_id = self.rng.random_range(ECHO_OWNERS);
            let echo = BridgeMessage::Draw { element, layer_id }.encode()?;
            self.pending.push_back((self.clock + ECHO_DELAY, echo));
        }
        Ok(())
    }

    fn on_open(&mut self, callback: OpenCallback) {
        self.open_callbacks.push(callback);
    }

    fn on_message(&mut self, callback: MessageCallback) {
        self.message_callbacks.push(callback);
    }

    fn close(&mut self) {
        if !self.closed {
            log::info!("loopback channel {} closed", self.namespace);
        }
        self.closed = true;
        self.pending.clear();
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.closed {
            return;
        }
        self.clock += elapsed;

        if !self.open && self.clock >= OPEN_DELAY {
            self.open = true;
            log::info!("loopback channel {} open", self.namespace);
            for callback in &mut self.open_callbacks {
                callback();
            }
        }

        while self.pending.front().is_some_and(|(due, _)| *due <= self.clock) {
            if let Some((_, payload)) = self.pending.pop_front() {
                for callback in &mut self.message_callbacks {
                    callback(&payload);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, Shape};
    use kurbo::Point;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn draw_payload() -> String {
        BridgeMessage::Draw {
            element: Element::local(Shape::Pen {
                points: vec![Point::new(1.0, 1.0)],
            }),
            layer_id: "default".to_string(),
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_opens_after_delay() {
        let mut channel = LoopbackChannel::seeded("board", 7);
        let opened = Rc::new(Cell::new(0));
        let counter = opened.clone();
        channel.on_open(Box::new(move || counter.set(counter.get() + 1)));

        assert!(channel.send(&draw_payload()).is_err());
        channel.advance(Duration::from_millis(499));
        assert_eq!(opened.get(), 0);
        channel.advance(Duration::from_millis(1));
        assert_eq!(opened.get(), 1);
        channel.advance(Duration::from_secs(5));
        assert_eq!(opened.get(), 1);
        assert!(channel.is_open());
    }

    #[test]
    fn test_echoes_draw_from_remote_owner() {
        let mut channel = LoopbackChannel::seeded("board", 7);
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let sink = inbox.clone();
        channel.on_message(Box::new(move |payload: &str| sink.borrow_mut().push(payload.to_string())));
        channel.advance(OPEN_DELAY);

        channel.send(&draw_payload()).unwrap();
        channel.send(&BridgeMessage::Clear { user_id: 1 }.encode().unwrap()).unwrap();
        assert_eq!(channel.pending(), 1);

        channel.advance(Duration::from_millis(299));
        assert!(inbox.borrow().is_empty());
        channel.advance(Duration::from_millis(1));
        let delivered = inbox.borrow();
        assert_eq!(delivered.len(), 1);
        match BridgeMessage::decode(&delivered[0]).unwrap() {
            BridgeMessage::Draw { element, .. } => assert!(ECHO_OWNERS.contains(&element.owner_id)),
            other => panic!("unexpected echo {other:?}"),
        }
    }

    #[test]
    fn test_closed_channel_refuses_sends() {
        let mut channel = LoopbackChannel::seeded("board", 1);
        channel.advance(OPEN_DELAY);
        channel.close();
        assert!(matches!(channel.send(&draw_payload()), Err(BridgeError::Closed)));
        assert!(!channel.is_open());
    }

    #[test]
    fn test_malformed_send_is_a_decode_error() {
        let mut channel = LoopbackChannel::seeded("board", 1);
        channel.advance(OPEN_DELAY);
        assert!(matches!(channel.send("nope"), Err(BridgeError::Decode(_))));
    }
}
