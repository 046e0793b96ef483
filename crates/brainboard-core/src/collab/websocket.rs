//! Browser WebSocket transport.

use super::{BridgeError, BridgeResult, Channel, MessageCallback, OpenCallback};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, WebSocket};

/// [`Channel`] over a browser `WebSocket`. Callbacks run from the browser
/// event loop.
pub struct WebSocketChannel {
    ws: WebSocket,
    open_callbacks: Rc<RefCell<Vec<OpenCallback>>>,
    message_callbacks: Rc<RefCell<Vec<MessageCallback>>>,
    // Keep the closures alive for as long as the socket is.
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
}

impl WebSocketChannel {
    /// Connect to `url`.
    pub fn connect(url: &str) -> BridgeResult<Self> {
        let ws = WebSocket::new(url)
            .map_err(|e| BridgeError::Transport(format!("Failed to create WebSocket: {e:?}")))?;

        let open_callbacks: Rc<RefCell<Vec<OpenCallback>>> = Rc::new(RefCell::new(Vec::new()));
        let message_callbacks: Rc<RefCell<Vec<MessageCallback>>> =
            Rc::new(RefCell::new(Vec::new()));

        let on_open_list = open_callbacks.clone();
        let on_open = Closure::<dyn FnMut()>::new(move || {
            for callback in on_open_list.borrow_mut().iter_mut() {
                callback();
            }
        });
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message_list = message_callbacks.clone();
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
            if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                let payload: String = text.into();
                for callback in on_message_list.borrow_mut().iter_mut() {
                    callback(&payload);
                }
            }
        });
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        log::info!("connecting to {url}");
        Ok(Self {
            ws,
            open_callbacks,
            message_callbacks,
            _on_open: on_open,
            _on_message: on_message,
        })
    }
}

impl Channel for WebSocketChannel {
    fn send(&mut self, payload: &str) -> BridgeResult<()> {
        match self.ws.ready_state() {
            WebSocket::OPEN => self
                .ws
                .send_with_str(payload)
                .map_err(|e| BridgeError::Transport(format!("Send failed: {e:?}"))),
            WebSocket::CLOSING | WebSocket::CLOSED => Err(BridgeError::Closed),
            _ => Err(BridgeError::Transport("connection not open yet".to_string())),
        }
    }

    fn on_open(&mut self, callback: OpenCallback) {
        self.open_callbacks.borrow_mut().push(callback);
    }

    fn on_message(&mut self, callback: MessageCallback) {
        self.message_callbacks.borrow_mut().push(callback);
    }

    fn close(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        if let Err(e) = self.ws.close() {
            log::warn!("WebSocket close failed: {e:?}");
        }
    }
}
