//! Collaboration message schema.

use super::{BridgeError, BridgeResult};
use crate::element::Element;
use crate::layer::LayerId;
use serde::{Deserialize, Serialize};

/// Messages exchanged between collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    /// A finished element to append to `layer_id`.
    Draw {
        element: Element,
        #[serde(rename = "layerId")]
        layer_id: LayerId,
    },
    /// A collaborator's cursor moved.
    UserMove {
        #[serde(rename = "userId")]
        user_id: u32,
        x: f64,
        y: f64,
    },
    /// A collaborator emptied every layer.
    Clear {
        #[serde(rename = "userId")]
        user_id: u32,
    },
}

impl BridgeMessage {
    pub fn encode(&self) -> BridgeResult<String> {
        serde_json::to_string(self).map_err(BridgeError::Encode)
    }

    pub fn decode(payload: &str) -> BridgeResult<Self> {
        serde_json::from_str(payload).map_err(BridgeError::Decode)
    }
}
