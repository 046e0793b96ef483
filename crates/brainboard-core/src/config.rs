//! Board configuration.

use crate::geometry::{GRID_SIZE, HANDLE_HIT_SIZE};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::tools::DEFAULT_ERASER_RADIUS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 10;

/// Default simulated-presence interval in milliseconds.
pub const DEFAULT_PRESENCE_INTERVAL_MS: u64 = 2000;

/// Prefix of every persisted board key.
pub const STORAGE_KEY_PREFIX: &str = "whiteboard_";

/// Configuration of one embedded board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    pub board_id: String,
    pub grid_size: f64,
    pub history_limit: usize,
    pub autosave_interval_secs: u64,
    pub presence_interval_ms: u64,
    pub eraser_radius: f64,
    pub handle_hit_size: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_id: "default".to_string(),
            grid_size: GRID_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            presence_interval_ms: DEFAULT_PRESENCE_INTERVAL_MS,
            eraser_radius: DEFAULT_ERASER_RADIUS,
            handle_hit_size: HANDLE_HIT_SIZE,
        }
    }
}

impl BoardConfig {
    /// Create a config for `board_id` with defaults for everything else.
    pub fn for_board(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            ..Self::default()
        }
    }

    /// Key the board is persisted under.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.board_id)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn presence_interval(&self) -> Duration {
        Duration::from_millis(self.presence_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(BoardConfig::for_board("abc").storage_key(), "whiteboard_abc");
        assert_eq!(BoardConfig::default().storage_key(), "whiteboard_default");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BoardConfig = serde_json::from_str(r#"{"boardId":"room","gridSize":40}"#).unwrap();
        assert_eq!(config.board_id, "room");
        assert!((config.grid_size - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.autosave_interval(), Duration::from_secs(10));
    }
}
