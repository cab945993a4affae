use serde::{Deserialize, Serialize};

/// Editor session settings. Every field falls back to its default when
/// missing from a loaded config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo steps kept; the oldest are evicted first.
    pub max_history_depth: usize,
    /// Select the top-level node created by `InsertNode`.
    pub select_on_insert: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_depth: 100,
            select_on_insert: true,
        }
    }
}
