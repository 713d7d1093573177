use crate::sanitize::UrlPolicy;
use pagecraft_linter::PublishOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor behavior knobs; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Undo levels kept before the oldest is evicted
    pub history_depth: usize,

    /// Same-reason edits closer together than this merge into one undo step;
    /// 0 turns merging off
    pub coalesce_window_ms: u64,

    /// Quiet period before an autosave fires
    pub autosave_debounce_ms: u64,

    /// How far outside a drop zone the pointer may be and still hit it
    pub snap_distance: f64,

    /// Platform modules the tenant has enabled
    pub enabled_modules: Vec<String>,

    pub allowed_url_schemes: Vec<String>,
}

impl EditorConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn url_policy(&self) -> UrlPolicy {
        UrlPolicy::new(self.allowed_url_schemes.iter().cloned())
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions::with_modules(self.enabled_modules.iter().cloned())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: crate::undo_stack::DEFAULT_MAX_DEPTH,
            coalesce_window_ms: 500,
            autosave_debounce_ms: 1500,
            snap_distance: crate::dnd::DEFAULT_SNAP_DISTANCE,
            enabled_modules: vec![],
            allowed_url_schemes: ["http", "https", "mailto", "tel"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
