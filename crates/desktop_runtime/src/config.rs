//! Runtime configuration consumed by the session state machine.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAP: usize = 3;
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum interaction history length sent with each generation.
    ///
    /// Changing it never trims histories that already exist.
    pub history_cap: usize,
    /// Output language tag forwarded verbatim to the backend.
    pub language: String,
    /// Whether generated content is memoized by navigation path.
    pub statefulness_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            language: DEFAULT_LANGUAGE.to_string(),
            statefulness_enabled: false,
        }
    }
}

impl RuntimeConfig {
    pub fn with_history_cap(mut self, history_cap: usize) -> Self {
        self.history_cap = history_cap;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_statefulness(mut self, enabled: bool) -> Self {
        self.statefulness_enabled = enabled;
        self
    }
}
