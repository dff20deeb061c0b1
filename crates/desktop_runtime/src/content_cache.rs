//! Path-keyed memo of completed generations.
//!
//! Keys are `NavigationPath::cache_key()` values only; two different histories that reach the
//! same path share one entry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCache {
    enabled: bool,
    entries: HashMap<String, String>,
}

impl ContentCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggles memoization. Disabling drops every entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `content` under `key`. Returns whether the cache changed.
    pub fn store(&mut self, key: String, content: &str) -> bool {
        if !self.enabled || content.is_empty() {
            return false;
        }
        if self.entries.get(&key).map(String::as_str) == Some(content) {
            return false;
        }
        self.entries.insert(key, content.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
