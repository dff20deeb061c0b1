//! Host service bundle injected into the desktop runtime.

use std::rc::Rc;

use crate::{AppStateStore, ContentStreamClient, MemoryAppStateStore, TaskSpawner};

/// Stable host strategy selected for the current build/runtime composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Browser-backed composition (`localStorage`, `wasm-bindgen-futures`).
    Browser,
    /// Native composition with in-memory persistence, used by tests and tools.
    Headless,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Headless => "headless",
        }
    }
}

/// Runtime-selected host services.
///
/// Environment-specific selection happens before this bundle reaches `desktop_runtime`, which
/// keeps the session state machine free of browser details.
#[derive(Clone)]
pub struct HostServices {
    /// Generation backend client.
    pub generation: Rc<dyn ContentStreamClient>,
    /// Durable store for window layout.
    pub app_state: Rc<dyn AppStateStore>,
    /// Executor for stream ingestion and persistence tasks.
    pub spawner: Rc<dyn TaskSpawner>,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Builds a headless bundle backed by a fresh [`MemoryAppStateStore`].
    pub fn headless(generation: Rc<dyn ContentStreamClient>, spawner: Rc<dyn TaskSpawner>) -> Self {
        Self {
            generation,
            app_state: Rc::new(MemoryAppStateStore::default()),
            spawner,
            host_strategy: HostStrategy::Headless,
        }
    }

    /// Replaces the durable store.
    pub fn with_app_state(mut self, app_state: Rc<dyn AppStateStore>) -> Self {
        self.app_state = app_state;
        self
    }
}
