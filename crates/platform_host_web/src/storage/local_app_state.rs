//! `localStorage`-backed app-state store.
//!
//! Envelopes are stored as JSON text, one key per namespace. The browser API is synchronous; the
//! [`AppStateStore`] futures resolve immediately.

use platform_host::{AppStateEnvelope, AppStateStore, AppStateStoreFuture};

const KEY_PREFIX: &str = "gendesk.app_state.";

#[derive(Debug, Clone, Copy, Default)]
/// Browser app-state store backed by `window.localStorage`.
pub struct WebAppStateStore;

pub(crate) fn storage_key(namespace: &str) -> String {
    format!("{KEY_PREFIX}{namespace}")
}

impl WebAppStateStore {
    /// Loads and decodes the envelope under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored text is not a valid envelope.
    pub fn load_envelope(self, namespace: &str) -> Result<Option<AppStateEnvelope>, String> {
        let Some(raw) = self.load_raw(&storage_key(namespace)) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| format!("corrupt app state for `{namespace}`: {e}"))
    }

    /// Encodes and saves `envelope` under its namespace.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the `localStorage` write fails.
    pub fn save_envelope(self, envelope: &AppStateEnvelope) -> Result<(), String> {
        let raw = serde_json::to_string(envelope).map_err(|e| e.to_string())?;
        self.save_raw(&storage_key(&envelope.namespace), &raw)
    }

    fn load_raw(self, key: &str) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()?.local_storage().ok().flatten()?;
            storage.get_item(key).ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            None
        }
    }

    fn save_raw(self, key: &str, raw: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or_else(|| "localStorage unavailable".to_string())?;
            storage
                .set_item(key, raw)
                .map_err(|e| format!("localStorage set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw);
            Ok(())
        }
    }

    fn remove_raw(self, key: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or_else(|| "localStorage unavailable".to_string())?;
            storage
                .remove_item(key)
                .map_err(|e| format!("localStorage remove_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}

impl AppStateStore for WebAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        let store = *self;
        Box::pin(async move { store.load_envelope(namespace) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        let store = *self;
        Box::pin(async move { store.save_envelope(envelope) })
    }

    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        let store = *self;
        Box::pin(async move { store.remove_raw(&storage_key(namespace)) })
    }
}
