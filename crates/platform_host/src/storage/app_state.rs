//! Durable app-state persistence: versioned envelopes, the store contract, and typed helpers.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Version for [`AppStateEnvelope`] metadata serialization.
pub const APP_STATE_ENVELOPE_VERSION: u32 = 1;
/// Namespace holding the persisted per-app window layout.
pub const WINDOW_LAYOUT_NAMESPACE: &str = "system.window_layout";

thread_local! {
    static LAST_ENVELOPE_TIMESTAMP_MS: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

fn next_envelope_timestamp_ms() -> u64 {
    let now = unix_time_ms_now();
    LAST_ENVELOPE_TIMESTAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned wrapper around one persisted payload.
pub struct AppStateEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Namespace identifying the owning domain.
    pub namespace: String,
    /// Domain-defined schema version for `payload`.
    pub schema_version: u32,
    /// Last update time in unix milliseconds, monotonic within the process.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl AppStateEnvelope {
    /// Wraps `payload` and stamps it with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: APP_STATE_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: next_envelope_timestamp_ms(),
            payload,
        }
    }

    /// Decodes the payload into `T` without any schema check.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload does not match `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_value(self.payload.clone()).map_err(|e| e.to_string())
    }
}

/// Object-safe boxed future used by [`AppStateStore`] async methods.
pub type AppStateStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable key-value store for envelopes, keyed by namespace.
pub trait AppStateStore {
    /// Loads the envelope stored under `namespace`.
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>>;

    /// Replaces the envelope stored under its namespace.
    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;

    /// Removes whatever is stored under `namespace`.
    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that remembers nothing and never fails.
pub struct NoopAppStateStore;

impl AppStateStore for NoopAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        _envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_app_state<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// Process-local store used by headless hosts and tests.
pub struct MemoryAppStateStore {
    inner: Rc<RefCell<HashMap<String, AppStateEnvelope>>>,
}

impl MemoryAppStateStore {
    /// Returns the raw envelope under `namespace` without going through the async contract.
    pub fn snapshot(&self, namespace: &str) -> Option<AppStateEnvelope> {
        self.inner.borrow().get(namespace).cloned()
    }
}

impl AppStateStore for MemoryAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async move { Ok(self.snapshot(namespace)) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(envelope.namespace.clone(), envelope.clone());
            Ok(())
        })
    }

    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(namespace);
            Ok(())
        })
    }
}

/// Serializes `payload` into an envelope and saves it through `store`.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn save_app_state_with<S: AppStateStore + ?Sized, T: Serialize>(
    store: &S,
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<(), String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    let envelope = AppStateEnvelope::new(namespace, schema_version, payload);
    store.save_app_state_envelope(&envelope).await
}

/// Loads the payload under `namespace`, migrating older schema versions through `migrate`.
///
/// `migrate` receives the stored schema version and envelope and returns `Ok(None)` when the
/// version is unknown, which is treated as "nothing stored".
///
/// # Errors
///
/// Returns an error when the store read, payload decoding, or the migration fails.
pub async fn load_app_state_with_migration<S, T, F>(
    store: &S,
    namespace: &str,
    current_schema_version: u32,
    migrate: F,
) -> Result<Option<T>, String>
where
    S: AppStateStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce(u32, &AppStateEnvelope) -> Result<Option<T>, String>,
{
    let Some(envelope) = store.load_app_state_envelope(namespace).await? else {
        return Ok(None);
    };
    if envelope.schema_version == current_schema_version {
        return envelope.decode_payload().map(Some);
    }
    migrate(envelope.schema_version, &envelope)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Placement {
        x: i32,
        y: i32,
    }

    #[test]
    fn envelope_serialization_shape_uses_snake_case_keys() {
        let envelope = AppStateEnvelope {
            envelope_version: APP_STATE_ENVELOPE_VERSION,
            namespace: WINDOW_LAYOUT_NAMESPACE.to_string(),
            schema_version: 4,
            updated_at_unix_ms: 99,
            payload: json!({"x": 1}),
        };

        let value = serde_json::to_value(&envelope).expect("serialize envelope");
        let object = value.as_object().expect("object");
        assert_eq!(
            object.get("namespace"),
            Some(&json!("system.window_layout"))
        );
        assert_eq!(object.get("schema_version"), Some(&json!(4)));
        assert_eq!(object.get("updated_at_unix_ms"), Some(&json!(99)));
        assert!(!object.contains_key("updatedAtUnixMs"));
    }

    #[test]
    fn envelope_timestamps_are_monotonic() {
        let first = AppStateEnvelope::new("a", 1, json!(1));
        let second = AppStateEnvelope::new("a", 1, json!(2));
        assert!(second.updated_at_unix_ms > first.updated_at_unix_ms);
    }

    #[test]
    fn typed_save_then_load_at_current_schema_skips_migration() {
        let store = MemoryAppStateStore::default();
        block_on(save_app_state_with(
            &store,
            "layout",
            2,
            &Placement { x: 5, y: 6 },
        ))
        .expect("save");

        let loaded: Option<Placement> =
            block_on(load_app_state_with_migration(&store, "layout", 2, |_, _| {
                Err("migration must not run".to_string())
            }))
            .expect("load");
        assert_eq!(loaded, Some(Placement { x: 5, y: 6 }));
    }

    #[test]
    fn older_schema_goes_through_migration_and_unknown_schema_reads_as_empty() {
        let store = MemoryAppStateStore::default();
        block_on(store.save_app_state_envelope(&AppStateEnvelope::new(
            "layout",
            0,
            json!([3, 4]),
        )))
        .expect("save legacy");

        let migrated: Option<Placement> =
            block_on(load_app_state_with_migration(&store, "layout", 1, |version, env| {
                assert_eq!(version, 0);
                let pair: (i32, i32) = env.decode_payload()?;
                Ok(Some(Placement {
                    x: pair.0,
                    y: pair.1,
                }))
            }))
            .expect("migrate");
        assert_eq!(migrated, Some(Placement { x: 3, y: 4 }));

        let unknown: Option<Placement> =
            block_on(load_app_state_with_migration(&store, "layout", 1, |_, _| Ok(None)))
                .expect("unknown schema");
        assert_eq!(unknown, None);
    }

    #[test]
    fn decode_failure_is_reported_as_error() {
        let store = MemoryAppStateStore::default();
        block_on(save_app_state_with(&store, "layout", 1, &json!({"x": "left"}))).expect("save");
        let result: Result<Option<Placement>, String> =
            block_on(load_app_state_with_migration(&store, "layout", 1, |_, _| Ok(None)));
        assert!(result.is_err());
    }

    #[test]
    fn memory_store_delete_and_noop_store_behave() {
        let store = MemoryAppStateStore::default();
        let store_obj: &dyn AppStateStore = &store;
        let envelope = AppStateEnvelope::new("layout", 1, json!({}));
        block_on(store_obj.save_app_state_envelope(&envelope)).expect("save");
        assert!(store.snapshot("layout").is_some());
        block_on(store_obj.delete_app_state("layout")).expect("delete");
        assert_eq!(store.snapshot("layout"), None);

        let noop: &dyn AppStateStore = &NoopAppStateStore;
        block_on(noop.save_app_state_envelope(&envelope)).expect("noop save");
        assert_eq!(block_on(noop.load_app_state_envelope("layout")).expect("load"), None);
    }
}
