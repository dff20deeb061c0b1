//! Window layout persistence through the host app-state store.

use platform_host::{
    load_app_state_with_migration, save_app_state_with, AppStateEnvelope, AppStateStore,
    WINDOW_LAYOUT_NAMESPACE,
};

use crate::model::{LayoutSnapshot, WINDOW_LAYOUT_SCHEMA_VERSION};

fn migrate_layout_snapshot(
    schema_version: u32,
    envelope: &AppStateEnvelope,
) -> Result<Option<LayoutSnapshot>, String> {
    match schema_version {
        0 => envelope.decode_payload::<LayoutSnapshot>().map(|snapshot| {
            Some(LayoutSnapshot {
                schema_version: WINDOW_LAYOUT_SCHEMA_VERSION,
                ..snapshot
            })
        }),
        _ => Ok(None),
    }
}

/// Loads the persisted window layout.
///
/// Missing, unknown-schema, and unreadable layouts all resolve to `None`; failures are logged.
pub async fn load_layout_snapshot<S: AppStateStore + ?Sized>(store: &S) -> Option<LayoutSnapshot> {
    match load_app_state_with_migration(
        store,
        WINDOW_LAYOUT_NAMESPACE,
        WINDOW_LAYOUT_SCHEMA_VERSION,
        migrate_layout_snapshot,
    )
    .await
    {
        Ok(snapshot) => snapshot,
        Err(err) => {
            leptos::logging::warn!("window layout load failed: {err}");
            None
        }
    }
}

/// Persists a window layout snapshot.
pub async fn persist_layout_snapshot<S: AppStateStore + ?Sized>(
    store: &S,
    snapshot: &LayoutSnapshot,
) -> Result<(), String> {
    save_app_state_with(
        store,
        WINDOW_LAYOUT_NAMESPACE,
        WINDOW_LAYOUT_SCHEMA_VERSION,
        snapshot,
    )
    .await
}
