//! Leptos context wiring for the desktop runtime.
//!
//! The runtime stays framework-agnostic; this module mirrors its state into signals so views
//! re-render on change, and hands out the runtime handle for dispatching.
#![allow(clippy::clone_on_copy)]

use std::{collections::HashMap, rc::Rc};

use leptos::*;
use platform_host::{ContentStreamClient, HostServices};

use crate::{
    config::RuntimeConfig,
    model::{AppId, DesktopState, SessionState},
    runtime::{DesktopRuntime, RuntimeEvent},
    view::{self, ContentView},
};

#[derive(Clone, Copy)]
/// Leptos context for reading desktop runtime state and driving the runtime.
pub struct DesktopRuntimeContext {
    /// Runtime handle used for all mutations.
    pub runtime: StoredValue<DesktopRuntime>,
    /// Reactive window lifecycle state.
    pub desktop: RwSignal<DesktopState>,
    /// Reactive per-instance session state.
    pub sessions: RwSignal<HashMap<AppId, SessionState>>,
    /// Reactive runtime configuration.
    pub config: RwSignal<RuntimeConfig>,
}

impl DesktopRuntimeContext {
    /// Mirrors `runtime` into fresh signals and keeps them in sync.
    pub fn new(runtime: DesktopRuntime) -> Self {
        let desktop = create_rw_signal(runtime.desktop());
        let sessions = create_rw_signal(runtime.sessions());
        let config = create_rw_signal(runtime.config());

        runtime.subscribe(move |runtime, event| match event {
            RuntimeEvent::SessionChanged(app_id) => {
                let latest = runtime.session(app_id);
                sessions.update(|map| match latest {
                    Some(session) => {
                        map.insert(app_id.clone(), session);
                    }
                    None => {
                        map.remove(app_id);
                    }
                });
            }
            RuntimeEvent::DesktopChanged => desktop.set(runtime.desktop()),
            RuntimeEvent::ConfigChanged => config.set(runtime.config()),
        });

        Self {
            runtime: store_value(runtime),
            desktop,
            sessions,
            config,
        }
    }

    /// Returns the runtime handle.
    pub fn runtime(&self) -> DesktopRuntime {
        self.runtime.get_value()
    }

    /// Tracked view of the active window's content.
    pub fn content_view(&self) -> ContentView {
        let desktop = self.desktop.get();
        self.sessions.with(|sessions| {
            let session = desktop
                .active_app
                .as_ref()
                .and_then(|app_id| sessions.get(app_id));
            view::content_view(&desktop, session)
        })
    }

    /// Tracked window title.
    pub fn window_title(&self) -> String {
        self.desktop.with(view::window_title)
    }
}

/// Builds the runtime, schedules layout hydration, and provides [`DesktopRuntimeContext`].
pub fn provide_desktop_runtime(
    services: HostServices,
    config: RuntimeConfig,
) -> DesktopRuntimeContext {
    logging::log!(
        "starting desktop runtime on {} host",
        services.host_strategy.as_str()
    );
    let runtime = DesktopRuntime::new(services, config);
    let context = DesktopRuntimeContext::new(runtime.clone());
    runtime.install_boot_hydration();
    provide_context(context.clone());
    context
}

/// Browser entry point: provides the runtime over the `platform_host_web` adapters.
pub fn provide_browser_desktop_runtime(
    generation: Rc<dyn ContentStreamClient>,
    config: RuntimeConfig,
) -> DesktopRuntimeContext {
    provide_desktop_runtime(platform_host_web::build_host_services(generation), config)
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside a scope where [`provide_desktop_runtime`] ran.
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}
