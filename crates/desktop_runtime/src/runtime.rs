//! Long-lived runtime that ties the window reducer, session store, cache, and generation
//! backend together.
//!
//! [`DesktopRuntime`] is a cheap `Rc` handle. All state lives behind `RefCell`s that are never
//! borrowed across an `.await`, a listener call, or a call back into the runtime.

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use futures::{
    future::{AbortHandle, Abortable, Aborted},
    FutureExt,
};
use leptos::logging;
use platform_host::{GenerationRequest, HostServices};

use crate::{
    apps,
    config::RuntimeConfig,
    content_cache::ContentCache,
    error::GenerationError,
    ingester::{IngestOutcome, StreamIngester},
    model::{
        AppId, DesktopState, GenerationId, InteractionEvent, InteractionHistory, PointerState,
        SessionState, WindowRect,
    },
    persistence,
    router::{route, route_open, Navigation, NavigationDecision, RouteOutcome},
    session_store::SessionStore,
    view::{self, ContentView},
    window_manager::{reduce_desktop, DesktopAction, RuntimeEffect},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Change notifications delivered to [`DesktopRuntime::subscribe`] observers.
pub enum RuntimeEvent {
    /// The session of this instance changed, was created, or was removed.
    SessionChanged(AppId),
    DesktopChanged,
    ConfigChanged,
}

type RuntimeObserver = Rc<dyn Fn(&DesktopRuntime, &RuntimeEvent)>;

struct RuntimeInner {
    services: HostServices,
    sessions: SessionStore,
    cache: RefCell<ContentCache>,
    config: RefCell<RuntimeConfig>,
    desktop: RefCell<DesktopState>,
    pointer: RefCell<PointerState>,
    generations: RefCell<HashMap<AppId, (GenerationId, AbortHandle)>>,
    observers: RefCell<Vec<RuntimeObserver>>,
}

#[derive(Clone)]
pub struct DesktopRuntime {
    inner: Rc<RuntimeInner>,
}

impl DesktopRuntime {
    pub fn new(services: HostServices, config: RuntimeConfig) -> Self {
        let inner = Rc::new(RuntimeInner {
            services,
            sessions: SessionStore::default(),
            cache: RefCell::new(ContentCache::new(config.statefulness_enabled)),
            config: RefCell::new(config),
            desktop: RefCell::new(DesktopState::default()),
            pointer: RefCell::new(PointerState::default()),
            generations: RefCell::new(HashMap::new()),
            observers: RefCell::new(Vec::new()),
        });

        let weak: Weak<RuntimeInner> = Rc::downgrade(&inner);
        inner.sessions.subscribe(move |app_id| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let runtime = DesktopRuntime { inner };
            runtime.write_back_cache(app_id);
            runtime.emit(&RuntimeEvent::SessionChanged(app_id.clone()));
        });

        Self { inner }
    }

    /// Registers an observer for runtime changes.
    pub fn subscribe(&self, observer: impl Fn(&DesktopRuntime, &RuntimeEvent) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    pub fn host_services(&self) -> &HostServices {
        &self.inner.services
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.config.borrow().clone()
    }

    pub fn desktop(&self) -> DesktopState {
        self.inner.desktop.borrow().clone()
    }

    pub fn pointer(&self) -> PointerState {
        self.inner.pointer.borrow().clone()
    }

    pub fn session(&self, app_id: &AppId) -> Option<SessionState> {
        self.inner.sessions.get(app_id)
    }

    pub fn sessions(&self) -> HashMap<AppId, SessionState> {
        self.inner.sessions.snapshot()
    }

    pub fn active_app(&self) -> Option<AppId> {
        self.inner.desktop.borrow().active_app.clone()
    }

    pub fn active_session(&self) -> Option<SessionState> {
        self.active_app().and_then(|app_id| self.session(&app_id))
    }

    /// Returns the memoized content for a navigation path cache key.
    pub fn cached_content(&self, cache_key: &str) -> Option<String> {
        self.inner.cache.borrow().get(cache_key).map(str::to_string)
    }

    pub fn cache_len(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    /// Whether the active instance has a screen to go back to.
    pub fn can_go_back(&self) -> bool {
        self.active_session()
            .is_some_and(|session| session.path.depth() > 1)
    }

    pub fn content_view(&self) -> ContentView {
        let desktop = self.desktop();
        let session = desktop
            .active_app
            .as_ref()
            .and_then(|app_id| self.session(app_id));
        view::content_view(&desktop, session.as_ref())
    }

    pub fn window_title(&self) -> String {
        view::window_title(&self.inner.desktop.borrow())
    }

    /// Applies a window lifecycle action and executes the effects it emits.
    ///
    /// Reducer errors are logged and leave the state untouched.
    pub fn dispatch(&self, action: DesktopAction) {
        let (result, changed) = {
            let mut desktop = self.inner.desktop.borrow_mut();
            let mut pointer = self.inner.pointer.borrow_mut();
            let previous = desktop.clone();
            let result = reduce_desktop(&mut desktop, &mut pointer, action);
            if result.is_err() {
                *desktop = previous;
                (result, false)
            } else {
                let changed = *desktop != previous;
                (result, changed)
            }
        };

        match result {
            Ok(effects) => {
                for effect in effects {
                    self.run_runtime_effect(effect);
                }
                // Observers see a closed window only once its session is gone too.
                if changed {
                    self.emit(&RuntimeEvent::DesktopChanged);
                }
            }
            Err(err) => logging::warn!("desktop reducer error: {err}"),
        }
    }

    /// Opens an app instance with `initial` as its first interaction.
    ///
    /// An instance that is already open is only activated; its content is not regenerated.
    pub fn open_app(&self, app_id: AppId, initial: InteractionEvent) {
        self.dispatch(DesktopAction::OpenWindow {
            app_id: app_id.clone(),
        });
        if self.inner.sessions.open(&app_id) {
            self.navigate_to_root(&app_id, initial, true);
        }
    }

    /// Opens a catalog app the way its desktop icon does. Returns `false` for unknown ids.
    pub fn launch_app(&self, app_id: &str) -> bool {
        let Some(app) = apps::find_app(app_id) else {
            logging::debug_warn!("ignoring launch of unknown app `{app_id}`");
            return false;
        };
        self.open_app(app.app_id(), apps::open_interaction(app));
        true
    }

    /// Runs a desktop search in the web app. Returns `false` for a blank query.
    ///
    /// The web app is opened or activated and reset to its root screen with the search as its
    /// only history entry. Results are always regenerated: the root cache key does not carry the
    /// query.
    pub fn search(&self, query: &str) -> bool {
        let Some(event) = apps::search_interaction(query) else {
            return false;
        };
        let app_id = AppId::new(apps::WEB_BROWSER_APP_ID);
        self.dispatch(DesktopAction::OpenWindow {
            app_id: app_id.clone(),
        });
        self.inner.sessions.open(&app_id);
        self.navigate_to_root(&app_id, event, false);
        true
    }

    /// Routes an interaction from the active window's generated content.
    pub fn interact(&self, event: InteractionEvent) {
        let Some(app_id) = self.active_app() else {
            logging::debug_warn!("ignoring interaction `{}` without an active app", event.id);
            return;
        };
        self.navigate(&app_id, Navigation::Interact(event));
    }

    pub fn go_back(&self) {
        if let Some(app_id) = self.active_app() {
            self.navigate(&app_id, Navigation::Back);
        }
    }

    pub fn close_app(&self, app_id: &AppId) {
        self.dispatch(DesktopAction::CloseWindow {
            app_id: app_id.clone(),
        });
    }

    pub fn close_active(&self) {
        if let Some(app_id) = self.active_app() {
            self.close_app(&app_id);
        }
    }

    pub fn switch_app(&self, app_id: &AppId) {
        self.dispatch(DesktopAction::ActivateWindow {
            app_id: app_id.clone(),
        });
    }

    pub fn show_desktop(&self) {
        self.dispatch(DesktopAction::ShowDesktop);
    }

    pub fn minimize_active(&self) {
        self.dispatch(DesktopAction::MinimizeActive);
    }

    pub fn maximize_active(&self) {
        self.dispatch(DesktopAction::MaximizeActive);
    }

    pub fn restore_active(&self) {
        self.dispatch(DesktopAction::RestoreActive);
    }

    pub fn toggle_maximize_active(&self) {
        self.dispatch(DesktopAction::ToggleMaximizeActive);
    }

    pub fn toggle_parameters(&self) {
        self.dispatch(DesktopAction::ToggleParameters);
    }

    pub fn set_viewport(&self, viewport: WindowRect) {
        self.dispatch(DesktopAction::SetViewport { viewport });
    }

    /// Changes the history cap for future navigations. Existing histories keep their length.
    pub fn set_history_cap(&self, history_cap: usize) {
        self.inner.config.borrow_mut().history_cap = history_cap;
        self.emit(&RuntimeEvent::ConfigChanged);
    }

    pub fn set_language(&self, language: impl Into<String>) {
        self.inner.config.borrow_mut().language = language.into();
        self.emit(&RuntimeEvent::ConfigChanged);
    }

    /// Toggles content memoization. Disabling clears the cache before returning.
    pub fn set_statefulness(&self, enabled: bool) {
        self.inner.config.borrow_mut().statefulness_enabled = enabled;
        self.inner.cache.borrow_mut().set_enabled(enabled);
        self.emit(&RuntimeEvent::ConfigChanged);
    }

    /// Loads remembered window geometry from the durable store.
    pub async fn hydrate_layout(&self) {
        let store = self.inner.services.app_state.clone();
        let Some(snapshot) = persistence::load_layout_snapshot(store.as_ref()).await else {
            return;
        };
        logging::log!(
            "hydrated window layout for {} app(s)",
            snapshot.windows.len()
        );
        self.dispatch(DesktopAction::HydrateLayout { snapshot });
    }

    /// Schedules [`Self::hydrate_layout`] on the host executor.
    pub fn install_boot_hydration(&self) {
        let runtime = self.clone();
        self.spawn(
            "window layout hydration",
            async move { runtime.hydrate_layout().await }.boxed_local(),
        );
    }

    fn navigate(&self, app_id: &AppId, navigation: Navigation) {
        let Some(session) = self.inner.sessions.get(app_id) else {
            logging::debug_warn!("ignoring navigation for closed app `{app_id}`");
            return;
        };
        let outcome = {
            let history_cap = self.inner.config.borrow().history_cap;
            let cache = self.inner.cache.borrow();
            route(&session, navigation, history_cap, &cache)
        };
        match outcome {
            RouteOutcome::Close => self.close_app(app_id),
            RouteOutcome::Unchanged => {}
            RouteOutcome::Navigate(decision) => self.apply_navigation(app_id, decision),
        }
    }

    fn navigate_to_root(&self, app_id: &AppId, initial: InteractionEvent, allow_cache: bool) {
        let mut decision = {
            let history_cap = self.inner.config.borrow().history_cap;
            let cache = self.inner.cache.borrow();
            route_open(app_id, initial, history_cap, &cache)
        };
        decision.use_cache &= allow_cache;
        self.apply_navigation(app_id, decision);
    }

    fn apply_navigation(&self, app_id: &AppId, decision: NavigationDecision) {
        self.cancel_generation(app_id);
        let NavigationDecision {
            next_path,
            next_history,
            use_cache,
            cache_key,
            ..
        } = decision;

        let Ok(generation) =
            self.inner
                .sessions
                .begin_navigation(app_id, next_path, next_history.clone())
        else {
            return;
        };

        if use_cache {
            let cached = self.cached_content(&cache_key);
            if let Some(content) = cached {
                let _ = self.inner.sessions.apply_cached(app_id, generation, content);
                return;
            }
        }

        if next_history.is_empty() {
            logging::debug_warn!("history cap is zero; not generating content for `{app_id}`");
            return;
        }

        if self.inner.sessions.mark_loading(app_id, generation).is_ok() {
            self.start_generation(app_id.clone(), generation, next_history);
        }
    }

    fn start_generation(
        &self,
        app_id: AppId,
        generation: GenerationId,
        history: InteractionHistory,
    ) {
        let request = {
            let config = self.inner.config.borrow();
            GenerationRequest {
                history: history.to_vec(),
                max_history_length: config.history_cap,
                language: config.language.clone(),
            }
        };
        let stream = self.inner.services.generation.generate(request);
        let ingester = StreamIngester::new(self.inner.sessions.clone(), app_id.clone(), generation);
        let (abort_handle, registration) = AbortHandle::new_pair();
        self.inner
            .generations
            .borrow_mut()
            .insert(app_id.clone(), (generation, abort_handle));

        let weak = Rc::downgrade(&self.inner);
        let task_app_id = app_id.clone();
        let task = async move {
            let outcome = Abortable::new(ingester.ingest(stream), registration).await;
            if let Some(inner) = weak.upgrade() {
                DesktopRuntime { inner }.finish_generation(&task_app_id, generation, outcome);
            }
        };

        if let Err(err) = self.inner.services.spawner.spawn_task(task.boxed_local()) {
            logging::error!("failed to spawn content generation for `{app_id}`: {err}");
            self.forget_generation(&app_id, generation);
            let error = GenerationError::Spawn(err);
            let _ = self
                .inner
                .sessions
                .fail_generation(&app_id, generation, error.to_string());
            let _ = self.inner.sessions.finish_generation(&app_id, generation);
        }
    }

    fn finish_generation(
        &self,
        app_id: &AppId,
        generation: GenerationId,
        outcome: Result<IngestOutcome, Aborted>,
    ) {
        self.forget_generation(app_id, generation);
        match outcome {
            Ok(IngestOutcome::Failed(err)) => {
                logging::error!("content generation for `{app_id}` failed: {err}")
            }
            Ok(IngestOutcome::Completed | IngestOutcome::Dropped(_)) => {}
            Err(Aborted) => {
                logging::debug_warn!("content generation for `{app_id}` was cancelled")
            }
        }
    }

    fn forget_generation(&self, app_id: &AppId, generation: GenerationId) {
        let mut generations = self.inner.generations.borrow_mut();
        if generations
            .get(app_id)
            .is_some_and(|(current, _)| *current == generation)
        {
            generations.remove(app_id);
        }
    }

    fn cancel_generation(&self, app_id: &AppId) {
        let cancelled = self.inner.generations.borrow_mut().remove(app_id);
        if let Some((_, handle)) = cancelled {
            handle.abort();
        }
    }

    fn run_runtime_effect(&self, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::PersistLayout => self.persist_layout(),
            RuntimeEffect::DiscardSession(app_id) => {
                self.cancel_generation(&app_id);
                self.inner.sessions.remove(&app_id);
            }
        }
    }

    fn persist_layout(&self) {
        let snapshot = self.inner.desktop.borrow().layout_snapshot();
        let store = self.inner.services.app_state.clone();
        self.spawn(
            "window layout persistence",
            async move {
                if let Err(err) =
                    persistence::persist_layout_snapshot(store.as_ref(), &snapshot).await
                {
                    logging::warn!("persist window layout failed: {err}");
                }
            }
            .boxed_local(),
        );
    }

    fn spawn(&self, label: &str, task: futures::future::LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.inner.services.spawner.spawn_task(task) {
            logging::warn!("failed to spawn {label}: {err}");
        }
    }

    fn write_back_cache(&self, app_id: &AppId) {
        let Some(session) = self.inner.sessions.get(app_id) else {
            return;
        };
        if session.is_loading || session.error.is_some() || session.content.is_empty() {
            return;
        }
        self.inner
            .cache
            .borrow_mut()
            .store(session.path.cache_key(), &session.content);
    }

    fn emit(&self, event: &RuntimeEvent) {
        let observers = self.inner.observers.borrow().clone();
        for observer in observers {
            observer(self, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::LocalPool;
    use platform_host::{ChannelContentStreamClient, ScriptedContentStreamClient};
    use pretty_assertions::assert_eq;

    use super::*;

    fn runtime_with(
        client: Rc<dyn platform_host::ContentStreamClient>,
        config: RuntimeConfig,
    ) -> (DesktopRuntime, LocalPool) {
        let pool = LocalPool::new();
        let services = HostServices::headless(client, Rc::new(pool.spawner()));
        (DesktopRuntime::new(services, config), pool)
    }

    #[test]
    fn launch_streams_content_into_new_session() {
        let client = ScriptedContentStreamClient::default();
        client.push_fragments(["<p>", "calc", "</p>"]);
        let (runtime, mut pool) = runtime_with(Rc::new(client.clone()), RuntimeConfig::default());

        assert!(runtime.launch_app("calculator_app"));
        let session = runtime
            .session(&AppId::from("calculator_app"))
            .expect("session");
        assert!(session.is_loading);
        assert_eq!(runtime.content_view(), ContentView::Loading);

        pool.run_until_stalled();

        let session = runtime
            .session(&AppId::from("calculator_app"))
            .expect("session");
        assert_eq!(session.content, "<p>calc</p>");
        assert!(!session.is_loading);
        assert_eq!(runtime.window_title(), "Calculator");
        assert_eq!(client.requests().len(), 1);
        assert_eq!(client.requests()[0].language, "English");
    }

    #[test]
    fn reopening_an_open_app_only_activates_it() {
        let client = ScriptedContentStreamClient::default();
        client.push_fragments(["notes"]);
        let (runtime, mut pool) = runtime_with(Rc::new(client.clone()), RuntimeConfig::default());

        runtime.launch_app("notepad_app");
        pool.run_until_stalled();
        runtime.show_desktop();
        runtime.launch_app("notepad_app");
        pool.run_until_stalled();

        assert_eq!(client.requests().len(), 1);
        assert_eq!(runtime.active_app(), Some(AppId::from("notepad_app")));
        assert_eq!(
            runtime
                .session(&AppId::from("notepad_app"))
                .expect("session")
                .content,
            "notes"
        );
    }

    #[test]
    fn close_button_interaction_closes_the_window_and_drops_the_session() {
        let client = ScriptedContentStreamClient::default();
        client.push_fragments(["<button>"]);
        let (runtime, mut pool) = runtime_with(Rc::new(client), RuntimeConfig::default());

        runtime.launch_app("trash_bin");
        pool.run_until_stalled();
        runtime.interact(InteractionEvent::new(
            crate::router::APP_CLOSE_INTERACTION_ID,
            "button_press",
        ));

        assert!(runtime.session(&AppId::from("trash_bin")).is_none());
        assert!(runtime.desktop().open_apps.is_empty());
        assert_eq!(runtime.content_view(), ContentView::Desktop);
    }

    #[test]
    fn superseding_navigation_cancels_previous_stream() {
        let client = ChannelContentStreamClient::default();
        let (runtime, mut pool) = runtime_with(Rc::new(client.clone()), RuntimeConfig::default());

        runtime.launch_app("web_browser_app");
        pool.run_until_stalled();
        let first = client.sender(0).expect("first stream");
        first.send_fragment("<iframe>");
        pool.run_until_stalled();

        runtime.interact(InteractionEvent::new("open_news", "link_click"));
        pool.run_until_stalled();

        assert!(first.is_closed());
        let session = runtime
            .session(&AppId::from("web_browser_app"))
            .expect("session");
        assert_eq!(session.content, "");
        assert!(session.is_loading);
        assert!(runtime.can_go_back());
    }

    #[test]
    fn search_resets_open_web_app_to_the_new_query() {
        let client = ScriptedContentStreamClient::default();
        client.push_fragments(["home"]);
        client.push_fragments(["results"]);
        let (runtime, mut pool) = runtime_with(Rc::new(client.clone()), RuntimeConfig::default());

        assert!(!runtime.search("   "));
        assert!(runtime.search("weather"));
        pool.run_until_stalled();
        runtime.show_desktop();
        assert!(runtime.search("news"));
        pool.run_until_stalled();

        let session = runtime
            .session(&AppId::from(apps::WEB_BROWSER_APP_ID))
            .expect("session");
        assert_eq!(session.path.segments(), [apps::WEB_BROWSER_APP_ID]);
        assert_eq!(session.content, "results");
        assert_eq!(runtime.active_app(), Some(AppId::from(apps::WEB_BROWSER_APP_ID)));
        let second = &client.requests()[1];
        assert_eq!(second.history.len(), 1);
        assert_eq!(second.history[0].value.as_deref(), Some("news"));
    }

    #[test]
    fn observers_see_session_and_desktop_changes() {
        let client = ScriptedContentStreamClient::default();
        client.push_fragments(["x"]);
        let (runtime, mut pool) = runtime_with(Rc::new(client), RuntimeConfig::default());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        runtime.subscribe(move |_, event| sink.borrow_mut().push(event.clone()));

        runtime.launch_app("music_app");
        pool.run_until_stalled();

        let events = events.borrow();
        assert!(events.contains(&RuntimeEvent::DesktopChanged));
        assert!(events.contains(&RuntimeEvent::SessionChanged(AppId::from("music_app"))));
    }

    #[test]
    fn desktop_change_for_close_is_emitted_after_session_is_dropped() {
        let client = ChannelContentStreamClient::default();
        let (runtime, mut pool) = runtime_with(Rc::new(client), RuntimeConfig::default());
        runtime.launch_app("travel_app");
        pool.run_until_stalled();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        runtime.subscribe(move |runtime, event| {
            if *event == RuntimeEvent::DesktopChanged {
                let app_id = AppId::from("travel_app");
                sink.borrow_mut().push((
                    runtime.desktop().is_open(&app_id),
                    runtime.session(&app_id).is_some(),
                ));
            }
        });

        runtime.close_active();

        assert_eq!(*seen.borrow(), vec![(false, false)]);
    }

    #[test]
    fn spawn_failure_surfaces_as_session_error() {
        struct RefusingSpawner;
        impl platform_host::TaskSpawner for RefusingSpawner {
            fn spawn_task(
                &self,
                _task: futures::future::LocalBoxFuture<'static, ()>,
            ) -> Result<(), String> {
                Err("executor shut down".to_string())
            }
        }

        let services = HostServices::headless(
            Rc::new(ScriptedContentStreamClient::default()),
            Rc::new(RefusingSpawner),
        );
        let runtime = DesktopRuntime::new(services, RuntimeConfig::default());
        runtime.launch_app("photos_app");

        let session = runtime
            .session(&AppId::from("photos_app"))
            .expect("session");
        assert!(!session.is_loading);
        assert_eq!(
            session.error.as_deref(),
            Some("failed to schedule content generation: executor shut down")
        );
    }
}
