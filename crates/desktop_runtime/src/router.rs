//! Pure navigation decisions for one application instance.
//!
//! The router never touches session state. It turns the current session plus an incoming
//! interaction into the next path, the next history, and whether the cache can serve the result.

use crate::{
    content_cache::ContentCache,
    model::{AppId, InteractionEvent, InteractionHistory, NavigationPath, SessionState},
};

/// Interaction id that closes the owning window instead of navigating.
pub const APP_CLOSE_INTERACTION_ID: &str = "app_close_button";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Interact(InteractionEvent),
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// First screen of a freshly opened instance.
    Open,
    Forward,
    Back,
    /// The interaction repeats the current screen's own id; always regenerates.
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDecision {
    pub kind: NavigationKind,
    pub next_path: NavigationPath,
    pub next_history: InteractionHistory,
    pub use_cache: bool,
    pub cache_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Close,
    /// Nothing to do, e.g. back at the root screen.
    Unchanged,
    Navigate(NavigationDecision),
}

pub fn route(
    session: &SessionState,
    navigation: Navigation,
    history_cap: usize,
    cache: &ContentCache,
) -> RouteOutcome {
    match navigation {
        Navigation::Interact(event) if event.id == APP_CLOSE_INTERACTION_ID => RouteOutcome::Close,
        Navigation::Interact(event) if session.path.last() == Some(event.id.as_str()) => {
            RouteOutcome::Navigate(decide(
                NavigationKind::Restart,
                session.path.clone(),
                session.history.clone(),
                cache,
            ))
        }
        Navigation::Interact(event) => {
            let next_path = session.path.pushed(event.id.clone());
            let next_history = session.history.prepended(event, history_cap);
            RouteOutcome::Navigate(decide(
                NavigationKind::Forward,
                next_path,
                next_history,
                cache,
            ))
        }
        Navigation::Back => match session.path.parent() {
            Some(next_path) => RouteOutcome::Navigate(decide(
                NavigationKind::Back,
                next_path,
                session.history.without_latest(),
                cache,
            )),
            None => RouteOutcome::Unchanged,
        },
    }
}

/// Decision for the first screen of a newly opened instance.
pub fn route_open(
    app_id: &AppId,
    initial: InteractionEvent,
    history_cap: usize,
    cache: &ContentCache,
) -> NavigationDecision {
    let next_history = InteractionHistory::default().prepended(initial, history_cap);
    decide(
        NavigationKind::Open,
        NavigationPath::root(app_id),
        next_history,
        cache,
    )
}

fn decide(
    kind: NavigationKind,
    next_path: NavigationPath,
    next_history: InteractionHistory,
    cache: &ContentCache,
) -> NavigationDecision {
    let cache_key = next_path.cache_key();
    let use_cache = kind != NavigationKind::Restart && cache.contains(&cache_key);
    NavigationDecision {
        kind,
        next_path,
        next_history,
        use_cache,
        cache_key,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::GenerationId;

    fn event(id: &str) -> InteractionEvent {
        InteractionEvent::new(id, "generic_click")
    }

    fn session(path: &[&str], history: &[&str]) -> SessionState {
        let mut state = SessionState::new(path.iter().copied().collect(), GenerationId(1));
        state.history = history.iter().map(|id| event(id)).collect();
        state
    }

    fn decision(outcome: RouteOutcome) -> NavigationDecision {
        match outcome {
            RouteOutcome::Navigate(decision) => decision,
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn close_button_short_circuits() {
        let outcome = route(
            &session(&["notepad_app"], &["notepad_app"]),
            Navigation::Interact(event(APP_CLOSE_INTERACTION_ID)),
            3,
            &ContentCache::new(true),
        );
        assert_eq!(outcome, RouteOutcome::Close);
    }

    #[test]
    fn forward_appends_path_and_caps_history() {
        let decision = decision(route(
            &session(&["a", "b"], &["b", "a"]),
            Navigation::Interact(event("c")),
            2,
            &ContentCache::default(),
        ));
        assert_eq!(decision.kind, NavigationKind::Forward);
        assert_eq!(decision.next_path.segments(), ["a", "b", "c"]);
        let ids: Vec<_> = decision
            .next_history
            .events()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(decision.cache_key, "a__b__c");
        assert!(!decision.use_cache);
    }

    #[test]
    fn restart_keeps_state_and_never_uses_cache() {
        let mut cache = ContentCache::new(true);
        cache.store("gaming_app__select_game_snake".to_string(), "<canvas>");
        let current = session(
            &["gaming_app", "select_game_snake"],
            &["select_game_snake", "gaming_app"],
        );

        let decision = decision(route(
            &current,
            Navigation::Interact(event("select_game_snake")),
            3,
            &cache,
        ));
        assert_eq!(decision.kind, NavigationKind::Restart);
        assert_eq!(decision.next_path, current.path);
        assert_eq!(decision.next_history, current.history);
        assert!(!decision.use_cache);
    }

    #[test]
    fn back_pops_one_level_and_is_unchanged_at_root() {
        let decision = decision(route(
            &session(&["a", "b"], &["b", "a"]),
            Navigation::Back,
            3,
            &ContentCache::default(),
        ));
        assert_eq!(decision.kind, NavigationKind::Back);
        assert_eq!(decision.next_path.segments(), ["a"]);
        assert_eq!(decision.next_history.len(), 1);

        let outcome = route(
            &session(&["a"], &["a"]),
            Navigation::Back,
            3,
            &ContentCache::default(),
        );
        assert_eq!(outcome, RouteOutcome::Unchanged);
    }

    #[test]
    fn cache_hit_requires_enabled_cache_and_matching_key() {
        let mut cache = ContentCache::new(true);
        cache.store("a__b".to_string(), "<p>b</p>");
        let current = session(&["a"], &["a"]);

        let hit = decision(route(&current, Navigation::Interact(event("b")), 3, &cache));
        assert!(hit.use_cache);

        cache.set_enabled(false);
        let miss = decision(route(&current, Navigation::Interact(event("b")), 3, &cache));
        assert!(!miss.use_cache);
    }

    #[test]
    fn open_with_zero_cap_has_empty_history() {
        let app_id = AppId::from("calculator_app");
        let decision = route_open(&app_id, event("calculator_app"), 0, &ContentCache::default());
        assert_eq!(decision.kind, NavigationKind::Open);
        assert_eq!(decision.next_path.segments(), ["calculator_app"]);
        assert!(decision.next_history.is_empty());
    }
}
