//! Window lifecycle actions, side-effect intents, and transition logic.

use crate::{
    error::ReducerError,
    model::{
        AppId, DesktopState, DragSession, LayoutSnapshot, PointerPosition, PointerState,
        ResizeEdge, ResizeSession, WindowRect, WindowState, DEFAULT_WINDOW_HEIGHT,
        DEFAULT_WINDOW_WIDTH,
    },
};

pub const MIN_WINDOW_WIDTH: i32 = 400;
pub const MIN_WINDOW_HEIGHT: i32 = 300;
const CASCADE_STEP: i32 = 20;
const CASCADE_SLOTS: i32 = 8;

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open (or re-activate) the window of an app instance.
    OpenWindow {
        /// App to open.
        app_id: AppId,
    },
    /// Make an open window the active one (taskbar switch).
    ActivateWindow {
        /// Window to activate.
        app_id: AppId,
    },
    /// Deactivate the active window without closing it.
    MinimizeActive,
    /// Deactivate every window and show the desktop.
    ShowDesktop,
    /// Fill the viewport with the active window.
    MaximizeActive,
    /// Return the active window to its pre-maximize rect.
    RestoreActive,
    /// Maximize or restore the active window.
    ToggleMaximizeActive,
    /// Close an app instance.
    CloseWindow {
        /// Window to close.
        app_id: AppId,
    },
    /// Begin dragging a window.
    BeginMove {
        /// Window being dragged.
        app_id: AppId,
        /// Pointer position at drag start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window drag.
    UpdateMove {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window drag.
    EndMove,
    /// Begin resizing a window.
    BeginResize {
        /// Window being resized.
        app_id: AppId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window resize.
    UpdateResize {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window resize.
    EndResize,
    /// Record the desktop area available to windows.
    SetViewport {
        /// Viewport rectangle.
        viewport: WindowRect,
    },
    /// Open or close the parameters panel.
    ToggleParameters,
    /// Restore remembered window geometry from a persisted snapshot.
    HydrateLayout {
        /// Snapshot payload to restore.
        snapshot: LayoutSnapshot,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the runtime to execute.
pub enum RuntimeEffect {
    /// Persist the current window layout snapshot.
    PersistLayout,
    /// Drop the session of a closed instance and cancel its generation.
    DiscardSession(AppId),
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting side effects.
///
/// # Errors
///
/// Returns [`ReducerError::WindowNotFound`] when an action references an app with no open window.
pub fn reduce_desktop(
    state: &mut DesktopState,
    pointer_state: &mut PointerState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow { app_id } => {
            if !state.open_apps.contains(&app_id) {
                state.open_apps.push(app_id.clone());
            }
            if !state.windows.contains_key(&app_id) {
                let rect = initial_rect(state, &app_id);
                state.windows.insert(app_id.clone(), WindowState::new(rect));
                effects.push(RuntimeEffect::PersistLayout);
            }
            state.active_app = Some(app_id);
            state.parameters_open = false;
        }
        DesktopAction::ActivateWindow { app_id } => {
            find_window_mut(state, &app_id)?;
            state.active_app = Some(app_id);
            state.parameters_open = false;
        }
        DesktopAction::MinimizeActive | DesktopAction::ShowDesktop => {
            state.active_app = None;
        }
        DesktopAction::MaximizeActive => {
            if maximize_active(state)? {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::RestoreActive => {
            if restore_active(state)? {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::ToggleMaximizeActive => {
            let maximized = state
                .active_window()
                .map(|(_, window)| window.maximized)
                .unwrap_or(false);
            let changed = if maximized {
                restore_active(state)?
            } else {
                maximize_active(state)?
            };
            if changed {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::CloseWindow { app_id } => {
            let window = state
                .windows
                .remove(&app_id)
                .ok_or_else(|| ReducerError::WindowNotFound(app_id.clone()))?;
            state.saved_layout.insert(app_id.clone(), window.restored());
            state.open_apps.retain(|open| open != &app_id);
            if state.active_app.as_ref() == Some(&app_id) {
                state.active_app = None;
            }
            if pointer_state
                .dragging
                .as_ref()
                .is_some_and(|session| session.app_id == app_id)
            {
                pointer_state.dragging = None;
            }
            if pointer_state
                .resizing
                .as_ref()
                .is_some_and(|session| session.app_id == app_id)
            {
                pointer_state.resizing = None;
            }
            effects.push(RuntimeEffect::DiscardSession(app_id));
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::BeginMove { app_id, pointer } => {
            let window = find_window_mut(state, &app_id)?;
            if window.maximized {
                return Ok(effects);
            }
            let rect_start = window.rect;
            state.active_app = Some(app_id.clone());
            pointer_state.dragging = Some(DragSession {
                app_id,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateMove { pointer } => {
            if let Some(session) = pointer_state.dragging.as_ref() {
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                let viewport = state.viewport;
                let window = find_window_mut(state, &session.app_id)?;
                if !window.maximized {
                    let moved = session.rect_start.offset(dx, dy);
                    window.rect = match viewport {
                        Some(viewport) => moved.clamped_to(viewport),
                        None => moved,
                    };
                }
            }
        }
        DesktopAction::EndMove => {
            if pointer_state.dragging.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::BeginResize {
            app_id,
            edge,
            pointer,
        } => {
            let window = find_window_mut(state, &app_id)?;
            if window.maximized {
                return Ok(effects);
            }
            let rect_start = window.rect;
            state.active_app = Some(app_id.clone());
            pointer_state.resizing = Some(ResizeSession {
                app_id,
                edge,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateResize { pointer } => {
            if let Some(session) = pointer_state.resizing.as_ref() {
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                let viewport = state.viewport;
                let window = find_window_mut(state, &session.app_id)?;
                if !window.maximized {
                    let resized = resize_rect(session.rect_start, session.edge, dx, dy);
                    window.rect = match viewport {
                        Some(viewport) => bound_resize(resized, viewport),
                        None => resized,
                    };
                }
            }
        }
        DesktopAction::EndResize => {
            if pointer_state.resizing.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::SetViewport { viewport } => {
            let viewport = WindowRect {
                w: viewport.w.max(0),
                h: viewport.h.max(0),
                ..viewport
            };
            state.viewport = Some(viewport);
            for window in state.windows.values_mut() {
                if window.maximized {
                    window.rect = viewport;
                } else {
                    window.rect = window.rect.clamped_to(viewport);
                }
            }
        }
        DesktopAction::ToggleParameters => {
            state.parameters_open = !state.parameters_open;
            if state.parameters_open {
                state.active_app = None;
            }
        }
        DesktopAction::HydrateLayout { snapshot } => {
            state.saved_layout = snapshot
                .windows
                .into_iter()
                .map(|(app_id, window)| (app_id, window.restored()))
                .collect();
        }
    }

    Ok(effects)
}

fn find_window_mut<'a>(
    state: &'a mut DesktopState,
    app_id: &AppId,
) -> Result<&'a mut WindowState, ReducerError> {
    state
        .windows
        .get_mut(app_id)
        .ok_or_else(|| ReducerError::WindowNotFound(app_id.clone()))
}

/// Returns whether the window changed. No active app or no viewport is a no-op.
fn maximize_active(state: &mut DesktopState) -> Result<bool, ReducerError> {
    let (Some(app_id), Some(viewport)) = (state.active_app.clone(), state.viewport) else {
        return Ok(false);
    };
    let window = find_window_mut(state, &app_id)?;
    if window.maximized {
        return Ok(false);
    }
    window.restore_rect = Some(window.rect);
    window.rect = viewport;
    window.maximized = true;
    Ok(true)
}

fn restore_active(state: &mut DesktopState) -> Result<bool, ReducerError> {
    let Some(app_id) = state.active_app.clone() else {
        return Ok(false);
    };
    let window = find_window_mut(state, &app_id)?;
    if !window.maximized {
        return Ok(false);
    }
    *window = window.restored();
    Ok(true)
}

fn initial_rect(state: &DesktopState, app_id: &AppId) -> WindowRect {
    if let Some(saved) = state.saved_layout.get(app_id) {
        let rect = saved.rect.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
        return match state.viewport {
            Some(viewport) => rect.clamped_to(viewport),
            None => rect,
        };
    }
    match state.viewport {
        Some(viewport) => WindowRect::centered_in(
            viewport,
            DEFAULT_WINDOW_WIDTH.min(viewport.w),
            DEFAULT_WINDOW_HEIGHT.min(viewport.h),
        ),
        None => {
            let slot = (state.windows.len() as i32) % CASCADE_SLOTS;
            WindowRect::default().offset(slot * CASCADE_STEP, slot * CASCADE_STEP)
        }
    }
}

fn resize_rect(start: WindowRect, edge: ResizeEdge, dx: i32, dy: i32) -> WindowRect {
    let grows_west = matches!(
        edge,
        ResizeEdge::West | ResizeEdge::NorthWest | ResizeEdge::SouthWest
    );
    let grows_east = matches!(
        edge,
        ResizeEdge::East | ResizeEdge::NorthEast | ResizeEdge::SouthEast
    );
    let grows_north = matches!(
        edge,
        ResizeEdge::North | ResizeEdge::NorthEast | ResizeEdge::NorthWest
    );
    let grows_south = matches!(
        edge,
        ResizeEdge::South | ResizeEdge::SouthEast | ResizeEdge::SouthWest
    );

    let mut rect = start;
    if grows_east {
        rect.w = (start.w + dx).max(MIN_WINDOW_WIDTH);
    }
    if grows_west {
        // The right edge stays put; the left edge stops at the minimum width.
        let dx = dx.min(start.w - MIN_WINDOW_WIDTH);
        rect.x = start.x + dx;
        rect.w = start.w - dx;
    }
    if grows_south {
        rect.h = (start.h + dy).max(MIN_WINDOW_HEIGHT);
    }
    if grows_north {
        let dy = dy.min(start.h - MIN_WINDOW_HEIGHT);
        rect.y = start.y + dy;
        rect.h = start.h - dy;
    }
    rect
}

/// Trims a resized rect at the viewport edges without moving the opposite edge.
fn bound_resize(rect: WindowRect, viewport: WindowRect) -> WindowRect {
    let mut bounded = rect;
    if bounded.x < viewport.x {
        bounded.w -= viewport.x - bounded.x;
        bounded.x = viewport.x;
    }
    if bounded.y < viewport.y {
        bounded.h -= viewport.y - bounded.y;
        bounded.y = viewport.y;
    }
    bounded.w = bounded.w.min(viewport.x + viewport.w - bounded.x);
    bounded.h = bounded.h.min(viewport.y + viewport.h - bounded.y);
    bounded
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VIEWPORT: WindowRect = WindowRect {
        x: 0,
        y: 0,
        w: 1200,
        h: 800,
    };

    fn app(id: &str) -> AppId {
        AppId::from(id)
    }

    fn dispatch(
        state: &mut DesktopState,
        pointer: &mut PointerState,
        action: DesktopAction,
    ) -> Vec<RuntimeEffect> {
        reduce_desktop(state, pointer, action).expect("reduce")
    }

    fn desktop_with_viewport() -> (DesktopState, PointerState) {
        let mut state = DesktopState::default();
        let mut pointer = PointerState::default();
        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::SetViewport { viewport: VIEWPORT },
        );
        (state, pointer)
    }

    fn open(state: &mut DesktopState, pointer: &mut PointerState, id: &str) {
        dispatch(
            state,
            pointer,
            DesktopAction::OpenWindow { app_id: app(id) },
        );
    }

    #[test]
    fn open_centers_default_window_and_activates_it() {
        let (mut state, mut pointer) = desktop_with_viewport();
        state.parameters_open = true;

        open(&mut state, &mut pointer, "notepad_app");

        let window = state.windows.get(&app("notepad_app")).expect("window");
        assert_eq!(
            window.rect,
            WindowRect {
                x: 200,
                y: 100,
                w: 800,
                h: 600
            }
        );
        assert_eq!(state.active_app, Some(app("notepad_app")));
        assert!(!state.parameters_open);
    }

    #[test]
    fn negative_viewport_is_normalized_before_clamping_windows() {
        let mut state = DesktopState::default();
        let mut pointer = PointerState::default();
        open(&mut state, &mut pointer, "notepad_app");

        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::SetViewport {
                viewport: WindowRect {
                    x: 0,
                    y: 0,
                    w: -1,
                    h: 300,
                },
            },
        );

        assert_eq!(
            state.viewport,
            Some(WindowRect {
                x: 0,
                y: 0,
                w: 0,
                h: 300
            })
        );
        let window = state.windows.get(&app("notepad_app")).expect("window");
        assert_eq!(window.rect.w, 0);
        assert_eq!(window.rect.x, 0);
    }

    #[test]
    fn reopening_keeps_geometry_and_open_order() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "notepad_app");
        open(&mut state, &mut pointer, "maps_app");
        let before = state.windows.clone();

        let effects = dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::OpenWindow {
                app_id: app("notepad_app"),
            },
        );

        assert!(effects.is_empty());
        assert_eq!(state.windows, before);
        assert_eq!(state.open_apps, vec![app("notepad_app"), app("maps_app")]);
        assert_eq!(state.active_app, Some(app("notepad_app")));
    }

    #[test]
    fn maximize_then_restore_returns_exact_rect_and_restore_is_idempotent() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "photos_app");
        let original = state.windows[&app("photos_app")];

        dispatch(&mut state, &mut pointer, DesktopAction::MaximizeActive);
        let maximized = state.windows[&app("photos_app")];
        assert!(maximized.maximized);
        assert_eq!(maximized.rect, VIEWPORT);
        assert_eq!(maximized.restore_rect, Some(original.rect));

        dispatch(&mut state, &mut pointer, DesktopAction::RestoreActive);
        let once = state.windows[&app("photos_app")];
        let effects = dispatch(&mut state, &mut pointer, DesktopAction::RestoreActive);
        assert!(effects.is_empty());
        assert_eq!(state.windows[&app("photos_app")], once);
        assert_eq!(once, original);
    }

    #[test]
    fn maximize_without_viewport_or_active_app_is_noop() {
        let mut state = DesktopState::default();
        let mut pointer = PointerState::default();
        open(&mut state, &mut pointer, "maps_app");
        let effects = dispatch(&mut state, &mut pointer, DesktopAction::MaximizeActive);
        assert!(effects.is_empty());
        assert!(!state.windows[&app("maps_app")].maximized);

        let (mut state, mut pointer) = desktop_with_viewport();
        let effects = dispatch(&mut state, &mut pointer, DesktopAction::ToggleMaximizeActive);
        assert!(effects.is_empty());
    }

    #[test]
    fn close_restores_geometry_and_discards_session() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "music_app");
        let original = state.windows[&app("music_app")].rect;
        dispatch(&mut state, &mut pointer, DesktopAction::MaximizeActive);

        let effects = dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::CloseWindow {
                app_id: app("music_app"),
            },
        );

        assert_eq!(
            effects,
            vec![
                RuntimeEffect::DiscardSession(app("music_app")),
                RuntimeEffect::PersistLayout
            ]
        );
        assert!(state.open_apps.is_empty());
        assert_eq!(state.active_app, None);
        assert_eq!(
            state.saved_layout.get(&app("music_app")),
            Some(&WindowState::new(original))
        );

        open(&mut state, &mut pointer, "music_app");
        assert_eq!(state.windows[&app("music_app")], WindowState::new(original));
    }

    #[test]
    fn unknown_window_reports_error() {
        let mut state = DesktopState::default();
        let mut pointer = PointerState::default();
        let err = reduce_desktop(
            &mut state,
            &mut pointer,
            DesktopAction::ActivateWindow {
                app_id: app("ghost"),
            },
        )
        .expect_err("missing window");
        assert_eq!(err, ReducerError::WindowNotFound(app("ghost")));
    }

    #[test]
    fn drag_is_clamped_to_viewport_and_persists_on_end() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "terminal_app");

        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::BeginMove {
                app_id: app("terminal_app"),
                pointer: PointerPosition { x: 10, y: 10 },
            },
        );
        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::UpdateMove {
                pointer: PointerPosition { x: 2000, y: -500 },
            },
        );

        let rect = state.windows[&app("terminal_app")].rect;
        assert_eq!((rect.x, rect.y), (400, 0));
        let effects = dispatch(&mut state, &mut pointer, DesktopAction::EndMove);
        assert_eq!(effects, vec![RuntimeEffect::PersistLayout]);
        assert_eq!(pointer.dragging, None);
    }

    #[test]
    fn drag_is_ignored_while_maximized() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "terminal_app");
        dispatch(&mut state, &mut pointer, DesktopAction::MaximizeActive);

        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::BeginMove {
                app_id: app("terminal_app"),
                pointer: PointerPosition { x: 0, y: 0 },
            },
        );

        assert_eq!(pointer.dragging, None);
        assert!(dispatch(&mut state, &mut pointer, DesktopAction::EndMove).is_empty());
    }

    #[test]
    fn west_resize_stops_at_minimum_width_without_moving_right_edge() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "notepad_app");
        let start = state.windows[&app("notepad_app")].rect;

        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::BeginResize {
                app_id: app("notepad_app"),
                edge: ResizeEdge::West,
                pointer: PointerPosition { x: 0, y: 0 },
            },
        );
        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::UpdateResize {
                pointer: PointerPosition { x: 700, y: 0 },
            },
        );

        let rect = state.windows[&app("notepad_app")].rect;
        assert_eq!(rect.w, MIN_WINDOW_WIDTH);
        assert_eq!(rect.x + rect.w, start.x + start.w);
    }

    #[test]
    fn hydrate_layout_seeds_geometry_for_next_open() {
        let (mut state, mut pointer) = desktop_with_viewport();
        let saved = WindowRect {
            x: 30,
            y: 40,
            w: 500,
            h: 350,
        };
        let mut snapshot = DesktopState::default().layout_snapshot();
        snapshot
            .windows
            .insert(app("weather_app"), WindowState::new(saved));

        dispatch(
            &mut state,
            &mut pointer,
            DesktopAction::HydrateLayout { snapshot },
        );
        open(&mut state, &mut pointer, "weather_app");

        assert_eq!(state.windows[&app("weather_app")].rect, saved);
    }

    #[test]
    fn parameters_panel_deactivates_app() {
        let (mut state, mut pointer) = desktop_with_viewport();
        open(&mut state, &mut pointer, "settings_app");
        dispatch(&mut state, &mut pointer, DesktopAction::ToggleParameters);
        assert!(state.parameters_open);
        assert_eq!(state.active_app, None);
        dispatch(&mut state, &mut pointer, DesktopAction::ToggleParameters);
        assert!(!state.parameters_open);
    }
}
