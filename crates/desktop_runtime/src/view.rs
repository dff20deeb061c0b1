//! What the desktop window should render, derived from runtime state.

use crate::{
    apps,
    model::{AppId, DesktopState, SessionState},
};

/// Window title while no app is active.
pub const DESKTOP_TITLE: &str = "My Computer";
pub const ERROR_HEADLINE: &str = "Error Generating Content";
pub const GENERATION_ERROR_HINT: &str = "This may be due to an API key issue, network problem, or \
                                         misconfiguration. Please check the developer console for \
                                         more details.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    Parameters,
    /// The icon grid and search box.
    Desktop,
    /// Spinner for a generation that has not produced anything yet.
    Loading,
    Error {
        message: String,
        hint: &'static str,
    },
    Generated {
        markup: String,
        /// More fragments may still arrive.
        streaming: bool,
    },
}

pub fn content_view(desktop: &DesktopState, session: Option<&SessionState>) -> ContentView {
    if desktop.parameters_open {
        return ContentView::Parameters;
    }
    let (Some(_), Some(session)) = (desktop.active_app.as_ref(), session) else {
        return ContentView::Desktop;
    };
    if let Some(message) = &session.error {
        return ContentView::Error {
            message: message.clone(),
            hint: GENERATION_ERROR_HINT,
        };
    }
    if session.is_loading && session.content.is_empty() {
        return ContentView::Loading;
    }
    ContentView::Generated {
        markup: session.content.clone(),
        streaming: session.is_loading,
    }
}

pub fn window_title(desktop: &DesktopState) -> String {
    if desktop.parameters_open {
        return DESKTOP_TITLE.to_string();
    }
    match &desktop.active_app {
        Some(app_id) => app_name(app_id),
        None => DESKTOP_TITLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskbarEntry {
    pub app_id: AppId,
    pub title: String,
    pub icon: &'static str,
    pub active: bool,
}

/// Open apps in open order.
pub fn taskbar_entries(desktop: &DesktopState) -> Vec<TaskbarEntry> {
    desktop
        .open_apps
        .iter()
        .map(|app_id| TaskbarEntry {
            app_id: app_id.clone(),
            title: app_name(app_id),
            icon: apps::find_app(app_id.as_str())
                .map(|app| app.icon)
                .unwrap_or_default(),
            active: desktop.active_app.as_ref() == Some(app_id),
        })
        .collect()
}

fn app_name(app_id: &AppId) -> String {
    apps::find_app(app_id.as_str())
        .map(|app| app.name.to_string())
        .unwrap_or_else(|| app_id.to_string())
}
