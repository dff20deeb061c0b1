//! Built-in application catalog and the desktop-level interaction events that open apps.

use crate::model::{AppId, InteractionEvent};

pub const WEB_BROWSER_APP_ID: &str = "web_browser_app";
pub const DESKTOP_SEARCH_INTERACTION_ID: &str = "desktop_search_query";
pub const APP_OPEN_KIND: &str = "app_open";
pub const SEARCH_KIND: &str = "search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Static metadata for one desktop application tile.
pub struct AppDefinition {
    pub id: &'static str,
    pub name: &'static str,
    /// Emoji or short text rendered on the tile.
    pub icon: &'static str,
    /// Tile background color.
    pub color: &'static str,
    /// Glyph color override for dark tiles.
    pub icon_color: Option<&'static str>,
}

impl AppDefinition {
    const fn new(
        id: &'static str,
        name: &'static str,
        icon: &'static str,
        color: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            icon,
            color,
            icon_color: None,
        }
    }

    pub fn app_id(&self) -> AppId {
        AppId::new(self.id)
    }
}

const APP_REGISTRY: [AppDefinition; 14] = [
    AppDefinition::new("file_explorer_app", "File Explorer", "🗂️", "#ffca28"),
    AppDefinition::new("notepad_app", "Notepad", "📝", "#fffde7"),
    AppDefinition {
        icon_color: Some("#FFFFFF"),
        ..AppDefinition::new("terminal_app", "Terminal", ">_", "#212121")
    },
    AppDefinition::new("settings_app", "Settings", "⚙️", "#e7f3ff"),
    AppDefinition::new("trash_bin", "Trash Bin", "🗑️", "#ffebee"),
    AppDefinition::new(WEB_BROWSER_APP_ID, "Web", "🌐", "#e0f7fa"),
    AppDefinition::new("calculator_app", "Calculator", "🧮", "#f5f5f5"),
    AppDefinition::new("music_app", "Music", "🎵", "#e57373"),
    AppDefinition::new("weather_app", "Weather", "☀️", "#4fc3f7"),
    AppDefinition::new("maps_app", "Maps", "🗺️", "#a5d6a7"),
    AppDefinition::new("photos_app", "Photos", "🖼️", "#fff176"),
    AppDefinition::new("travel_app", "Travel", "✈️", "#e8f5e9"),
    AppDefinition::new("shopping_app", "Shopping", "🛒", "#fff3e0"),
    AppDefinition::new("gaming_app", "Games", "🎮", "#f3e5f5"),
];

/// Returns the desktop tiles in display order.
pub fn app_registry() -> &'static [AppDefinition] {
    &APP_REGISTRY
}

pub fn find_app(app_id: &str) -> Option<&'static AppDefinition> {
    app_registry().iter().find(|app| app.id == app_id)
}

/// Builds the event fired when a desktop icon is activated.
pub fn open_interaction(app: &AppDefinition) -> InteractionEvent {
    InteractionEvent::new(app.id, APP_OPEN_KIND)
        .with_element(app.name, "icon")
        .with_app_context(app.id)
}

/// Builds the desktop search event, or `None` for a blank query.
pub fn search_interaction(query: &str) -> Option<InteractionEvent> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    Some(
        InteractionEvent::new(DESKTOP_SEARCH_INTERACTION_ID, SEARCH_KIND)
            .with_value(query)
            .with_element(format!("Search for: {query}"), "search_input")
            .with_app_context(WEB_BROWSER_APP_ID),
    )
}
