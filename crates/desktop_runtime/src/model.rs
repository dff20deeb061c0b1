use std::{collections::BTreeMap, fmt};

pub use platform_host::InteractionEvent;
use serde::{Deserialize, Serialize};

pub const WINDOW_LAYOUT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_WINDOW_WIDTH: i32 = 800;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 600;
/// Separator used when joining a navigation path into a cache key.
pub const CACHE_KEY_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Trail of interaction ids describing how the current screen was reached.
///
/// The first segment is always the application id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPath(Vec<String>);

impl NavigationPath {
    pub fn root(app_id: &AppId) -> Self {
        Self(vec![app_id.0.clone()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Returns this path extended by one segment.
    pub fn pushed(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns the path one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn cache_key(&self) -> String {
        self.0.join(CACHE_KEY_SEPARATOR)
    }
}

impl<S: Into<String>> FromIterator<S> for NavigationPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Interaction events, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionHistory(Vec<InteractionEvent>);

impl InteractionHistory {
    pub fn events(&self) -> &[InteractionEvent] {
        &self.0
    }

    pub fn latest(&self) -> Option<&InteractionEvent> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a history with `event` in front, keeping at most `cap` entries.
    ///
    /// The oldest entries are dropped first; a cap of zero yields an empty history.
    pub fn prepended(&self, event: InteractionEvent, cap: usize) -> Self {
        let events = std::iter::once(event)
            .chain(self.0.iter().cloned())
            .take(cap)
            .collect();
        Self(events)
    }

    /// Returns the history without its most recent entry.
    pub fn without_latest(&self) -> Self {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    pub fn to_vec(&self) -> Vec<InteractionEvent> {
        self.0.clone()
    }
}

impl FromIterator<InteractionEvent> for InteractionHistory {
    fn from_iter<I: IntoIterator<Item = InteractionEvent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fences writes from a stream against the navigation that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Generated markup. Append-only while streaming, reset on every navigation.
    pub content: String,
    pub history: InteractionHistory,
    pub path: NavigationPath,
    pub is_loading: bool,
    pub error: Option<String>,
    pub generation: GenerationId,
}

impl SessionState {
    pub fn new(path: NavigationPath, generation: GenerationId) -> Self {
        Self {
            content: String::new(),
            history: InteractionHistory::default(),
            path,
            is_loading: false,
            error: None,
            generation,
        }
    }

    /// Partial content of a generation that is still arriving.
    pub fn is_streaming(&self) -> bool {
        self.is_loading && !self.content.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    /// Shrinks and shifts the rect so it lies inside `viewport`.
    pub fn clamped_to(self, viewport: WindowRect) -> Self {
        let w = self.w.min(viewport.w).max(0);
        let h = self.h.min(viewport.h).max(0);
        let max_x = (viewport.x + viewport.w - w).max(viewport.x);
        let max_y = (viewport.y + viewport.h - h).max(viewport.y);
        Self {
            x: self.x.clamp(viewport.x, max_x),
            y: self.y.clamp(viewport.y, max_y),
            w,
            h,
        }
    }

    /// A `w` x `h` rect centered in `viewport`, never starting above or left of it.
    pub fn centered_in(viewport: WindowRect, w: i32, h: i32) -> Self {
        Self {
            x: viewport.x + ((viewport.w - w) / 2).max(0),
            y: viewport.y + ((viewport.h - h) / 2).max(0),
            w,
            h,
        }
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 40,
            y: 48,
            w: DEFAULT_WINDOW_WIDTH,
            h: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Window chrome state of one open application instance.
///
/// `restore_rect` is present exactly while the window is maximized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub rect: WindowRect,
    pub maximized: bool,
    pub restore_rect: Option<WindowRect>,
}

impl WindowState {
    pub fn new(rect: WindowRect) -> Self {
        Self {
            rect,
            maximized: false,
            restore_rect: None,
        }
    }

    /// The non-maximized form of this window.
    pub fn restored(self) -> Self {
        match (self.maximized, self.restore_rect) {
            (true, Some(rect)) => Self::new(rect),
            _ => Self::new(self.rect),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub schema_version: u32,
    pub windows: BTreeMap<AppId, WindowState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DesktopState {
    /// Open application instances in open order.
    pub open_apps: Vec<AppId>,
    pub active_app: Option<AppId>,
    pub windows: BTreeMap<AppId, WindowState>,
    /// Last known geometry per app, including apps that are currently closed.
    pub saved_layout: BTreeMap<AppId, WindowState>,
    pub viewport: Option<WindowRect>,
    pub parameters_open: bool,
}

impl DesktopState {
    pub fn is_open(&self, app_id: &AppId) -> bool {
        self.open_apps.contains(app_id)
    }

    pub fn active_window(&self) -> Option<(&AppId, &WindowState)> {
        let app_id = self.active_app.as_ref()?;
        self.windows.get_key_value(app_id)
    }

    /// Persistable layout: saved geometry overlaid with live windows, all in restored form.
    pub fn layout_snapshot(&self) -> LayoutSnapshot {
        let mut windows = self.saved_layout.clone();
        for (app_id, window) in &self.windows {
            windows.insert(app_id.clone(), window.restored());
        }
        LayoutSnapshot {
            schema_version: WINDOW_LAYOUT_SCHEMA_VERSION,
            windows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub app_id: AppId,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub app_id: AppId,
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PointerState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
}
