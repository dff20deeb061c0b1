//! Session state machine for a desktop whose window contents are generated on demand.
//!
//! User interactions are routed per application instance into navigation decisions; each
//! decision is served from the path-keyed content cache or streamed from the generation backend
//! and folded into the instance's session. A window lifecycle reducer owns open/close, activation,
//! and geometry, and persists the layout through the host app-state store.

pub mod apps;
pub mod config;
pub mod content_cache;
pub mod error;
pub mod ingester;
pub mod model;
pub mod persistence;
pub mod router;
pub mod runtime;
pub mod runtime_context;
pub mod session_store;
pub mod view;
pub mod window_manager;

pub use config::{RuntimeConfig, DEFAULT_HISTORY_CAP, DEFAULT_LANGUAGE};
pub use content_cache::ContentCache;
pub use error::{GenerationError, ReducerError, StaleWrite, GENERATION_FAILURE_FALLBACK};
pub use ingester::{IngestOutcome, StreamIngester};
pub use model::{
    AppId, DesktopState, GenerationId, InteractionEvent, InteractionHistory, LayoutSnapshot,
    NavigationPath, PointerPosition, PointerState, ResizeEdge, SessionState, WindowRect,
    WindowState,
};
pub use router::{
    route, route_open, Navigation, NavigationDecision, NavigationKind, RouteOutcome,
    APP_CLOSE_INTERACTION_ID,
};
pub use runtime::{DesktopRuntime, RuntimeEvent};
pub use runtime_context::{
    provide_browser_desktop_runtime, provide_desktop_runtime, use_desktop_runtime,
    DesktopRuntimeContext,
};
pub use session_store::SessionStore;
pub use view::{content_view, taskbar_entries, window_title, ContentView, TaskbarEntry};
pub use window_manager::{reduce_desktop, DesktopAction, RuntimeEffect};
