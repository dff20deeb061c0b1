//! Typed host-domain contracts shared by the desktop runtime and its browser adapters.
//!
//! This crate is the API-first boundary for platform services: the generation backend stream
//! contract, durable app-state storage, and task spawning. Concrete browser adapters live in
//! `platform_host_web`; in-memory and scripted adapters here back headless hosts and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod generation;
pub mod host;
pub mod spawn;
pub mod storage;

pub use generation::{
    ChannelContentStreamClient, ContentStream, ContentStreamClient, ContentStreamSender,
    GenerationRequest, InteractionEvent, NoopContentStreamClient, ScriptedContentStreamClient,
};
pub use host::{HostServices, HostStrategy};
pub use spawn::TaskSpawner;
pub use storage::app_state::{
    load_app_state_with_migration, save_app_state_with, unix_time_ms_now, AppStateEnvelope,
    AppStateStore, AppStateStoreFuture, MemoryAppStateStore, NoopAppStateStore,
    APP_STATE_ENVELOPE_VERSION, WINDOW_LAYOUT_NAMESPACE,
};
