//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! On native targets the adapters degrade to empty reads and rejected spawns so the crate still
//! builds for workspace-wide checks.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod adapters;
pub mod spawn;
pub mod storage;

pub use adapters::build_host_services;
pub use spawn::WebTaskSpawner;
pub use storage::local_app_state::WebAppStateStore;
