//! Durable storage contracts and in-memory adapters.

pub mod app_state;
