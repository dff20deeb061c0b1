//! Browser storage adapters.

pub mod local_app_state;
