//! Error types for the window lifecycle reducer and the generation pipeline.

use thiserror::Error;

use crate::model::AppId;

/// Message shown when the backend fails without saying why.
pub const GENERATION_FAILURE_FALLBACK: &str = "Failed to stream content from the API.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that reference an instance that is not open.
pub enum ReducerError {
    /// The target app has no open window.
    #[error("window not found for app `{0}`")]
    WindowNotFound(AppId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Terminal failure of one generation attempt. `Display` is the user-facing panel message.
pub enum GenerationError {
    /// The backend rejected the request or the stream ended abnormally.
    #[error("{0}")]
    Stream(String),
    /// The backend failed with an empty message.
    #[error("{}", GENERATION_FAILURE_FALLBACK)]
    Unspecified,
    /// The host executor refused the ingestion task.
    #[error("failed to schedule content generation: {0}")]
    Spawn(String),
}

impl GenerationError {
    pub fn from_stream_message(message: String) -> Self {
        if message.trim().is_empty() {
            Self::Unspecified
        } else {
            Self::Stream(message)
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// A session write that no longer has a valid target. Always dropped silently.
pub enum StaleWrite {
    /// The instance was closed.
    #[error("session no longer exists")]
    Closed,
    /// A newer navigation replaced the generation the write belonged to.
    #[error("generation was superseded")]
    Superseded,
}
