//! Error types for the todo client.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single HTTP exchange did not produce a usable value.
///
/// Kept for logs only; nothing user-facing is derived from it.
#[derive(Debug, Error)]
pub enum Cause {
    /// The request never got a response
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service returned status {0}")]
    Status(StatusCode),

    /// The response body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl Cause {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Cause::Status(status) => Some(*status),
            Cause::Transport(_) | Cause::Decode(_) => None,
        }
    }
}

/// One failure kind per data-access operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to fetch todos: {0}")]
    List(#[source] Cause),

    #[error("failed to fetch todo: {0}")]
    Get(#[source] Cause),

    #[error("failed to create todo: {0}")]
    Create(#[source] Cause),

    #[error("failed to update todo: {0}")]
    Update(#[source] Cause),

    #[error("failed to toggle todo: {0}")]
    Toggle(#[source] Cause),

    #[error("failed to delete todo: {0}")]
    Delete(#[source] Cause),
}

impl ApiError {
    pub fn cause(&self) -> &Cause {
        match self {
            ApiError::List(cause)
            | ApiError::Get(cause)
            | ApiError::Create(cause)
            | ApiError::Update(cause)
            | ApiError::Toggle(cause)
            | ApiError::Delete(cause) => cause,
        }
    }
}

/// Rejected form input; raised before any request is made.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    #[error("title must not be blank")]
    BlankTitle,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
