// ABOUTME: Error types for feed assembly operations.
// ABOUTME: Provides FeedFetchError (transport), FeedSourceError (static data), and the FeedError umbrella.

use std::fmt;
use thiserror::Error;

/// A remote feed fetch failed at the transport or HTTP layer.
///
/// Cloneable so every caller waiting on a deduplicated request receives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FeedFetchError {
    /// HTTP status when the server answered; `None` for transport failures.
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for FeedFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "feed fetch failed (HTTP {}): {}", status, self.message),
            None => write!(f, "feed fetch failed: {}", self.message),
        }
    }
}

impl FeedFetchError {
    /// Creates an error for a non-success HTTP status.
    pub fn status(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Creates an error for a failure that never produced a status.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self {
            status: None,
            message: msg.into(),
        }
    }
}

/// The configured static collection is missing or unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedSourceError {
    #[error("static feed not found: {0}")]
    Missing(String),

    #[error("failed to read static feed {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse static feed: {0}")]
    Parse(String),
}

/// Errors returned by `FeedAssembler::get_page`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FeedFetchError),

    #[error(transparent)]
    Source(#[from] FeedSourceError),

    /// A static cursor that is not a non-negative offset.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

impl FeedError {
    /// HTTP status carried by a fetch failure, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FeedError::Fetch(e) => e.status,
            _ => None,
        }
    }
}
