// ABOUTME: Error types for the remote feed client including ErrorCode and ClientError.
// ABOUTME: Provides categorized errors with convenience constructors and conversion into FeedFetchError.

use std::fmt;

use reelfeed_feed::FeedFetchError;

/// Error codes representing different categories of client failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Status(u16),
    Decode,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::InvalidUrl => write!(f, "invalid URL"),
            ErrorCode::Fetch => write!(f, "fetch error"),
            ErrorCode::Timeout => write!(f, "timeout"),
            ErrorCode::Status(status) => write!(f, "HTTP status {}", status),
            ErrorCode::Decode => write!(f, "decode error"),
        }
    }
}

/// The main error type for client operations.
#[derive(Debug, thiserror::Error)]
pub struct ClientError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reelfeed: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ClientError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(url: impl Into<String>, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(url: impl Into<String>, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Timeout, url, op, source)
    }

    /// Create an error for a non-success HTTP status.
    pub fn status(
        status: u16,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Status(status), url, op, source)
    }

    /// Create a Decode error.
    pub fn decode(url: impl Into<String>, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Decode, url, op, source)
    }

    /// HTTP status if the server answered with a failure.
    pub fn http_status(&self) -> Option<u16> {
        match self.code {
            ErrorCode::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Decode error.
    pub fn is_decode(&self) -> bool {
        self.code == ErrorCode::Decode
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }
}

impl From<ClientError> for FeedFetchError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err.http_status() {
            Some(status) => FeedFetchError::status(status, message),
            None => FeedFetchError::transport(message),
        }
    }
}
