// ABOUTME: HTTP resource fetching for the remote feed API.
// ABOUTME: Sends GET requests with headers, enforces size limits, checks status, and decodes JSON.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Maximum allowed response body (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const OP: &str = "FetchFeed";

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ClientError::decode(&self.url, OP, Some(anyhow::anyhow!("invalid JSON: {}", e)))
        })
    }
}

/// GET `url` with the given headers. Non-2xx answers become `ErrorCode::Status`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<FetchResult, ClientError> {
    let parsed = url::Url::parse(url).map_err(|e| {
        ClientError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ClientError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.get(parsed);
    for (key, value) in headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::timeout(url, OP, Some(anyhow::anyhow!("request timed out: {}", e)))
        } else {
            ClientError::fetch(url, OP, Some(anyhow::anyhow!("request failed: {}", e)))
        }
    })?;

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ClientError::fetch(url, OP, Some(anyhow::anyhow!("content too large"))));
        }
    }

    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::timeout(url, OP, Some(anyhow::anyhow!("body read timed out: {}", e)))
        } else {
            ClientError::fetch(url, OP, Some(anyhow::anyhow!("failed to read body: {}", e)))
        }
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ClientError::fetch(url, OP, Some(anyhow::anyhow!("content too large"))));
    }

    if !status.is_success() {
        let snippet = String::from_utf8_lossy(&body[..body.len().min(200)]).into_owned();
        return Err(ClientError::status(
            status.as_u16(),
            url,
            OP,
            (!snippet.trim().is_empty()).then(|| anyhow::anyhow!("{}", snippet.trim())),
        ));
    }

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}
