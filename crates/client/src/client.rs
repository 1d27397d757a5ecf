// ABOUTME: The FeedClient that reads pages of casts from the remote feed API.
// ABOUTME: Builds request URLs, deduplicates/caches through RequestCache, and implements RemoteFeed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reelfeed_feed::{
    Cursor, FeedFetchError, RawEntry, RemoteBatch, RemoteFeed, RemoteRequest, RequestCache,
};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::options::{ClientBuilder, Options};
use crate::resource::fetch;

/// Wire shape of a feed response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedResponse {
    casts: Vec<RawEntry>,
    next: Option<NextPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NextPage {
    cursor: Option<String>,
}

/// Client for the remote feed API.
#[derive(Clone)]
pub struct FeedClient {
    opts: Arc<Options>,
    http: reqwest::Client,
    cache: RequestCache<RemoteBatch, FeedFetchError>,
}

impl FeedClient {
    /// Create a new FeedClient with the given options.
    pub fn new(opts: Options) -> Self {
        let http = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .timeout(opts.timeout)
                .user_agent(&opts.user_agent)
                .build()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "falling back to default HTTP client");
                    reqwest::Client::new()
                })
        });
        let cache = RequestCache::new(opts.cache_ttl);
        Self {
            opts: Arc::new(opts),
            http,
            cache,
        }
    }

    /// Create a ClientBuilder for configuring a FeedClient.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn has_api_key(&self) -> bool {
        self.opts
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// The response cache; exposed so callers can invalidate or sweep it.
    pub fn cache(&self) -> &RequestCache<RemoteBatch, FeedFetchError> {
        &self.cache
    }

    /// Builds the request URL. The cursor is appended unmodified (only percent-encoded).
    pub fn request_url(&self, request: &RemoteRequest) -> Result<String, ClientError> {
        let base = format!(
            "{}/{}",
            self.opts.base_url.trim_end_matches('/'),
            self.opts.feed_path.trim_start_matches('/')
        );
        let mut url = Url::parse(&base).map_err(|e| {
            ClientError::invalid_url(&base, "BuildRequest", Some(anyhow::anyhow!("{}", e)))
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("feed_type", &self.opts.feed_type);
            for (key, value) in &self.opts.filters {
                pairs.append_pair(key, value);
            }
            if let Some(fid) = request.fid {
                pairs.append_pair("fid", &fid.to_string());
            }
            pairs.append_pair("limit", &request.limit.to_string());
            if let Some(cursor) = &request.cursor {
                pairs.append_pair("cursor", cursor.as_str());
            }
        }

        Ok(url.to_string())
    }

    fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.opts.headers.clone();
        headers
            .entry("accept".to_string())
            .or_insert_with(|| "application/json".to_string());
        if let Some(key) = self.opts.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            headers.insert("x-api-key".to_string(), key.to_string());
        }
        headers
    }
}

async fn fetch_batch(
    http: &reqwest::Client,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<RemoteBatch, ClientError> {
    let result = fetch(http, url, headers).await?;
    let response: FeedResponse = result.json()?;
    let next_cursor = response
        .next
        .and_then(|n| n.cursor)
        .filter(|c| !c.is_empty())
        .map(Cursor::new);
    debug!(url, casts = response.casts.len(), has_next = next_cursor.is_some(), "fetched feed batch");
    Ok(RemoteBatch {
        entries: response.casts,
        next_cursor,
    })
}

#[async_trait]
impl RemoteFeed for FeedClient {
    async fn fetch(&self, request: &RemoteRequest) -> Result<RemoteBatch, FeedFetchError> {
        let url = self.request_url(request).map_err(FeedFetchError::from)?;
        let http = self.http.clone();
        let headers = self.request_headers();
        let producer_url = url.clone();

        self.cache
            .get(
                &url,
                move || async move {
                    fetch_batch(&http, &producer_url, &headers)
                        .await
                        .map_err(FeedFetchError::from)
                },
                None,
            )
            .await
    }
}
