// ABOUTME: Configuration options for the remote feed client including Options and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing FeedClient instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use reelfeed_feed::cache::DEFAULT_TTL;

use crate::client::FeedClient;

pub const DEFAULT_FEED_PATH: &str = "/v2/farcaster/feed";
pub const DEFAULT_FEED_TYPE: &str = "filter";

/// Configuration options for the feed client.
#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub feed_path: String,
    pub api_key: Option<String>,
    /// Which upstream feed to read (`feed_type` query parameter).
    pub feed_type: String,
    /// Filter criteria appended to every request.
    pub filters: Vec<(String, String)>,
    pub timeout: Duration,
    pub user_agent: String,
    pub cache_ttl: Duration,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: "https://api.neynar.com".to_string(),
            feed_path: DEFAULT_FEED_PATH.to_string(),
            api_key: None,
            feed_type: DEFAULT_FEED_TYPE.to_string(),
            filters: vec![
                ("filter_type".to_string(), "embed_types".to_string()),
                ("embed_types".to_string(), "video".to_string()),
            ],
            timeout: Duration::from_secs(15),
            user_agent: concat!("reelfeed/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_ttl: DEFAULT_TTL,
            http_client: None,
            headers: HashMap::new(),
        }
    }
}

/// Builder for constructing FeedClient instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the API base URL (scheme + host, optional port).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.base_url = base_url.into();
        self
    }

    /// Set the feed endpoint path.
    pub fn feed_path(mut self, path: impl Into<String>) -> Self {
        self.opts.feed_path = path.into();
        self
    }

    /// Set the API key sent as `x-api-key`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.opts.api_key = Some(key.into());
        self
    }

    /// Set the upstream feed selector.
    pub fn feed_type(mut self, feed_type: impl Into<String>) -> Self {
        self.opts.feed_type = feed_type.into();
        self
    }

    /// Replace the filter criteria.
    pub fn filters(mut self, filters: Vec<(String, String)>) -> Self {
        self.opts.filters = filters;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set how long successful responses are reused.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.opts.cache_ttl = ttl;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Build the FeedClient with the configured options.
    pub fn build(self) -> FeedClient {
        FeedClient::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
