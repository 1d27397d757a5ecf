// ABOUTME: Shared handler state: the feed assembler built from configuration.
// ABOUTME: A static collection that fails to load is kept as an error and reported per request.

use std::sync::Arc;

use reelfeed_client::FeedClient;
use reelfeed_feed::{FeedAssembler, FeedSource, FeedSourceError, StaticSource};

use crate::config::{ServerConfig, SourceConfig};

#[derive(Clone)]
pub struct AppState {
    feed: Arc<Result<FeedAssembler, FeedSourceError>>,
    client: Option<FeedClient>,
    mode: &'static str,
    api_key_configured: bool,
}

impl AppState {
    pub fn new(assembler: FeedAssembler, api_key_configured: bool) -> Self {
        Self {
            mode: assembler.source().mode(),
            feed: Arc::new(Ok(assembler)),
            client: None,
            api_key_configured,
        }
    }

    /// State whose static collection could not be loaded.
    pub fn unavailable(err: FeedSourceError) -> Self {
        Self {
            feed: Arc::new(Err(err)),
            client: None,
            mode: "static",
            api_key_configured: false,
        }
    }

    pub fn from_config(cfg: &ServerConfig) -> Self {
        let limits = cfg.assembler_config();
        match &cfg.source {
            SourceConfig::Static { path } => match StaticSource::from_path(path) {
                Ok(source) => {
                    tracing::info!(path = %path.display(), entries = source.len(), "loaded static feed");
                    Self::new(FeedAssembler::new(FeedSource::Static(Arc::new(source)), limits), false)
                }
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "static feed unavailable");
                    Self::unavailable(err)
                }
            },
            SourceConfig::Remote {
                base_url,
                api_key,
                feed_selector,
            } => {
                let mut builder = FeedClient::builder()
                    .base_url(base_url.clone())
                    .feed_type(feed_selector.clone())
                    .timeout(cfg.request_timeout)
                    .cache_ttl(cfg.cache_ttl);
                if let Some(key) = api_key.as_deref().filter(|k| !k.trim().is_empty()) {
                    builder = builder.api_key(key);
                }
                let client = builder.build();
                let api_key_configured = client.has_api_key();
                tracing::info!(base_url = %base_url, api_key_configured, "using remote feed");

                let assembler = FeedAssembler::new(FeedSource::Remote(Arc::new(client.clone())), limits);
                Self {
                    client: Some(client),
                    ..Self::new(assembler, api_key_configured)
                }
            }
        }
    }

    pub fn assembler(&self) -> Result<&FeedAssembler, &FeedSourceError> {
        (*self.feed).as_ref()
    }

    /// The remote client, when the source is remote.
    pub fn remote_client(&self) -> Option<&FeedClient> {
        self.client.as_ref()
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    pub fn api_key_configured(&self) -> bool {
        self.api_key_configured
    }
}
