// ABOUTME: Server configuration loaded from JSON with serde defaults and a tagged feed source.
// ABOUTME: Durations accept integer seconds or strings such as "30s" and "2m".

use std::path::{Path, PathBuf};
use std::time::Duration;

use reelfeed_feed::{AssemblerConfig, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_SELECTOR: &str = "filter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub source: SourceConfig,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Remote response cache lifetime.
    #[serde(with = "duration_serde")]
    pub cache_ttl: Duration,
    /// Remote request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            source: SourceConfig::default(),
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
            cache_ttl: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Where feed entries come from. Exactly one mode is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceConfig {
    Static {
        path: PathBuf,
    },
    Remote {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_feed_selector")]
        feed_selector: String,
    },
}

fn default_feed_selector() -> String {
    DEFAULT_FEED_SELECTOR.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Static {
            path: PathBuf::from("data/feed.json"),
        }
    }
}

impl SourceConfig {
    pub fn mode(&self) -> &'static str {
        match self {
            SourceConfig::Static { .. } => "static",
            SourceConfig::Remote { .. } => "remote",
        }
    }

    pub fn api_key_configured(&self) -> bool {
        match self {
            SourceConfig::Static { .. } => false,
            SourceConfig::Remote { api_key, .. } => {
                api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
            }
        }
    }
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads `path`, falling back to defaults when it is absent or invalid.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Non-fatal configuration problems.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.port == 0 {
            warnings.push("port is 0; a random port will be assigned".into());
        }
        if self.max_limit == 0 {
            warnings.push("max_limit is 0; pages will hold a single item".into());
        }
        if self.default_limit > self.max_limit {
            warnings.push(format!(
                "default_limit {} exceeds max_limit {}; it will be clamped",
                self.default_limit, self.max_limit
            ));
        }

        match &self.source {
            SourceConfig::Static { path } => {
                if path.as_os_str().is_empty() {
                    warnings.push("source.path is empty".into());
                }
            }
            SourceConfig::Remote { base_url, .. } => {
                if base_url.trim().is_empty() {
                    warnings.push("source.base_url is empty".into());
                }
                if !self.source.api_key_configured() {
                    warnings.push("source.api_key is not set; remote requests may be rejected".into());
                }
            }
        }

        warnings
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

pub(crate) mod duration_serde {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{}s", d.as_secs()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration::parse(text.trim()).map_err(de::Error::custom),
        }
    }
}
