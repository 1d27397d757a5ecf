// ABOUTME: Feed sources the assembler reads from: a pre-loaded static collection or a remote feed.
// ABOUTME: Defines StaticSource loading and the RemoteFeed trait implemented by the HTTP client.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{FeedFetchError, FeedSourceError};
use crate::models::{Cursor, RawEntry};

/// A fixed, pre-loaded collection of raw entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticSource {
    entries: Vec<RawEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StaticDocument {
    Bare(Vec<RawEntry>),
    Wrapped { casts: Vec<RawEntry> },
}

impl StaticSource {
    /// Wraps entries, dropping later duplicates of an entry id.
    pub fn from_entries(entries: Vec<RawEntry>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.hash.clone()))
            .collect();
        Self { entries }
    }

    /// Parses a JSON array of entries or a `{ "casts": [...] }` document.
    pub fn from_json(json: &str) -> Result<Self, FeedSourceError> {
        let doc: StaticDocument =
            serde_json::from_str(json).map_err(|e| FeedSourceError::Parse(e.to_string()))?;
        let entries = match doc {
            StaticDocument::Bare(entries) => entries,
            StaticDocument::Wrapped { casts } => casts,
        };
        Ok(Self::from_entries(entries))
    }

    /// Reads and parses a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, FeedSourceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FeedSourceError::Missing(path.display().to_string())
            } else {
                FeedSourceError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;
        Self::from_json(&contents)
    }

    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameters passed through to the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRequest {
    pub cursor: Option<Cursor>,
    pub limit: usize,
    /// Restrict to one author's entries.
    pub fid: Option<u64>,
}

/// One batch returned by the remote feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteBatch {
    pub entries: Vec<RawEntry>,
    /// Passed back to callers verbatim.
    pub next_cursor: Option<Cursor>,
}

/// A live feed that pages with its own opaque cursors.
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    async fn fetch(&self, request: &RemoteRequest) -> Result<RemoteBatch, FeedFetchError>;
}

/// Where the assembler reads entries from. Exactly one is configured.
#[derive(Clone)]
pub enum FeedSource {
    Static(Arc<StaticSource>),
    Remote(Arc<dyn RemoteFeed>),
}

impl FeedSource {
    pub fn mode(&self) -> &'static str {
        match self {
            FeedSource::Static(_) => "static",
            FeedSource::Remote(_) => "remote",
        }
    }
}

impl std::fmt::Debug for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Static(s) => f.debug_tuple("Static").field(&s.len()).finish(),
            FeedSource::Remote(_) => f.write_str("Remote"),
        }
    }
}
