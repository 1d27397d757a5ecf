// ABOUTME: Feed assembly: turns raw entries into playable VideoItems and pages through them.
// ABOUTME: Static sources page by filtered offset; remote sources pass their opaque cursors through.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::detect::{classify, classify_embed};
use crate::error::FeedError;
use crate::html_video::extract_video_urls;
use crate::models::{Cursor, Embed, FeedPage, PageNotice, RawEntry, VideoDescriptor, VideoItem};
use crate::source::{FeedSource, RemoteRequest, StaticSource};

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Page size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// A page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub cursor: Option<Cursor>,
    pub limit: Option<usize>,
    pub fid: Option<u64>,
}

/// Classifies one embed, falling back to video tags in its HTML fragment.
pub fn descriptor_for_embed(embed: &Embed) -> Option<VideoDescriptor> {
    if let Some(descriptor) = classify_embed(embed) {
        return Some(descriptor);
    }

    let meta = embed.metadata.as_ref()?;
    let html = meta.html.as_deref()?;
    extract_video_urls(html, embed.url.as_deref())
        .into_iter()
        .find_map(|url| {
            let mut descriptor = classify(Some(&url), None)?;
            descriptor.thumbnail_url = meta
                .image
                .as_ref()
                .and_then(|i| i.url.clone())
                .filter(|u| !u.trim().is_empty());
            Some(descriptor)
        })
}

/// Builds a VideoItem from an entry, or `None` when no embed is a video.
pub fn video_item_from_entry(entry: &RawEntry) -> Option<VideoItem> {
    let videos: Vec<VideoDescriptor> = entry.embeds.iter().filter_map(descriptor_for_embed).collect();
    VideoItem::new(entry.clone(), videos)
}

/// Maps entries to items in order, dropping entries without video.
pub fn assemble_items(entries: &[RawEntry]) -> Vec<VideoItem> {
    entries.iter().filter_map(video_item_from_entry).collect()
}

/// Produces pages of playable items from the configured source.
///
/// The assembler never retries; fetch errors are returned to the caller as-is.
#[derive(Debug, Clone)]
pub struct FeedAssembler {
    source: FeedSource,
    config: AssemblerConfig,
    /// Static sources are classified once at construction.
    static_items: Arc<Vec<VideoItem>>,
}

impl FeedAssembler {
    pub fn new(source: FeedSource, config: AssemblerConfig) -> Self {
        let static_items = match &source {
            FeedSource::Static(s) => Arc::new(assemble_items(s.entries())),
            FeedSource::Remote(_) => Arc::new(Vec::new()),
        };
        Self {
            source,
            config,
            static_items,
        }
    }

    /// Convenience constructor over an in-memory collection.
    pub fn from_static(source: StaticSource) -> Self {
        Self::new(FeedSource::Static(Arc::new(source)), AssemblerConfig::default())
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    pub fn config(&self) -> AssemblerConfig {
        self.config
    }

    /// Requested limit clamped to `[1, max_limit]`, or the default.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        let max = self.config.max_limit.max(1);
        requested
            .unwrap_or(self.config.default_limit)
            .clamp(1, max)
    }

    /// Fetches one page.
    pub async fn get_page(&self, query: &FeedQuery) -> Result<FeedPage, FeedError> {
        let limit = self.effective_limit(query.limit);
        match &self.source {
            FeedSource::Static(source) => self.static_page(source, query, limit),
            FeedSource::Remote(remote) => {
                let request = RemoteRequest {
                    cursor: query.cursor.clone(),
                    limit,
                    fid: query.fid,
                };
                let batch = remote.fetch(&request).await.map_err(|e| {
                    warn!(status = ?e.status, error = %e, "remote feed fetch failed");
                    FeedError::from(e)
                })?;

                let scanned = batch.entries.len();
                let items = assemble_items(&batch.entries);
                debug!(scanned, kept = items.len(), "assembled remote batch");

                let notice = (items.is_empty() && scanned > 0)
                    .then_some(PageNotice::NoQualifyingVideo { scanned });
                Ok(FeedPage {
                    items,
                    has_more: batch.next_cursor.is_some(),
                    next_cursor: batch.next_cursor,
                    total_available: scanned,
                    notice,
                })
            }
        }
    }

    fn static_page(
        &self,
        source: &StaticSource,
        query: &FeedQuery,
        limit: usize,
    ) -> Result<FeedPage, FeedError> {
        let offset = match &query.cursor {
            None => 0,
            Some(cursor) => cursor
                .as_str()
                .trim()
                .parse::<usize>()
                .map_err(|_| FeedError::InvalidCursor(cursor.to_string()))?,
        };

        let filtered: Vec<&VideoItem> = self
            .static_items
            .iter()
            .filter(|item| query.fid.map_or(true, |fid| item.source_entry().author.fid == fid))
            .collect();
        let total = filtered.len();

        let start = offset.min(total);
        let end = offset.saturating_add(limit).min(total);
        let items: Vec<VideoItem> = filtered[start..end].iter().map(|i| (*i).clone()).collect();

        let has_more = offset.saturating_add(limit) < total;
        let next_cursor = has_more.then(|| Cursor::from(offset + limit));

        let notice = if total == 0 {
            let scanned = source
                .entries()
                .iter()
                .filter(|e| query.fid.map_or(true, |fid| e.author.fid == fid))
                .count();
            (scanned > 0).then_some(PageNotice::NoQualifyingVideo { scanned })
        } else {
            None
        };

        debug!(offset, limit, total, returned = items.len(), "served static page");
        Ok(FeedPage {
            items,
            next_cursor,
            has_more,
            total_available: total,
            notice,
        })
    }
}
