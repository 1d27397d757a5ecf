// ABOUTME: Rust models for raw feed entries and the playable items derived from them.
// ABOUTME: RawEntry/Embed mirror the upstream cast JSON; VideoDescriptor/VideoItem/FeedPage are produced here.

use serde::{Deserialize, Serialize};

use crate::duration_parse::deserialize_opt_seconds;

/// Author reference attached to a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub fid: u64,
    pub username: Option<String>,
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(alias = "pfpUrl")]
    pub pfp_url: Option<String>,
}

/// Video sub-object of embed metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub url: Option<String>,
    #[serde(alias = "streamUrl")]
    pub stream_url: Option<String>,
    #[serde(alias = "width_px")]
    pub width: Option<u32>,
    #[serde(alias = "height_px")]
    pub height: Option<u32>,
    #[serde(
        alias = "duration_s",
        alias = "durationSeconds",
        deserialize_with = "deserialize_opt_seconds"
    )]
    pub duration: Option<f64>,
    #[serde(alias = "thumbnailUrl", alias = "thumbnail")]
    pub thumbnail_url: Option<String>,
}

/// Image sub-object of embed metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadata {
    pub url: Option<String>,
    #[serde(alias = "width_px")]
    pub width: Option<u32>,
    #[serde(alias = "height_px")]
    pub height: Option<u32>,
}

/// Structured metadata the upstream attaches to an embed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedMetadata {
    #[serde(alias = "contentType")]
    pub content_type: Option<String>,
    pub video: Option<VideoMetadata>,
    pub image: Option<ImageMetadata>,
    /// Raw HTML fragment (oEmbed/player markup).
    pub html: Option<String>,
}

/// One embed on a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    pub url: Option<String>,
    pub metadata: Option<EmbedMetadata>,
}

impl Embed {
    /// Shorthand for a bare URL embed.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            metadata: None,
        }
    }
}

/// One post from the upstream feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    /// Stable identifier (the cast hash).
    pub hash: String,
    pub author: Author,
    pub text: String,
    pub timestamp: Option<String>,
    pub embeds: Vec<Embed>,
}

/// Delivery kind of a classified video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoKind {
    #[serde(rename = "hls")]
    AdaptiveStream,
    #[serde(rename = "mp4")]
    ProgressiveMp4,
    #[serde(rename = "webm")]
    ProgressiveWebm,
    #[serde(rename = "mov")]
    ProgressiveMov,
    #[serde(rename = "ogg")]
    ProgressiveOgg,
}

impl VideoKind {
    /// Standard MIME type for this delivery kind.
    pub fn content_type(self) -> &'static str {
        match self {
            VideoKind::AdaptiveStream => "application/vnd.apple.mpegurl",
            VideoKind::ProgressiveMp4 => "video/mp4",
            VideoKind::ProgressiveWebm => "video/webm",
            VideoKind::ProgressiveMov => "video/quicktime",
            VideoKind::ProgressiveOgg => "video/ogg",
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(self, VideoKind::AdaptiveStream)
    }
}

/// A classified video reference. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    pub url: String,
    pub kind: VideoKind,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A feed entry that produced at least one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    id: String,
    source_entry: RawEntry,
    videos: Vec<VideoDescriptor>,
}

impl VideoItem {
    /// Builds an item; returns `None` when `videos` is empty.
    pub fn new(source_entry: RawEntry, videos: Vec<VideoDescriptor>) -> Option<Self> {
        if videos.is_empty() {
            return None;
        }
        Some(Self {
            id: source_entry.hash.clone(),
            source_entry,
            videos,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_entry(&self) -> &RawEntry {
        &self.source_entry
    }

    /// Always non-empty.
    pub fn videos(&self) -> &[VideoDescriptor] {
        &self.videos
    }

    /// The descriptor a player starts with.
    pub fn primary(&self) -> &VideoDescriptor {
        &self.videos[0]
    }
}

/// Page boundary token. Static sources use a decimal offset; remote cursors are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<usize> for Cursor {
    fn from(offset: usize) -> Self {
        Self(offset.to_string())
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explanation attached to a page that is empty for a legitimate reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNotice {
    /// Raw entries were scanned but none carried a playable video.
    NoQualifyingVideo { scanned: usize },
}

/// One page of playable items.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub items: Vec<VideoItem>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
    /// Static: size of the filtered sequence. Remote: raw entries in the fetched batch.
    pub total_available: usize,
    pub notice: Option<PageNotice>,
}

impl FeedPage {
    pub fn is_no_qualifying_content(&self) -> bool {
        matches!(self.notice, Some(PageNotice::NoQualifyingVideo { .. }))
    }
}
