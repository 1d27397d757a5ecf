// ABOUTME: Video format detection for embed URLs and structured metadata.
// ABOUTME: Pure classification into a VideoDescriptor; no I/O and no shared state.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Embed, EmbedMetadata, VideoDescriptor, VideoKind};

/// Hosts that only ever serve adaptive-stream manifests.
const ADAPTIVE_HOST_MARKERS: &[&str] = &[
    "stream.warpcast.com",
    "stream.farcaster.xyz",
    "videodelivery.net",
    "cloudflarestream.com",
    "stream.mux.com",
];

static ADAPTIVE_HOSTS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(ADAPTIVE_HOST_MARKERS)
        .expect("static host marker patterns")
});

static M3U8_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.m3u8").expect("static regex"));

/// Progressive extension at the end of the URL, optionally followed by a query or fragment.
static PROGRESSIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mp4|webm|mov|ogg|ogv)(?:[?#].*)?$").expect("static regex")
});

/// Classifies a URL plus optional embed metadata into a video descriptor.
///
/// Rules, first match wins:
/// 1. metadata with a video sub-object: resolve stream URL, then metadata URL,
///    then `url`, and classify that (falling back to the metadata content type)
/// 2. `.m3u8` anywhere or a known adaptive host → `AdaptiveStream`
/// 3. progressive extension at the end → matching `Progressive*`
/// 4. otherwise `None`
pub fn classify(url: Option<&str>, metadata: Option<&EmbedMetadata>) -> Option<VideoDescriptor> {
    if let Some(meta) = metadata {
        if let Some(video) = meta.video.as_ref() {
            let resolved = non_empty(video.stream_url.as_deref())
                .or_else(|| non_empty(video.url.as_deref()))
                .or_else(|| non_empty(url))?;

            let kind = kind_for_url(resolved)
                .or_else(|| meta.content_type.as_deref().and_then(kind_for_content_type))?;

            let thumbnail_url = non_empty(video.thumbnail_url.as_deref())
                .or_else(|| meta.image.as_ref().and_then(|i| non_empty(i.url.as_deref())))
                .map(str::to_string);

            return Some(VideoDescriptor {
                url: resolved.to_string(),
                kind,
                content_type: kind.content_type().to_string(),
                width: video.width,
                height: video.height,
                duration_seconds: video.duration,
                thumbnail_url,
            });
        }
    }

    let url = non_empty(url)?;
    let kind = kind_for_url(url)?;

    let image = metadata.and_then(|m| m.image.as_ref());
    Some(VideoDescriptor {
        url: url.to_string(),
        kind,
        content_type: kind.content_type().to_string(),
        width: image.and_then(|i| i.width),
        height: image.and_then(|i| i.height),
        duration_seconds: None,
        thumbnail_url: image.and_then(|i| non_empty(i.url.as_deref())).map(str::to_string),
    })
}

/// Classifies one embed using its own URL and metadata.
pub fn classify_embed(embed: &Embed) -> Option<VideoDescriptor> {
    classify(embed.url.as_deref(), embed.metadata.as_ref())
}

/// Classifies every embed, keeping order and dropping unrecognized ones.
pub fn classify_all(embeds: &[Embed]) -> Vec<VideoDescriptor> {
    embeds.iter().filter_map(classify_embed).collect()
}

/// Delivery kind implied by the URL alone.
pub fn kind_for_url(url: &str) -> Option<VideoKind> {
    if M3U8_RE.is_match(url) || ADAPTIVE_HOSTS.is_match(url) {
        return Some(VideoKind::AdaptiveStream);
    }

    let caps = PROGRESSIVE_RE.captures(url)?;
    match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "mp4" => Some(VideoKind::ProgressiveMp4),
        "webm" => Some(VideoKind::ProgressiveWebm),
        "mov" => Some(VideoKind::ProgressiveMov),
        "ogg" | "ogv" => Some(VideoKind::ProgressiveOgg),
        _ => None,
    }
}

/// Delivery kind implied by a MIME type hint (parameters ignored).
pub fn kind_for_content_type(content_type: &str) -> Option<VideoKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/vnd.apple.mpegurl" | "application/x-mpegurl" | "audio/mpegurl" => {
            Some(VideoKind::AdaptiveStream)
        }
        "video/mp4" => Some(VideoKind::ProgressiveMp4),
        "video/webm" => Some(VideoKind::ProgressiveWebm),
        "video/quicktime" => Some(VideoKind::ProgressiveMov),
        "video/ogg" => Some(VideoKind::ProgressiveOgg),
        _ => None,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
