// ABOUTME: Video URL extraction from raw HTML embed fragments.
// ABOUTME: Finds <video>/<source> sources and og:video meta tags, resolving relative URLs.

use scraper::{Html, Selector};
use url::Url;

/// Selector/attribute pairs in priority order.
const VIDEO_SELECTORS: &[(&str, &str)] = &[
    ("video[src]", "src"),
    ("video source[src]", "src"),
    ("source[src]", "src"),
    ("meta[property='og:video:secure_url']", "content"),
    ("meta[property='og:video:url']", "content"),
    ("meta[property='og:video']", "content"),
];

/// Returns every candidate video URL in the fragment, in priority order, deduplicated.
/// Relative URLs are resolved against `base_url` when provided, otherwise skipped.
pub fn extract_video_urls(html: &str, base_url: Option<&str>) -> Vec<String> {
    let document = Html::parse_fragment(html);
    let mut found: Vec<String> = Vec::new();

    for (css, attr) in VIDEO_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            if let Some(resolved) = resolve_url(raw, base_url) {
                if !found.contains(&resolved) {
                    found.push(resolved);
                }
            }
        }
    }

    found
}

/// Resolves a potentially relative URL against a base URL.
/// Returns None for empty input, `data:`/`blob:` URIs, or failed resolution.
pub fn resolve_url(src: &str, base_url: Option<&str>) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") || src.starts_with("blob:") {
        return None;
    }

    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }

    let base = Url::parse(base_url?).ok()?;
    Some(base.join(src).ok()?.to_string())
}
