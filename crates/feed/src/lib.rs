// ABOUTME: Core feed library for reelfeed.
// ABOUTME: Provides video format detection, feed assembly/pagination, sources, and the request cache.

pub mod assembler;
pub mod cache;
pub mod detect;
pub mod duration_parse;
pub mod error;
pub mod html_video;
pub mod models;
pub mod source;

pub use assembler::{
    assemble_items, descriptor_for_embed, video_item_from_entry, AssemblerConfig, FeedAssembler,
    FeedQuery, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use cache::RequestCache;
pub use detect::{classify, classify_all, classify_embed, kind_for_content_type, kind_for_url};
pub use duration_parse::parse_duration_seconds;
pub use error::{FeedError, FeedFetchError, FeedSourceError};
pub use html_video::extract_video_urls;
pub use models::{
    Author, Cursor, Embed, EmbedMetadata, FeedPage, ImageMetadata, PageNotice, RawEntry,
    VideoDescriptor, VideoItem, VideoKind, VideoMetadata,
};
pub use source::{FeedSource, RemoteBatch, RemoteFeed, RemoteRequest, StaticSource};
