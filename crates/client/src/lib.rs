// ABOUTME: Remote feed client library for reelfeed.
// ABOUTME: Re-exports the public API: FeedClient, ClientBuilder, Options, ClientError, ErrorCode.

//! HTTP client for the upstream cast feed.
//!
//! [`FeedClient`] implements [`reelfeed_feed::RemoteFeed`], so it plugs straight
//! into a [`reelfeed_feed::FeedAssembler`]. Every fetch goes through a
//! [`reelfeed_feed::RequestCache`]: identical concurrent requests share one
//! HTTP call and successful responses are reused for the configured TTL.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reelfeed_client::FeedClient;
//! use reelfeed_feed::{AssemblerConfig, FeedAssembler, FeedQuery, FeedSource};
//!
//! # async fn run() -> Result<(), reelfeed_feed::FeedError> {
//! let client = FeedClient::builder().api_key("...").build();
//! let assembler = FeedAssembler::new(FeedSource::Remote(Arc::new(client)), AssemblerConfig::default());
//! let page = assembler.get_page(&FeedQuery::default()).await?;
//! println!("{} videos", page.items.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod options;
pub mod resource;

pub use crate::client::FeedClient;
pub use crate::error::{ClientError, ErrorCode};
pub use crate::options::{ClientBuilder, Options};
