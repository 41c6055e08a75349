//! # Portico Feed
//!
//! The blog and coding-challenge content feed consumed by the portfolio site.
//!
//! The site publishes two JSON arrays, `blogs.json` and `challenges.json`.
//! Each lives primarily under `data/` with a root-level fallback for older
//! deployments; the loader tries them in that order. Fetches go through the
//! same [`NetworkFetch`](portico_sw::NetworkFetch) capability as the service
//! worker, so feed requests participate in the worker's routing strategies
//! when one is installed.

use thiserror::Error;

use portico_sw::SwError;

pub mod loader;
pub mod model;

pub use loader::{FeedConfig, FeedLoader};
pub use model::{excerpt, filter_by_platform, paginate, strip_markdown, BlogPost, Challenge, Page};

/// Errors raised while loading a feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport-level failure; not recovered by the fallback path.
    #[error("Feed request failed: {0}")]
    Network(#[from] SwError),

    /// Both the primary and fallback paths answered with an error status.
    #[error("Feed unavailable: {path} returned status {status}")]
    Http { path: String, status: u16 },

    /// The feed document is not valid JSON for the expected shape.
    #[error("Feed parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base or path does not form a URL.
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
