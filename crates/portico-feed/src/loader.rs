//! Feed loading with primary/fallback path resolution.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use portico_cache::ResponseSnapshot;
use portico_sw::{FetchRequest, NetworkFetch};

use crate::model::{BlogPost, Challenge};
use crate::FeedError;

/// Where the feeds live, relative to the site base.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Site base URL the relative paths are joined onto.
    pub base: String,
    pub blogs_path: String,
    pub blogs_fallback: String,
    pub challenges_path: String,
    pub challenges_fallback: String,
    /// Items per rendered page.
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base: "https://portico.dev".to_string(),
            blogs_path: "data/blogs.json".to_string(),
            blogs_fallback: "blogs.json".to_string(),
            challenges_path: "data/challenges.json".to_string(),
            challenges_fallback: "challenges.json".to_string(),
            page_size: 6,
        }
    }
}

/// Loads and decodes the site's JSON feeds.
pub struct FeedLoader {
    network: Arc<dyn NetworkFetch>,
    config: FeedConfig,
}

impl FeedLoader {
    pub fn new(network: Arc<dyn NetworkFetch>, config: FeedConfig) -> Self {
        Self { network, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Load all blog posts.
    pub async fn load_blogs(&self) -> Result<Vec<BlogPost>, FeedError> {
        let posts: Vec<BlogPost> = self
            .load(&self.config.blogs_path, &self.config.blogs_fallback)
            .await?;
        info!(count = posts.len(), "loaded blog feed");
        Ok(posts)
    }

    /// Load all coding challenges.
    pub async fn load_challenges(&self) -> Result<Vec<Challenge>, FeedError> {
        let challenges: Vec<Challenge> = self
            .load(&self.config.challenges_path, &self.config.challenges_fallback)
            .await?;
        info!(count = challenges.len(), "loaded challenge feed");
        Ok(challenges)
    }

    async fn load<T: DeserializeOwned>(
        &self,
        primary: &str,
        fallback: &str,
    ) -> Result<Vec<T>, FeedError> {
        let snapshot = self.fetch_with_fallback(primary, fallback).await?;
        Ok(serde_json::from_slice(&snapshot.body)?)
    }

    /// Fetch `primary`; if it answers with a non-success status, try
    /// `fallback`. Transport failures propagate immediately — the fallback
    /// exists for deployments that never shipped the `data/` directory, not
    /// as a retry mechanism.
    async fn fetch_with_fallback(
        &self,
        primary: &str,
        fallback: &str,
    ) -> Result<ResponseSnapshot, FeedError> {
        let base = Url::parse(&self.config.base)?;

        let snapshot = self
            .network
            .fetch(&FetchRequest::get(base.join(primary)?))
            .await?;
        if snapshot.is_success() {
            return Ok(snapshot);
        }
        debug!(path = primary, status = snapshot.status, "primary feed path missed, trying fallback");

        let snapshot = self
            .network
            .fetch(&FetchRequest::get(base.join(fallback)?))
            .await?;
        if snapshot.is_success() {
            return Ok(snapshot);
        }
        Err(FeedError::Http {
            path: fallback.to_string(),
            status: snapshot.status,
        })
    }
}
