//! # Portico Cache
//!
//! Versioned request/response cache buckets for the Portico offline engine.
//!
//! ## Model
//!
//! ```text
//! BucketStore (capability trait)
//!     └── Bucket ("portico-portfolio-v1.0.0")
//!             └── RequestKey → ResponseSnapshot
//! ```
//!
//! Exactly one bucket is "current" for a given worker version; all others are
//! stale and deleted when the new worker activates. Entries are keyed by exact
//! method + URL, so invalidating everything is done by bumping the bucket
//! version, never by rewriting entries in place.
//!
//! The [`BucketStore`] trait is the seam between the service worker and its
//! host: the worker only ever opens, matches, fills and deletes buckets through
//! it, which keeps the router and lifecycle controller testable without a real
//! browser-like runtime. [`MemoryStore`] is the in-process implementation.

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::trace;

use portico_common::now_millis;

// ==================== Errors ====================

/// Errors raised by bucket storage.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Store failed: {0}")]
    StoreFailed(String),
}

// ==================== Request Key ====================

/// Exact cache key: request method plus request URL.
///
/// Buckets never do prefix or pattern matching; two URLs differing in a single
/// query parameter are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Key for a GET request, the only method the worker intercepts.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
        }
    }

    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// ==================== Response Snapshot ====================

/// Response type as the fetch layer classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// Same-origin response. The only type eligible for caching.
    Basic,
    /// Cross-origin response with CORS headers.
    Cors,
    /// Cross-origin response without readable body or status.
    Opaque,
    /// Network-level error response.
    Error,
}

/// An immutable copy of an HTTP response.
///
/// The body is `Bytes`, so cloning a snapshot to store one copy and hand the
/// other to the caller is cheap and never consumes anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// Final URL the response was fetched from.
    pub url: String,

    /// Request method that produced it.
    pub method: String,

    /// HTTP status code.
    pub status: u16,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Bytes,

    /// Fetch-layer classification.
    pub response_type: ResponseType,

    /// When the snapshot was taken, in ms since the Unix epoch.
    pub cached_at: u64,
}

impl ResponseSnapshot {
    /// Snapshot of a fresh response.
    pub fn new(
        url: impl Into<String>,
        method: impl Into<String>,
        status: u16,
        headers: HashMap<String, String>,
        body: Bytes,
        response_type: ResponseType,
    ) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            status,
            headers,
            body,
            response_type,
            cached_at: now_millis(),
        }
    }

    /// The cache key this snapshot is stored under.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), self.url.clone())
    }

    /// Re-key the snapshot under the request that produced it.
    ///
    /// A redirected fetch leaves the snapshot carrying the final URL, but
    /// lookups always use the URL the page asked for. Callers storing a
    /// fetched snapshot re-key it to the originating request first.
    pub fn keyed_as(mut self, key: &RequestKey) -> Self {
        self.method = key.method.clone();
        self.url = key.url.clone();
        self
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this snapshot may be written into a bucket: status exactly 200
    /// and a same-origin ("basic") response. Opaque cross-origin responses and
    /// partial/redirect statuses are never stored.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    /// Body decoded as UTF-8, if it is text.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

// ==================== Bucket ====================

/// A named set of request → response-snapshot pairs.
#[derive(Debug, Default)]
pub struct Bucket {
    /// Bucket name, the worker's version string.
    pub name: String,

    entries: HashMap<RequestKey, ResponseSnapshot>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Look up the exact key.
    pub fn match_request(&self, key: &RequestKey) -> Option<&ResponseSnapshot> {
        self.entries.get(key)
    }

    /// Convenience lookup for a GET request by URL.
    pub fn match_url(&self, url: &str) -> Option<&ResponseSnapshot> {
        self.entries.get(&RequestKey::get(url))
    }

    /// Insert or overwrite. Last write wins; within one bucket lifetime two
    /// snapshots for the same URL are equivalent, so overwriting is benign.
    pub fn put(&mut self, snapshot: ResponseSnapshot) {
        trace!(bucket = %self.name, key = %snapshot.key(), "bucket put");
        self.entries.insert(snapshot.key(), snapshot);
    }

    /// Remove an entry. Returns whether it existed.
    pub fn delete(&mut self, key: &RequestKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// All keys currently stored.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==================== Bucket Store ====================

/// Capability interface over bucket storage.
///
/// Injected into the fetch router and the lifecycle controller. Per-key
/// operations are atomic; no caller-side locking is required.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Open a bucket, creating it if absent. Opening an existing bucket keeps
    /// its entries.
    async fn open_bucket(&self, name: &str) -> Result<(), CacheError>;

    /// Exact-key lookup in one bucket. Returns an owned snapshot clone.
    async fn match_in_bucket(&self, bucket: &str, key: &RequestKey) -> Option<ResponseSnapshot>;

    /// Store a snapshot under its own key, creating the bucket if missing.
    async fn put_in_bucket(&self, bucket: &str, snapshot: ResponseSnapshot)
        -> Result<(), CacheError>;

    /// Delete a whole bucket. Returns whether it existed. Idempotent.
    async fn delete_bucket(&self, name: &str) -> Result<bool, CacheError>;

    /// Names of all buckets currently present.
    async fn list_bucket_names(&self) -> Vec<String>;
}

// ==================== Memory Store ====================

/// In-process [`BucketStore`] backed by a `RwLock`ed map.
///
/// This is the only store Portico ships; there is deliberately no persistence
/// layer behind it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a bucket, if it exists. Test and introspection
    /// helper, not part of the capability surface.
    pub async fn bucket_len(&self, name: &str) -> Option<usize> {
        self.buckets.read().await.get(name).map(Bucket::len)
    }

    /// Whether a bucket holds an entry for a GET of `url`.
    pub async fn contains_url(&self, bucket: &str, url: &str) -> bool {
        self.buckets
            .read()
            .await
            .get(bucket)
            .is_some_and(|b| b.match_url(url).is_some())
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn open_bucket(&self, name: &str) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(name.to_string())
            .or_insert_with(|| Bucket::new(name));
        Ok(())
    }

    async fn match_in_bucket(&self, bucket: &str, key: &RequestKey) -> Option<ResponseSnapshot> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.match_request(key))
            .cloned()
    }

    async fn put_in_bucket(
        &self,
        bucket: &str,
        snapshot: ResponseSnapshot,
    ) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Bucket::new(bucket))
            .put(snapshot);
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    async fn list_bucket_names(&self) -> Vec<String> {
        self.buckets.read().await.keys().cloned().collect()
    }
}
