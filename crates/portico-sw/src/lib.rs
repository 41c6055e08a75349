//! # Portico Service Worker
//!
//! Offline caching and fetch interception for the Portico portfolio engine.
//!
//! ## Architecture
//!
//! ```text
//! ServiceWorker (driver, one per registration)
//!     ├── Registration            installing / waiting / active slots
//!     ├── LifecycleController     install (seed manifest), activate (GC stale buckets)
//!     ├── FetchRouter             single ordered classifier for every GET
//!     │       ├── BucketStore    (capability, portico-cache)
//!     │       └── NetworkFetch   (capability, this crate)
//!     ├── ControlMessage          skip-waiting commands from the page
//!     └── Notification            push / notification-click, stateless
//! ```
//!
//! Exactly one fetch entry point exists: [`ServiceWorker::on_fetch`] delegates
//! to the router, which classifies each request into one mutually exclusive
//! route. Handlers either answer the request or decline explicitly with
//! [`RouteOutcome::Passthrough`]; nothing is ever answered twice.
//!
//! Every event handler is an async fn whose returned future carries all work
//! the handler depends on. Awaiting it to completion is the host's
//! keep-alive contract; a handler never leaves correctness-critical work
//! dangling past its own resolution, except the deliberately fire-and-forget
//! background cache fills, which are best-effort by design.

use thiserror::Error;
use url::Url;

use portico_cache::{CacheError, RequestKey};

pub mod config;
pub mod lifecycle;
pub mod messages;
pub mod network;
pub mod notifications;
pub mod router;
pub mod worker;

pub use config::{NotificationConfig, SwConfig};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleController, WorkerState};
pub use messages::ControlMessage;
pub use network::{HttpNetwork, NetworkFetch};
pub use notifications::{click_action, ClickAction, Notification, NotificationAction};
pub use router::{FetchRouter, RouteClass, RouteOutcome};
pub use worker::{Registration, ServiceWorker, WorkerHandle};

// ==================== Errors ====================

/// Errors surfaced by the service worker.
#[derive(Error, Debug)]
pub enum SwError {
    /// A manifest asset could not be seeded; the whole install attempt fails.
    #[error("Install failed: {0}")]
    InstallFailed(String),

    /// A network fetch failed with no cached entry to fall back on.
    #[error("Network error: {0}")]
    Network(String),

    /// Bucket storage failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Rejected configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Event arrived in a worker state that cannot serve it.
    #[error("State error: {0}")]
    State(String),

    /// Malformed URL in a manifest entry or request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

// ==================== Fetch Request ====================

/// Request mode, as the host runtime reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Ordinary sub-resource request.
    #[default]
    NoCors,
    /// Top-level page navigation. Gets the offline fallback on network loss.
    Navigate,
    /// CORS-checked sub-resource request.
    Cors,
    /// Same-origin-only request.
    SameOrigin,
}

/// An intercepted request as the router sees it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: http::Method,
    pub mode: RequestMode,
}

impl FetchRequest {
    /// A plain GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: http::Method::GET,
            mode: RequestMode::NoCors,
        }
    }

    /// A top-level navigation request.
    pub fn navigate(url: Url) -> Self {
        Self {
            url,
            method: http::Method::GET,
            mode: RequestMode::Navigate,
        }
    }

    /// A request with an arbitrary method; anything but GET passes through
    /// the router untouched.
    pub fn with_method(url: Url, method: http::Method) -> Self {
        Self {
            url,
            method,
            mode: RequestMode::NoCors,
        }
    }

    /// The exact cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }

    pub fn is_get(&self) -> bool {
        self.method == http::Method::GET
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}
