//! Fetch routing.
//!
//! One router, one entry point. Every intercepted request is classified into
//! exactly one of four mutually exclusive routes, in order:
//!
//! 1. **Excluded** — non-GET, excluded scheme, or analytics marker: decline.
//! 2. **Network-first** — API-ish URLs: live response, cache as fallback.
//! 3. **Cache-first** — static asset suffixes seeded at install: bucket hit
//!    or a direct network fetch, never backfilled.
//! 4. **Default** — cache-then-network with backfill of cacheable same-origin
//!    responses, and the offline fallback document for failed navigations.
//!
//! First match wins, so a request can never be answered by two branches.

use std::sync::Arc;

use tracing::{debug, warn};

use portico_cache::{BucketStore, RequestKey, ResponseSnapshot};

use crate::{FetchRequest, NetworkFetch, SwConfig, SwError};

// ==================== Classification ====================

/// The route a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Not intercepted; the request proceeds natively.
    Excluded,
    /// Live response preferred, bucket as fallback.
    NetworkFirst,
    /// Bucket preferred, direct network on miss.
    CacheFirst,
    /// Cache-then-network with backfill.
    Default,
}

impl RouteClass {
    /// Classify a request. Pure; first match wins.
    pub fn classify(config: &SwConfig, request: &FetchRequest) -> Self {
        if !request.is_get() {
            return Self::Excluded;
        }
        if config
            .excluded_schemes
            .iter()
            .any(|scheme| request.url.scheme() == scheme)
        {
            return Self::Excluded;
        }
        let url = request.url.as_str();
        if config.bypass_markers.iter().any(|m| url.contains(m.as_str())) {
            return Self::Excluded;
        }
        if config
            .network_first_markers
            .iter()
            .any(|m| url.contains(m.as_str()))
        {
            return Self::NetworkFirst;
        }
        if config
            .cache_first_suffixes
            .iter()
            .any(|suffix| request.url.path().ends_with(suffix.as_str()))
        {
            return Self::CacheFirst;
        }
        Self::Default
    }
}

// ==================== Outcome ====================

/// What the router decided for a request.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// Explicit decline: the worker does not answer, the host runtime lets
    /// the request proceed untouched.
    Passthrough,
    /// The worker answers with this response.
    Response(ResponseSnapshot),
}

impl RouteOutcome {
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::Response(snapshot) => Some(snapshot),
            Self::Passthrough => None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }
}

// ==================== Router ====================

/// The single fetch entry point.
pub struct FetchRouter {
    config: Arc<SwConfig>,
    store: Arc<dyn BucketStore>,
    network: Arc<dyn NetworkFetch>,
}

impl FetchRouter {
    pub fn new(
        config: Arc<SwConfig>,
        store: Arc<dyn BucketStore>,
        network: Arc<dyn NetworkFetch>,
    ) -> Self {
        Self {
            config,
            store,
            network,
        }
    }

    /// Route one request. Errors mean a fetch the page will see fail; the
    /// router never leaves a request unanswered.
    pub async fn route(&self, request: &FetchRequest) -> Result<RouteOutcome, SwError> {
        match RouteClass::classify(&self.config, request) {
            RouteClass::Excluded => {
                debug!(url = %request.url, "not intercepting");
                Ok(RouteOutcome::Passthrough)
            }
            RouteClass::NetworkFirst => self
                .network_first(request)
                .await
                .map(RouteOutcome::Response),
            RouteClass::CacheFirst => self.cache_first(request).await.map(RouteOutcome::Response),
            RouteClass::Default => self
                .cache_then_network(request)
                .await
                .map(RouteOutcome::Response),
        }
    }

    /// Live response wins; the bucket catches network loss. Successful
    /// responses are stored in the background so the fallback stays warm.
    async fn network_first(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError> {
        match self.network.fetch(request).await {
            Ok(snapshot) => {
                self.store_in_background(snapshot.clone().keyed_as(&request.key()));
                Ok(snapshot)
            }
            Err(err) => {
                debug!(url = %request.url, error = %err, "network-first fetch failed, trying bucket");
                match self
                    .store
                    .match_in_bucket(&self.config.cache_name, &request.key())
                    .await
                {
                    Some(snapshot) => Ok(snapshot),
                    None => Err(err),
                }
            }
        }
    }

    /// Bucket hit or direct network fetch. No backfill: these assets are
    /// seeded by the install manifest, and the bucket version is the only
    /// thing that refreshes them.
    async fn cache_first(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError> {
        if let Some(snapshot) = self
            .store
            .match_in_bucket(&self.config.cache_name, &request.key())
            .await
        {
            debug!(url = %request.url, "serving from cache");
            return Ok(snapshot);
        }
        self.network.fetch(request).await
    }

    /// Cache hit returns immediately; otherwise fetch, backfill cacheable
    /// same-origin responses, and fall back to the offline document for
    /// navigations that cannot reach the network.
    async fn cache_then_network(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError> {
        if let Some(snapshot) = self
            .store
            .match_in_bucket(&self.config.cache_name, &request.key())
            .await
        {
            debug!(url = %request.url, "serving from cache");
            return Ok(snapshot);
        }

        match self.network.fetch(request).await {
            Ok(snapshot) => {
                if snapshot.is_cacheable() && self.config.is_same_origin(&snapshot.url) {
                    // Stored under the request's key, before the caller sees
                    // the response; a store failure is logged and the live
                    // response still returned.
                    if let Err(err) = self
                        .store
                        .put_in_bucket(
                            &self.config.cache_name,
                            snapshot.clone().keyed_as(&request.key()),
                        )
                        .await
                    {
                        warn!(url = %request.url, error = %err, "cache fill failed");
                    }
                }
                Ok(snapshot)
            }
            Err(err) => {
                if request.is_navigation() {
                    let fallback = RequestKey::get(self.config.offline_fallback_url()?.as_str());
                    if let Some(snapshot) = self
                        .store
                        .match_in_bucket(&self.config.cache_name, &fallback)
                        .await
                    {
                        debug!(url = %request.url, "serving offline fallback");
                        return Ok(snapshot);
                    }
                }
                Err(err)
            }
        }
    }

    /// Fire-and-forget cache fill. Never blocks or fails the response path.
    fn store_in_background(&self, snapshot: ResponseSnapshot) {
        let store = Arc::clone(&self.store);
        let bucket = self.config.cache_name.clone();
        tokio::spawn(async move {
            let key = snapshot.key();
            if let Err(err) = store.put_in_bucket(&bucket, snapshot).await {
                warn!(key = %key, error = %err, "background cache fill failed");
            }
        });
    }
}
