//! Test doubles shared by the integration suites.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;

use portico_cache::{ResponseSnapshot, ResponseType};
use portico_sw::{FetchRequest, NetworkFetch, SwConfig, SwError};

/// Scripted network with a call counter and an offline switch.
#[derive(Default)]
pub struct FakeNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for an exact URL.
    pub fn respond(&self, snapshot: ResponseSnapshot) {
        self.responses
            .lock()
            .unwrap()
            .insert(snapshot.url.clone(), snapshot);
    }

    /// Script a 200 basic response with the given body.
    pub fn respond_ok(&self, url: &str, body: &str) {
        self.respond(basic_ok(url, body));
    }

    /// Script a response under a request URL that differs from the snapshot's
    /// own URL, the way a redirect leaves the snapshot carrying the final URL.
    pub fn respond_at(&self, request_url: &str, snapshot: ResponseSnapshot) {
        self.responses
            .lock()
            .unwrap()
            .insert(request_url.to_string(), snapshot);
    }

    /// Drop a scripted response again.
    pub fn forget(&self, url: &str) {
        self.responses.lock().unwrap().remove(url);
    }

    /// Simulate total network loss.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetches attempted, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkFetch for FakeNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SwError::Network("offline".to_string()));
        }
        self.responses
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| SwError::Network(format!("unreachable: {}", request.url)))
    }
}

/// A 200 same-origin snapshot.
pub fn basic_ok(url: &str, body: &str) -> ResponseSnapshot {
    snapshot(url, 200, ResponseType::Basic, body)
}

pub fn snapshot(url: &str, status: u16, response_type: ResponseType, body: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(
        url,
        "GET",
        status,
        HashMap::new(),
        Bytes::copy_from_slice(body.as_bytes()),
        response_type,
    )
}

/// Script a successful response for every manifest entry of `config`.
pub fn seed_manifest(network: &FakeNetwork, config: &SwConfig) {
    for entry in &config.precache_manifest {
        let url = config.manifest_url(entry).unwrap();
        let response_type = if config.is_same_origin(url.as_str()) {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };
        network.respond(snapshot(url.as_str(), 200, response_type, "asset"));
    }
}

/// A small config pointing at a test origin, with a short manifest.
pub fn test_config(cache_name: &str) -> SwConfig {
    SwConfig {
        cache_name: cache_name.to_string(),
        origin: "https://portfolio.test".to_string(),
        precache_manifest: vec![
            "/".to_string(),
            "/index.html".to_string(),
            "/style.css".to_string(),
            "/app.js".to_string(),
        ],
        ..Default::default()
    }
}
