//! Network capability.
//!
//! The router and lifecycle controller never talk to the network directly;
//! they go through [`NetworkFetch`] so tests can substitute a counting fake.
//! [`HttpNetwork`] is the production implementation on top of `reqwest`.

use async_trait::async_trait;
use hashbrown::HashMap;
use tracing::debug;

use portico_cache::{ResponseSnapshot, ResponseType};

use crate::{FetchRequest, SwError};

/// Capability interface for performing a real fetch.
#[async_trait]
pub trait NetworkFetch: Send + Sync {
    /// Perform the request and snapshot the full response.
    ///
    /// Transport-level failures are errors; HTTP error statuses are ordinary
    /// snapshots (a 404 is still a response the page gets to see).
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError>;
}

/// `reqwest`-backed [`NetworkFetch`].
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: String,
}

impl HttpNetwork {
    /// Build a client classifying responses against `origin`.
    pub fn new(origin: impl Into<String>) -> Result<Self, SwError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SwError::Network(e.to_string()))?;
        Ok(Self {
            client,
            origin: origin.into(),
        })
    }

    fn classify(&self, url: &str) -> ResponseType {
        match url.strip_prefix(&self.origin) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => {
                ResponseType::Basic
            }
            _ => ResponseType::Cors,
        }
    }
}

#[async_trait]
impl NetworkFetch for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, SwError> {
        debug!(method = %request.method, url = %request.url, "network fetch");

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| SwError::Network(e.to_string()))?;
        let response = self
            .client
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(|e| SwError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| SwError::Network(e.to_string()))?;

        let response_type = self.classify(&final_url);
        Ok(ResponseSnapshot::new(
            final_url,
            request.method.as_str(),
            status,
            headers,
            body,
            response_type,
        ))
    }
}
