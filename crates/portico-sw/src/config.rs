//! Worker configuration.
//!
//! All routing tables and the bucket version live in one explicit value that
//! is handed to the router and the lifecycle controller at construction time.
//! Tests inject variants freely; nothing reads module-level globals.

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::SwError;

/// Service worker configuration.
///
/// `cache_name` doubles as the bucket version: bumping it on deployment is the
/// sole mechanism that invalidates previously cached entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwConfig {
    /// Versioned bucket name, e.g. `portico-portfolio-v1.0.0`.
    pub cache_name: String,

    /// Origin the worker is registered on.
    pub origin: String,

    /// Assets seeded into the bucket at install, in order. Local absolute
    /// paths and full CDN URLs.
    pub precache_manifest: Vec<String>,

    /// Substring markers routed network-first (API paths, form endpoints).
    pub network_first_markers: Vec<String>,

    /// Path suffixes routed cache-first (static assets seeded at install).
    pub cache_first_suffixes: Vec<String>,

    /// Substring markers never intercepted (analytics, tracking).
    pub bypass_markers: Vec<String>,

    /// URL schemes never intercepted.
    pub excluded_schemes: Vec<String>,

    /// Document served to failed navigations, looked up in the bucket.
    pub offline_fallback: String,

    /// Static notification metadata for push events.
    pub notification: NotificationConfig,
}

/// Static metadata for push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub title: String,
    pub icon: String,
    pub badge: String,
    /// Body used when a push event carries no payload.
    pub default_body: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Portico Portfolio".to_string(),
            icon: "/favicon.png".to_string(),
            badge: "/favicon.png".to_string(),
            default_body: "New update available!".to_string(),
        }
    }
}

impl Default for SwConfig {
    fn default() -> Self {
        Self {
            cache_name: "portico-portfolio-v1.0.0".to_string(),
            origin: "https://portico.dev".to_string(),
            precache_manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/style.css".to_string(),
                "/animations.css".to_string(),
                "/features.js".to_string(),
                "/animations.js".to_string(),
                "/manifest.json".to_string(),
                "/profile.jpg".to_string(),
                "/favicon.png".to_string(),
                "/resume.pdf".to_string(),
                "/work-1.png".to_string(),
                "/work-2.png".to_string(),
                "/work-3.png".to_string(),
                // External CDN resources
                "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap"
                    .to_string(),
                "https://unpkg.com/aos@next/dist/aos.css".to_string(),
                "https://unpkg.com/aos@next/dist/aos.js".to_string(),
                "https://unpkg.com/typed.js@2.1.0/dist/typed.umd.js".to_string(),
            ],
            network_first_markers: vec![
                "/api/".to_string(),
                "https://script.google.com/".to_string(),
            ],
            cache_first_suffixes: vec![
                ".css".to_string(),
                ".js".to_string(),
                ".png".to_string(),
                ".jpg".to_string(),
                ".jpeg".to_string(),
                ".svg".to_string(),
                ".pdf".to_string(),
            ],
            bypass_markers: vec![
                "analytics".to_string(),
                "gtag".to_string(),
                "google-analytics".to_string(),
            ],
            excluded_schemes: vec!["chrome-extension".to_string()],
            offline_fallback: "/index.html".to_string(),
            notification: NotificationConfig::default(),
        }
    }
}

impl SwConfig {
    /// Resolve a manifest entry to an absolute URL. Entries that already carry
    /// a scheme pass through; local paths are joined onto the origin.
    pub fn manifest_url(&self, entry: &str) -> Result<Url, SwError> {
        if let Ok(url) = Url::parse(entry) {
            return Ok(url);
        }
        let origin = Url::parse(&self.origin)?;
        Ok(origin.join(entry)?)
    }

    /// Absolute URL of the offline fallback document.
    pub fn offline_fallback_url(&self) -> Result<Url, SwError> {
        self.manifest_url(&self.offline_fallback)
    }

    /// Whether a URL belongs to this worker's origin. The origin must be
    /// followed by a path, query, or fragment boundary, so a host that merely
    /// extends it (`portico.dev.evil.com`) does not match.
    pub fn is_same_origin(&self, url: &str) -> bool {
        match url.strip_prefix(&self.origin) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }

    /// Reject configurations the worker cannot serve correctly.
    ///
    /// Cache-first assets are never backfilled after install, so the manifest
    /// must cover them. A suffix with no manifest representation is the one
    /// divergence that is survivable (every such request just misses cache
    /// forever), so it logs rather than fails.
    pub fn validate(&self) -> Result<(), SwError> {
        if self.cache_name.is_empty() {
            return Err(SwError::Config("cache_name must not be empty".into()));
        }
        Url::parse(&self.origin)
            .map_err(|e| SwError::Config(format!("origin is not a valid URL: {e}")))?;
        if self.precache_manifest.is_empty() {
            return Err(SwError::Config("precache manifest must not be empty".into()));
        }
        if !self.precache_manifest.contains(&self.offline_fallback) {
            return Err(SwError::Config(format!(
                "offline fallback {} is not in the precache manifest",
                self.offline_fallback
            )));
        }
        for entry in &self.precache_manifest {
            self.manifest_url(entry)?;
        }

        for suffix in &self.cache_first_suffixes {
            let covered = self
                .precache_manifest
                .iter()
                .any(|entry| entry.ends_with(suffix.as_str()));
            if !covered {
                warn!(
                    suffix = %suffix,
                    "cache-first suffix has no manifest entry; such requests will never be cached"
                );
            }
        }
        Ok(())
    }
}
