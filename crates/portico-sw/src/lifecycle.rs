//! Lifecycle: bucket seeding at install, stale-bucket GC at activate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use portico_cache::BucketStore;

use crate::{FetchRequest, NetworkFetch, SwConfig, SwError};

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Script loaded, nothing run yet.
    #[default]
    Parsed,
    /// Install event in flight.
    Installing,
    /// Installed, waiting to take over.
    Installed,
    /// Activate event in flight.
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Failed install or superseded by a newer version.
    Redundant,
}

impl WorkerState {
    pub fn is_active(self) -> bool {
        self == Self::Activated
    }

    pub fn is_redundant(self) -> bool {
        self == Self::Redundant
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, Copy)]
pub struct InstallReport {
    /// Entries seeded from the manifest.
    pub entries_cached: usize,
    /// The worker asks to take over immediately instead of waiting for the
    /// old worker to be unused.
    pub skip_waiting: bool,
}

/// Result of activation.
#[derive(Debug, Clone)]
pub struct ActivateReport {
    /// Stale buckets actually deleted.
    pub deleted_buckets: Vec<String>,
    /// The worker claims currently open pages without a reload.
    pub claim_clients: bool,
}

/// Owns bucket creation, population, and garbage collection across worker
/// version upgrades.
pub struct LifecycleController {
    config: Arc<SwConfig>,
    store: Arc<dyn BucketStore>,
    network: Arc<dyn NetworkFetch>,
}

impl LifecycleController {
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

    /// Seed the current bucket from the manifest, all-or-nothing.
    ///
    /// Any asset that cannot be fetched fails the whole install: a worker
    /// that cannot fully seed its offline manifest must not activate and
    /// silently serve partial offline support. Puts are keyed by exact URL,
    /// so re-running install yields one entry per manifest URL.
    pub async fn install(&self) -> Result<InstallReport, SwError> {
        info!(bucket = %self.config.cache_name, assets = self.config.precache_manifest.len(), "installing");
        self.store.open_bucket(&self.config.cache_name).await?;

        let mut entries_cached = 0;
        for entry in &self.config.precache_manifest {
            let url = self.config.manifest_url(entry)?;
            let request = FetchRequest::get(url);
            let snapshot = self
                .network
                .fetch(&request)
                .await
                .map_err(|err| SwError::InstallFailed(format!("{entry}: {err}")))?;
            if !snapshot.is_success() {
                return Err(SwError::InstallFailed(format!(
                    "{entry}: status {}",
                    snapshot.status
                )));
            }
            self.store
                .put_in_bucket(&self.config.cache_name, snapshot.keyed_as(&request.key()))
                .await?;
            entries_cached += 1;
        }

        info!(bucket = %self.config.cache_name, entries_cached, "install complete");
        Ok(InstallReport {
            entries_cached,
            skip_waiting: true,
        })
    }

    /// Delete every bucket that is not the current version, then claim
    /// clients. Deletions are independent and best-effort; one failure never
    /// blocks the others or activation itself.
    pub async fn activate(&self) -> Result<ActivateReport, SwError> {
        let mut deleted_buckets = Vec::new();
        for name in self.store.list_bucket_names().await {
            if name == self.config.cache_name {
                continue;
            }
            match self.store.delete_bucket(&name).await {
                Ok(true) => {
                    info!(bucket = %name, "deleted stale bucket");
                    deleted_buckets.push(name);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(bucket = %name, error = %err, "failed to delete stale bucket");
                }
            }
        }

        info!(bucket = %self.config.cache_name, "activated");
        Ok(ActivateReport {
            deleted_buckets,
            claim_clients: true,
        })
    }
}
