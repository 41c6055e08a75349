//! The worker driver: registration state machine plus the event surface the
//! host runtime calls into.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use portico_cache::BucketStore;

use crate::lifecycle::{ActivateReport, InstallReport};
use crate::messages::CONTACT_FORM_SYNC_TAG;
use crate::notifications::click_action;
use crate::{
    ClickAction, ControlMessage, FetchRequest, FetchRouter, LifecycleController, NetworkFetch,
    Notification, RouteOutcome, SwConfig, SwError, WorkerState,
};

// ==================== Registration ====================

/// One worker version moving through the lifecycle.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    /// Bucket version this worker serves.
    pub version: String,

    /// Current lifecycle state.
    pub state: WorkerState,

    /// Time of the last state change.
    pub state_changed_at: Instant,
}

impl WorkerHandle {
    fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            state: WorkerState::Parsed,
            state_changed_at: Instant::now(),
        }
    }

    fn set_state(&mut self, state: WorkerState) {
        debug!(version = %self.version, ?state, "worker state change");
        self.state = state;
        self.state_changed_at = Instant::now();
    }
}

/// Installing / waiting / active slots for one scope.
///
/// At most one worker occupies each slot; promotion moves a worker forward
/// and marks anything it displaces redundant.
#[derive(Debug, Default)]
pub struct Registration {
    pub installing: Option<WorkerHandle>,
    pub waiting: Option<WorkerHandle>,
    pub active: Option<WorkerHandle>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new worker version starts installing.
    pub fn begin_install(&mut self, version: &str) {
        let mut handle = WorkerHandle::new(version);
        handle.set_state(WorkerState::Installing);
        self.installing = Some(handle);
    }

    /// Install succeeded: installing becomes waiting.
    pub fn install_complete(&mut self) {
        if let Some(mut handle) = self.installing.take() {
            handle.set_state(WorkerState::Installed);
            self.waiting = Some(handle);
        }
    }

    /// Install failed: the worker is redundant, any previous active worker
    /// keeps serving.
    pub fn install_failed(&mut self) {
        if let Some(mut handle) = self.installing.take() {
            handle.set_state(WorkerState::Redundant);
        }
    }

    /// Promote the waiting worker, displacing the old active one.
    pub fn activate(&mut self) {
        if let Some(mut handle) = self.waiting.take() {
            handle.set_state(WorkerState::Activating);
            if let Some(mut old) = self.active.take() {
                old.set_state(WorkerState::Redundant);
            }
            handle.set_state(WorkerState::Activated);
            self.active = Some(handle);
        }
    }

    /// Skip the waiting period: identical to activation, applied immediately.
    pub fn skip_waiting(&mut self) {
        self.activate();
    }

    /// Version of the worker currently in control.
    pub fn active_version(&self) -> Option<&str> {
        self.active.as_ref().map(|h| h.version.as_str())
    }

    /// Most advanced lifecycle state across the slots.
    pub fn state(&self) -> WorkerState {
        if let Some(handle) = &self.active {
            return handle.state;
        }
        if let Some(handle) = &self.waiting {
            return handle.state;
        }
        if let Some(handle) = &self.installing {
            return handle.state;
        }
        WorkerState::Parsed
    }
}

// ==================== Service Worker ====================

/// The assembled worker: lifecycle controller, fetch router, and endpoints
/// behind the host runtime's event surface.
///
/// Exactly one of these is registered per scope, and [`ServiceWorker::on_fetch`]
/// is the only fetch handler; classification inside the router decides which
/// strategy answers, so no two handlers ever race for one request.
pub struct ServiceWorker {
    config: Arc<SwConfig>,
    lifecycle: LifecycleController,
    router: FetchRouter,
    registration: RwLock<Registration>,
}

impl ServiceWorker {
    /// Validate the configuration and wire up the worker.
    pub fn new(
        config: SwConfig,
        store: Arc<dyn BucketStore>,
        network: Arc<dyn NetworkFetch>,
    ) -> Result<Self, SwError> {
        config.validate()?;
        let config = Arc::new(config);
        let lifecycle = LifecycleController::new(
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&network),
        );
        let router = FetchRouter::new(Arc::clone(&config), store, network);
        Ok(Self {
            config,
            lifecycle,
            router,
            registration: RwLock::new(Registration::new()),
        })
    }

    pub fn config(&self) -> &SwConfig {
        &self.config
    }

    /// Install event: seed the bucket, all-or-nothing. On failure the worker
    /// is redundant and a previously active worker keeps serving.
    pub async fn on_install(&self) -> Result<InstallReport, SwError> {
        self.registration
            .write()
            .await
            .begin_install(&self.config.cache_name);

        match self.lifecycle.install().await {
            Ok(report) => {
                let mut registration = self.registration.write().await;
                registration.install_complete();
                if report.skip_waiting {
                    info!("skip-waiting requested at install");
                }
                Ok(report)
            }
            Err(err) => {
                self.registration.write().await.install_failed();
                Err(err)
            }
        }
    }

    /// Activate event: promote the worker, delete stale buckets, claim pages.
    pub async fn on_activate(&self) -> Result<ActivateReport, SwError> {
        self.registration.write().await.activate();
        let report = self.lifecycle.activate().await?;
        if report.claim_clients {
            info!("claiming open clients");
        }
        Ok(report)
    }

    /// Fetch event. Only an activated worker controls pages.
    pub async fn on_fetch(&self, request: &FetchRequest) -> Result<RouteOutcome, SwError> {
        let state = self.registration.read().await.state();
        if !state.is_active() {
            return Err(SwError::State(format!(
                "fetch dispatched to worker in state {state:?}"
            )));
        }
        self.router.route(request).await
    }

    /// Message event. Returns whether a recognized command was applied.
    pub async fn on_message(&self, payload: &Value) -> Result<bool, SwError> {
        match ControlMessage::parse(payload) {
            Some(ControlMessage::SkipWaiting) => {
                info!("skip-waiting command received");
                let had_waiting = {
                    let mut registration = self.registration.write().await;
                    let had_waiting = registration.waiting.is_some();
                    registration.skip_waiting();
                    had_waiting
                };
                if had_waiting {
                    self.lifecycle.activate().await?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Background sync event. Recognized tags are acknowledged; there is no
    /// queued work behind them.
    pub fn on_sync(&self, tag: &str) -> bool {
        if tag == CONTACT_FORM_SYNC_TAG {
            info!(tag, "background sync acknowledged");
            true
        } else {
            false
        }
    }

    /// Push event: build the notification for the host to display.
    pub fn on_push(&self, payload: Option<&str>) -> Notification {
        Notification::for_push(&self.config.notification, payload)
    }

    /// Notification click: close happens host-side, this decides navigation.
    pub fn on_notification_click(&self, action: &str) -> ClickAction {
        click_action(action)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        self.registration.read().await.state()
    }
}
