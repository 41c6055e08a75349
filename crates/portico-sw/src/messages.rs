//! Control messages from controlled pages.
//!
//! Two wire shapes are accepted for the skip-waiting command, for
//! compatibility with both generations of page script:
//! `{"type": "SKIP_WAITING"}` and `{"action": "skipWaiting"}`.

use serde_json::Value;
use tracing::debug;

/// A recognized out-of-band command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Promote the waiting worker immediately.
    SkipWaiting,
}

impl ControlMessage {
    /// Parse a message payload. Unrecognized messages are ignored, not errors.
    pub fn parse(payload: &Value) -> Option<Self> {
        if payload.get("type").and_then(Value::as_str) == Some("SKIP_WAITING") {
            return Some(Self::SkipWaiting);
        }
        if payload.get("action").and_then(Value::as_str) == Some("skipWaiting") {
            return Some(Self::SkipWaiting);
        }
        debug!(payload = %payload, "ignoring unrecognized message");
        None
    }
}

/// Background sync tags the worker acknowledges.
pub const CONTACT_FORM_SYNC_TAG: &str = "contact-form-sync";
