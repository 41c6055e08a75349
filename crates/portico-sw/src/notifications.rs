//! Push notifications and notification clicks. Stateless; no cache
//! interaction.

use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

/// A notification the host should display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
}

/// One action button on a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// What to do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Open or focus a window at this path.
    OpenWindow(String),
    /// Just close the notification.
    Dismiss,
}

impl Notification {
    /// Build the notification for a push event. The payload text becomes the
    /// body; an empty push uses the configured default.
    pub fn for_push(config: &NotificationConfig, payload: Option<&str>) -> Self {
        Self {
            title: config.title.clone(),
            body: payload.unwrap_or(&config.default_body).to_string(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: vec![100, 50, 100],
            actions: vec![
                NotificationAction {
                    action: "explore".to_string(),
                    title: "View Portfolio".to_string(),
                    icon: config.icon.clone(),
                },
                NotificationAction {
                    action: "close".to_string(),
                    title: "Close".to_string(),
                    icon: config.icon.clone(),
                },
            ],
        }
    }
}

/// Resolve a clicked action. Only `explore` opens the site; everything else,
/// including the close button, dismisses.
pub fn click_action(action: &str) -> ClickAction {
    match action {
        "explore" => ClickAction::OpenWindow("/".to_string()),
        _ => ClickAction::Dismiss,
    }
}
