//! Push/notification boundary.
//!
//! The engine only shapes payloads and routing decisions; displaying
//! anything is the embedder's job, behind [`NotificationSink`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload delivered over the push channel. Every field is optional;
/// defaults are filled in when the notification is shaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

/// A notification ready to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl PushPayload {
    /// Fill in defaults: missing title falls back to the app name, missing
    /// body to a generic line, missing url to the root.
    pub fn into_notification(self, default_title: &str) -> Notification {
        Notification {
            title: self.title.unwrap_or_else(|| default_title.to_string()),
            body: self
                .body
                .unwrap_or_else(|| "New notification".to_string()),
            url: self.url.unwrap_or_else(|| "/".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Host capability for displaying notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn show(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// What a notification click should do with the host's open windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Focus the window at this index; it already shows the target URL.
    Focus(usize),
    /// Open the URL in a new window.
    Open(String),
    /// Explicit dismiss; do nothing.
    Dismiss,
}

/// Route a notification click: a dismiss action does nothing, otherwise
/// prefer focusing an existing window on the target URL over opening a
/// new one.
pub fn route_click(
    action: Option<&str>,
    url: &str,
    open_windows: &[String],
) -> ClickOutcome {
    if action == Some("close") {
        return ClickOutcome::Dismiss;
    }
    if let Some(index) = open_windows.iter().position(|w| w == url) {
        return ClickOutcome::Focus(index);
    }
    ClickOutcome::Open(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_defaults() {
        let n = PushPayload::default().into_notification("finance-app");
        assert_eq!(n.title, "finance-app");
        assert_eq!(n.body, "New notification");
        assert_eq!(n.url, "/");
    }

    #[test]
    fn payload_fields_win_over_defaults() {
        let n = PushPayload {
            title: Some("Budget alert".to_string()),
            body: Some("Groceries at 95%".to_string()),
            url: Some("/budgets".to_string()),
        }
        .into_notification("finance-app");
        assert_eq!(n.title, "Budget alert");
        assert_eq!(n.url, "/budgets");
    }

    #[test]
    fn click_focuses_existing_window() {
        let windows = vec!["/".to_string(), "/budgets".to_string()];
        assert_eq!(
            route_click(Some("open"), "/budgets", &windows),
            ClickOutcome::Focus(1)
        );
    }

    #[test]
    fn click_opens_when_no_window_matches() {
        let windows = vec!["/".to_string()];
        assert_eq!(
            route_click(None, "/budgets", &windows),
            ClickOutcome::Open("/budgets".to_string())
        );
    }

    #[test]
    fn close_action_dismisses() {
        let windows = vec!["/budgets".to_string()];
        assert_eq!(
            route_click(Some("close"), "/budgets", &windows),
            ClickOutcome::Dismiss
        );
    }
}
