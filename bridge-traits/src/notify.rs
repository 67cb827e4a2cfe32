//! User Notification Abstraction
//!
//! Transient, best-effort messages surfaced in the desktop shell (tray
//! balloon, notification center). Display failures are the host's problem;
//! callers never depend on delivery.

use async_trait::async_trait;

/// Icon shown next to a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageIcon {
    /// The application's default icon.
    Default,
    /// The sync-error state icon.
    SyncError,
}

/// User-facing notification surface of the desktop shell.
#[async_trait]
pub trait NotificationShell: Send + Sync {
    /// Show a transient message to the user. Best-effort; never fails.
    async fn show_transient_message(&self, title: &str, body: &str, icon: MessageIcon);
}
