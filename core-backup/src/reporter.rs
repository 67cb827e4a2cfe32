//! # Outcome Reporting
//!
//! Fans one human-readable status message out to both UI-facing sinks: the
//! process-wide progress dispatcher (for progress panes and activity lists)
//! and the shell's transient notification surface.
//!
//! Reporting is best-effort and never fails; a run's outcome does not depend
//! on anyone watching.

use bridge_traits::notify::{MessageIcon, NotificationShell};
use core_runtime::events::{ProgressDispatcher, ProgressEvent, StatusItem};
use std::sync::Arc;

/// Formats and dispatches run-level status messages.
pub struct OutcomeReporter {
    app_name: String,
    dispatcher: Arc<ProgressDispatcher>,
    notifications: Arc<dyn NotificationShell>,
}

impl OutcomeReporter {
    pub fn new(
        app_name: impl Into<String>,
        dispatcher: Arc<ProgressDispatcher>,
        notifications: Arc<dyn NotificationShell>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            dispatcher,
            notifications,
        }
    }

    /// Publish one status message for the run on `local_path`.
    ///
    /// Builds a success or fatal-error status record, broadcasts it keyed by
    /// the local path, and shows a transient notification with an icon
    /// matching the outcome.
    pub async fn log_message(&self, local_path: &str, message: &str, ok: bool) {
        let (item, icon) = if ok {
            (StatusItem::success(message), MessageIcon::Default)
        } else {
            (StatusItem::fatal_error(message), MessageIcon::SyncError)
        };

        self.notifications
            .show_transient_message(&format!("{} backup", self.app_name), message, icon)
            .await;

        // Nobody subscribed is fine; progress display is best-effort.
        let _ = self.dispatcher.emit(ProgressEvent::Item {
            local_path: local_path.to_string(),
            item,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_runtime::events::ItemStatus;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Shell {}

        #[async_trait]
        impl NotificationShell for Shell {
            async fn show_transient_message(&self, title: &str, body: &str, icon: MessageIcon);
        }
    }

    fn reporter_with(shell: MockShell) -> (OutcomeReporter, Arc<ProgressDispatcher>) {
        let dispatcher = Arc::new(ProgressDispatcher::new(16));
        let reporter = OutcomeReporter::new("File Sync", Arc::clone(&dispatcher), Arc::new(shell));
        (reporter, dispatcher)
    }

    #[tokio::test]
    async fn success_message_uses_default_icon_and_success_status() {
        let mut shell = MockShell::new();
        shell
            .expect_show_transient_message()
            .with(
                eq("File Sync backup"),
                eq("Backup of /data started"),
                eq(MessageIcon::Default),
            )
            .times(1)
            .return_const(());

        let (reporter, dispatcher) = reporter_with(shell);
        let mut events = dispatcher.subscribe();

        reporter.log_message("/data", "Backup of /data started", true).await;

        match events.recv().await.unwrap() {
            ProgressEvent::Item { local_path, item } => {
                assert_eq!(local_path, "/data");
                assert_eq!(item.status, ItemStatus::Success);
                assert_eq!(item.message.as_deref(), Some("Backup of /data started"));
                assert!(item.error.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn failure_message_uses_error_icon_and_fatal_status() {
        let mut shell = MockShell::new();
        shell
            .expect_show_transient_message()
            .with(
                eq("File Sync backup"),
                eq("Backup of /data failed with: boom"),
                eq(MessageIcon::SyncError),
            )
            .times(1)
            .return_const(());

        let (reporter, dispatcher) = reporter_with(shell);
        let mut events = dispatcher.subscribe();

        reporter
            .log_message("/data", "Backup of /data failed with: boom", false)
            .await;

        match events.recv().await.unwrap() {
            ProgressEvent::Item { item, .. } => {
                assert_eq!(item.status, ItemStatus::FatalError);
                assert_eq!(item.error.as_deref(), Some("Backup of /data failed with: boom"));
                assert!(item.message.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn reporting_without_subscribers_is_harmless() {
        let mut shell = MockShell::new();
        shell
            .expect_show_transient_message()
            .times(1)
            .return_const(());

        let (reporter, _dispatcher) = reporter_with(shell);
        reporter.log_message("/data", "Backup of /data started", true).await;
    }
}
