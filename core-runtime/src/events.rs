//! # Progress Dispatcher
//!
//! Process-wide broadcast channel for UI-facing progress and status updates,
//! built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Any number of backup or sync runs publish into one dispatcher; any number
//! of consumers (progress panes, activity lists, the socket API) subscribe
//! independently. Events are keyed by the local folder path a run operates
//! on, so consumers can filter for the folders they display.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit       ┌──────────────┐
//! │ Backup Run A ├──────────────>│              │
//! └──────────────┘               │  Progress    │   subscribe   ┌────────────┐
//!                                │  Dispatcher  ├──────────────>│ Subscriber │
//! ┌──────────────┐    emit       │  (broadcast) │               └────────────┘
//! │ Backup Run B ├──────────────>│              │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receiver-side errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: all senders dropped; treat as shutdown.
//!
//! Publishing to a dispatcher with no subscribers returns an error that
//! callers routinely ignore; progress is best-effort.

use bridge_traits::engine::ProgressInfo;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the dispatcher channel.
///
/// Subscribers that fall behind by more than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Status Items
// ============================================================================

/// Outcome classification of a status item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// The reported step succeeded.
    Success,
    /// The reported step failed and the operation is over.
    FatalError,
}

/// One UI-facing status record.
///
/// Produced per synced item and for run-level status messages ("backup
/// started", "backup failed with: ..."). Consumers render these in activity
/// lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    /// Relative file path, when the record concerns a single file.
    pub file: Option<String>,
    /// Success or fatal error.
    pub status: ItemStatus,
    /// Human-readable message for successful records.
    pub message: Option<String>,
    /// Human-readable error text for failed records.
    pub error: Option<String>,
    /// RFC 2822 timestamp of when the record was produced.
    pub response_timestamp: String,
}

impl StatusItem {
    /// A successful status record carrying `message`.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            file: None,
            status: ItemStatus::Success,
            message: Some(message.into()),
            error: None,
            response_timestamp: Utc::now().to_rfc2822(),
        }
    }

    /// A fatal-error status record carrying `error`.
    pub fn fatal_error(error: impl Into<String>) -> Self {
        Self {
            file: None,
            status: ItemStatus::FatalError,
            message: None,
            error: Some(error.into()),
            response_timestamp: Utc::now().to_rfc2822(),
        }
    }

    /// Attach the relative file path this record concerns.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

// ============================================================================
// Progress Events
// ============================================================================

/// Event published through the dispatcher, keyed by local folder path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ProgressEvent {
    /// Transfer progress of a running synchronization.
    Sync {
        /// Local folder the run operates on.
        local_path: String,
        /// Engine-reported progress snapshot.
        info: ProgressInfo,
    },
    /// A status record was produced.
    Item {
        /// Local folder the run operates on.
        local_path: String,
        /// The status record.
        item: StatusItem,
    },
}

impl ProgressEvent {
    /// The local folder path this event is keyed by.
    pub fn local_path(&self) -> &str {
        match self {
            ProgressEvent::Sync { local_path, .. } => local_path,
            ProgressEvent::Item { local_path, .. } => local_path,
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            ProgressEvent::Sync { .. } => "Sync progress update",
            ProgressEvent::Item {
                item:
                    StatusItem {
                        status: ItemStatus::FatalError,
                        ..
                    },
                ..
            } => "Operation failed",
            ProgressEvent::Item { .. } => "Status update",
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Process-wide dispatcher for publishing and subscribing to progress events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `ProgressDispatcher`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct ProgressDispatcher {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressDispatcher {
    /// Creates a new dispatcher with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none. Publishers treat the error as "nobody is
    /// watching" and carry on.
    pub fn emit(&self, event: ProgressEvent) -> Result<usize, SendError<ProgressEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProgressDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for ProgressDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
