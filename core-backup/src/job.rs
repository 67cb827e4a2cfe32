//! # Backup Run State Machine
//!
//! Tracks the lifecycle of one backup attempt with validated state
//! transitions.
//!
//! ## State Machine
//!
//! ```text
//! Created → Validating → DirectoryPending → Syncing → Completed
//!     │          │               │             │
//!     └──────────┴───────────────┴─────────────┴────→ Failed
//! ```
//!
//! `Failed` is absorbing: it is reachable from every non-terminal state and
//! nothing leaves it. The entity also accumulates the ordered list of synced
//! files while `Syncing`; that list becomes the success report.

use crate::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackupRunId(Uuid);

impl BackupRunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BackupRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BackupRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BackupRunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The current state of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Run has been created but not yet started
    Created,
    /// Request parameters are being validated and resources provisioned
    Validating,
    /// Waiting for the remote directory-creation call
    DirectoryPending,
    /// The synchronization engine is running
    Syncing,
    /// Run completed successfully
    Completed,
    /// Run failed
    Failed,
}

impl RunState {
    /// Check if this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Created => "created",
            RunState::Validating => "validating",
            RunState::DirectoryPending => "directory-pending",
            RunState::Syncing => "syncing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl FromStr for RunState {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "created" => Ok(RunState::Created),
            "validating" => Ok(RunState::Validating),
            "directory-pending" => Ok(RunState::DirectoryPending),
            "syncing" => Ok(RunState::Syncing),
            "completed" => Ok(RunState::Completed),
            "failed" => Ok(RunState::Failed),
            _ => Err(BackupError::InvalidStateTransition {
                from: s.to_string(),
                to: String::new(),
                reason: "Unknown state".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One backup attempt with state machine semantics.
///
/// Transitions are validated; misuse surfaces as
/// [`BackupError::InvalidStateTransition`] rather than silently corrupting
/// the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRun {
    /// Unique identifier for this run
    pub id: BackupRunId,
    /// Local folder being backed up
    pub local_path: String,
    /// Remote destination folder
    pub remote_path: String,
    /// Current state
    pub state: RunState,
    /// Relative paths of synced files, in completion order
    pub synced_files: Vec<String>,
    /// Error message if failed
    pub error_message: Option<String>,
    /// When the run was created
    pub created_at: i64,
    /// When validation started
    pub started_at: Option<i64>,
    /// When the run reached a terminal state
    pub completed_at: Option<i64>,
}

impl BackupRun {
    /// Create a new run in `Created` state.
    pub fn new(local_path: impl Into<String>, remote_path: impl Into<String>) -> Self {
        Self {
            id: BackupRunId::new(),
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            state: RunState::Created,
            synced_files: Vec::new(),
            error_message: None,
            created_at: current_timestamp(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Begin validating the request.
    ///
    /// # Errors
    ///
    /// Returns an error unless the run is in `Created` state.
    pub fn begin_validation(&mut self) -> Result<()> {
        self.transition(RunState::Validating)?;
        self.started_at = Some(current_timestamp());
        Ok(())
    }

    /// Validation succeeded; the remote directory call is in flight.
    pub fn directory_pending(&mut self) -> Result<()> {
        self.transition(RunState::DirectoryPending)
    }

    /// The remote directory was created; the engine is running.
    pub fn syncing(&mut self) -> Result<()> {
        self.transition(RunState::Syncing)
    }

    /// Record one synced item.
    ///
    /// # Errors
    ///
    /// Returns an error unless the run is in `Syncing` state.
    pub fn record_item(&mut self, file: impl Into<String>) -> Result<()> {
        if self.state != RunState::Syncing {
            return Err(BackupError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: "record_item".to_string(),
                reason: "Run must be syncing to record items".to_string(),
            });
        }

        self.synced_files.push(file.into());
        Ok(())
    }

    /// Mark the run as completed.
    ///
    /// # Errors
    ///
    /// Returns an error unless the run is in `Syncing` state.
    pub fn complete(&mut self) -> Result<()> {
        self.transition(RunState::Completed)?;
        self.completed_at = Some(current_timestamp());
        Ok(())
    }

    /// Mark the run as failed with an error message.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is already in a terminal state.
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<()> {
        self.transition(RunState::Failed)?;
        self.completed_at = Some(current_timestamp());
        self.error_message = Some(error_message.into());
        Ok(())
    }

    fn transition(&mut self, to: RunState) -> Result<()> {
        let valid = match (self.state, to) {
            (RunState::Created, RunState::Validating) => true,
            (RunState::Validating, RunState::DirectoryPending) => true,
            (RunState::DirectoryPending, RunState::Syncing) => true,
            (RunState::Syncing, RunState::Completed) => true,

            // Failed is absorbing and reachable from every non-terminal state
            (from, RunState::Failed) => !from.is_terminal(),

            _ => false,
        };

        if !valid {
            return Err(BackupError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.state.as_str(),
                    to.as_str()
                ),
            });
        }

        self.state = to;
        Ok(())
    }
}

/// Get current Unix timestamp
fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
