//! Remote Storage Abstraction
//!
//! Minimal surface the backup orchestrator needs from an account's remote
//! server: creating a directory before a run starts. Implementations are
//! bound to one account's connection; hosts register them per account.

use async_trait::async_trait;
use thiserror::Error;

/// Status code a remote reports when the target directory already exists.
///
/// Matches MKCOL on an existing collection; transports with other
/// conventions map their conflict signal to this code.
pub const STATUS_FOLDER_EXISTS: u16 = 405;

/// Failure of a remote directory operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteDirError {
    /// Transport-level status code.
    pub status_code: u16,
    /// Human-readable transport message.
    pub message: String,
}

impl RemoteDirError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Whether this failure means the target directory already exists.
    pub fn is_conflict(&self) -> bool {
        self.status_code == STATUS_FOLDER_EXISTS
    }
}

/// Remote directory operations for one account's server connection.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create the directory at `path` on the remote.
    ///
    /// `path` is absolute-rooted. The call must fail with a conflict status
    /// ([`STATUS_FOLDER_EXISTS`]) when the directory is already present;
    /// callers rely on that to refuse overwriting an existing destination.
    async fn create_folder(&self, path: &str) -> Result<(), RemoteDirError>;
}
