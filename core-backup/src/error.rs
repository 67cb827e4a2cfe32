use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to find {0}")]
    AccountNotFound(String),

    #[error("Local path must be an absolute path")]
    RelativeLocalPath,

    #[error("Failed to create temporary database: {0}")]
    StateStore(String),

    #[error("{0}")]
    InvalidPattern(String),

    #[error("No connection available for account {0}")]
    NoConnection(String),

    #[error("Destination {0} already exists")]
    DestinationExists(String),

    #[error("{0}")]
    Remote(String),

    #[error("{0}")]
    Engine(String),

    #[error("Backup did not complete successfully")]
    Incomplete,

    #[error("Sync engine terminated unexpectedly")]
    EngineStopped,

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, BackupError>;
