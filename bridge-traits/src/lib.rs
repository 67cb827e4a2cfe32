//! # Host Bridge Traits
//!
//! Abstraction traits for the collaborators the sync client core drives but
//! does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the orchestration core and the
//! components that do the actual work: the synchronization engine, the remote
//! server connection, the transient bookkeeping store, and the desktop
//! shell's notification surface. Each trait is a seam where a production
//! implementation or a test double can be injected.
//!
//! ## Traits
//!
//! ### Synchronization
//! - [`SyncEngine`](engine::SyncEngine) - Black-box sync worker with a typed
//!   event-channel contract (progress, per-item completion, terminal outcome)
//! - [`StateStore`](store::StateStore) - Opaque per-run bookkeeping store
//!
//! ### Remote
//! - [`RemoteStorage`](remote::RemoteStorage) - Directory creation on an
//!   account's server, with a distinct already-exists conflict outcome
//!
//! ### Shell Integration
//! - [`NotificationShell`](notify::NotificationShell) - Transient user-facing
//!   messages, best-effort
//!
//! ### Utilities
//! - [`Clock`](log::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to the host
//!
//! ## Error Handling
//!
//! Bridge traits use [`BridgeError`](error::BridgeError) for consistent error
//! handling. Implementations should convert their internal errors and provide
//! actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod engine;
pub mod error;
pub mod log;
pub mod notify;
pub mod remote;
pub mod store;

pub use error::BridgeError;

// Re-export commonly used types
pub use engine::{
    EngineEvent, EngineRun, ErrorCategory, ProgressInfo, SyncEngine, SyncItem, SyncOptions,
};
pub use log::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use notify::{MessageIcon, NotificationShell};
pub use remote::{RemoteDirError, RemoteStorage, STATUS_FOLDER_EXISTS};
pub use store::StateStore;
