//! Synchronization Engine Abstraction
//!
//! The engine walks a local folder, compares it against remote state recorded
//! in a [`StateStore`](crate::store::StateStore), and transfers files. This
//! crate only defines the contract; concrete engines live in host crates.
//!
//! A run is started once and then observed: the engine delivers progress,
//! per-item completion, and a single terminal event (`Error` or `Finished`)
//! over a bounded channel. Consumers must drain the channel in order; the
//! terminal event is always the last one delivered.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::store::StateStore;

/// Filter options applied to one synchronization run.
///
/// Holds the compiled file-pattern matcher plus the manual exclusion list.
/// The pattern is validated at configuration time; a run is never started
/// with an uncompilable pattern.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    file_pattern: Option<Regex>,
    manual_excludes: Vec<String>,
}

impl SyncOptions {
    /// Compile and install the file-name filter pattern.
    ///
    /// An empty pattern clears the filter (every file matches).
    ///
    /// # Errors
    ///
    /// Returns the regex diagnostic if the pattern does not compile.
    pub fn set_file_pattern(&mut self, pattern: &str) -> std::result::Result<(), regex::Error> {
        if pattern.is_empty() {
            self.file_pattern = None;
        } else {
            self.file_pattern = Some(Regex::new(pattern)?);
        }
        Ok(())
    }

    /// The compiled file-name filter, if one is set.
    pub fn file_pattern(&self) -> Option<&Regex> {
        self.file_pattern.as_ref()
    }

    /// Add a path to the manual exclusion list.
    ///
    /// Excludes are relative paths; an entry excludes the path itself and
    /// everything below it.
    pub fn add_manual_exclude(&mut self, path: impl Into<String>) {
        self.manual_excludes.push(path.into());
    }

    /// The manual exclusion list, in insertion order.
    pub fn manual_excludes(&self) -> &[String] {
        &self.manual_excludes
    }

    /// Whether `relative_path` is covered by the manual exclusion list.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.manual_excludes.iter().any(|exclude| {
            relative_path == exclude
                || relative_path.starts_with(&format!("{}/", exclude.trim_end_matches('/')))
        })
    }

    /// Whether `relative_path` passes the file-pattern filter.
    pub fn matches_pattern(&self, relative_path: &str) -> bool {
        self.file_pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(relative_path))
    }
}

/// Snapshot of transfer progress for a running synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Total number of files the run will touch (may grow during discovery).
    pub files_total: u64,
    /// Number of files fully transferred so far.
    pub files_completed: u64,
    /// Total bytes the run will transfer.
    pub bytes_total: u64,
    /// Bytes transferred so far.
    pub bytes_completed: u64,
    /// Relative path of the file currently in flight.
    pub current_file: Option<String>,
}

/// One file or directory entry processed by the engine during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Path relative to the local root.
    pub file: String,
    /// Size in bytes, when known.
    pub size: Option<u64>,
}

/// Coarse classification of an engine-reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Any error with no more specific category.
    Generic,
    /// Connectivity or transport failure.
    Network,
    /// The remote refused the transfer (quota, permissions).
    RemoteStorage,
}

/// Event delivered by a running engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Transfer progress changed.
    Progress(ProgressInfo),
    /// One item finished syncing. Does not end the run.
    ItemCompleted(SyncItem),
    /// The run hit a fatal error. Terminal.
    Error {
        message: String,
        category: ErrorCategory,
    },
    /// The run ended. `ok` is false when the run finished without syncing
    /// everything it discovered. Terminal.
    Finished { ok: bool },
}

/// Everything an engine needs for one run.
pub struct EngineRun {
    /// Local folder to walk. Always carries a trailing separator.
    pub local_root: PathBuf,
    /// Remote folder to sync into. Always absolute-rooted.
    pub remote_root: String,
    /// Per-run bookkeeping store. Exclusively owned by this run.
    pub store: Arc<dyn StateStore>,
    /// File-pattern filter and manual excludes.
    pub options: SyncOptions,
}

/// Synchronization engine contract.
///
/// Implementations must deliver events in order, with exactly one terminal
/// event (`Error` or `Finished`) as the final message before the channel
/// closes.
#[async_trait]
pub trait SyncEngine: Send + Sync {
    /// Begin one synchronization run.
    ///
    /// Returns the channel on which the engine delivers [`EngineEvent`]s.
    /// The call returns as soon as the run is admitted; the run itself
    /// proceeds in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be admitted at all (the engine is
    /// shutting down, the store is unusable). Errors during the run are
    /// delivered as `EngineEvent::Error` instead.
    async fn start(&self, run: EngineRun) -> Result<mpsc::Receiver<EngineEvent>>;
}
