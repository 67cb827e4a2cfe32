//! Transient State Store Abstraction
//!
//! The synchronization engine keeps per-run bookkeeping (seen paths, etags,
//! timestamps) in a store it treats as opaque. The orchestrator provisions
//! one store per run and destroys it with the run; the engine only reads and
//! writes through this trait.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Opaque per-run bookkeeping store.
///
/// Implementations own a backing database whose lifetime matches the store
/// value: dropping the store releases the backing file.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Filesystem location of the backing database.
    fn location(&self) -> &Path;

    /// Drop all bookkeeping rows, returning the store to its freshly
    /// created state.
    async fn reset(&self) -> Result<()>;
}
