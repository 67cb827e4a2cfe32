//! # Client Configuration Module
//!
//! Configuration for the sync client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ClientConfig` instance holding the dependencies and settings the core
//! needs. It enforces fail-fast validation so a half-wired client errors at
//! startup instead of at the first backup request.
//!
//! ## Required Dependencies
//!
//! - `NotificationShell` - Required for user-facing transient messages
//! - State directory - Required for provisioning transient run databases
//!
//! ## Optional Dependencies
//!
//! - `LoggerSink` - Host logging integration (optional)
//! - `Clock` - Time source (defaults to the system clock)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::builder()
//!     .state_dir("/var/lib/filesync")
//!     .app_name("File Sync")
//!     .notifications(Arc::new(MyTrayShell))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::log::{Clock, LoggerSink, SystemClock};
use bridge_traits::notify::NotificationShell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for the sync client core.
///
/// Use [`ClientConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ClientConfig {
    /// Directory where transient run databases are provisioned.
    pub state_dir: PathBuf,

    /// Application name used for notification branding.
    pub app_name: String,

    /// Buffer size of the progress dispatcher channel.
    pub event_buffer_size: usize,

    /// User-facing notification surface (required).
    pub notifications: Arc<dyn NotificationShell>,

    /// Host logging integration (optional).
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Time source (defaults to the system clock).
    pub clock: Arc<dyn Clock>,
}

impl ClientConfig {
    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    state_dir: Option<PathBuf>,
    app_name: Option<String>,
    event_buffer_size: Option<usize>,
    notifications: Option<Arc<dyn NotificationShell>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientConfigBuilder {
    /// Directory where transient run databases are provisioned.
    pub fn state_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.state_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Application name used for notification branding.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Buffer size of the progress dispatcher channel.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// User-facing notification surface (required).
    pub fn notifications(mut self, shell: Arc<dyn NotificationShell>) -> Self {
        self.notifications = Some(shell);
        self
    }

    /// Host logging integration.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Time source override.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when a required dependency or setting is missing.
    pub fn build(self) -> Result<ClientConfig> {
        let state_dir = self
            .state_dir
            .ok_or_else(|| Error::Config("state_dir is required".to_string()))?;

        if !state_dir.is_absolute() {
            return Err(Error::Config(format!(
                "state_dir must be absolute, got {}",
                state_dir.display()
            )));
        }

        let notifications = self.notifications.ok_or_else(|| Error::CapabilityMissing {
            capability: "NotificationShell".to_string(),
            message: "No notification shell provided. Inject the host's tray \
                      or notification-center adapter."
                .to_string(),
        })?;

        let event_buffer_size = self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be at least 1".to_string(),
            ));
        }

        Ok(ClientConfig {
            state_dir,
            app_name: self.app_name.unwrap_or_else(|| "File Sync".to_string()),
            event_buffer_size,
            notifications,
            logger_sink: self.logger_sink,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
