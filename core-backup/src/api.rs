//! # Caller-Facing API Job
//!
//! One socket-API request, from the orchestrator's point of view: the
//! untyped argument payload, an advisory warning channel, and a reply that
//! is delivered exactly once.
//!
//! The reply travels over a oneshot channel. Dropping the caller's receiver
//! mid-run is tolerated; delivery becomes a no-op and the run still drives
//! its resources to release.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

/// Success payload returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    /// The local folder that was backed up.
    pub local_path: String,
    /// Relative paths of every synced file, in completion order.
    pub synced_files: Vec<String>,
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success(BackupSummary),
    Failure(String),
}

/// Reply delivered to the caller, exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReply {
    /// Advisory warnings raised while handling the request.
    pub warnings: Vec<String>,
    /// The terminal outcome.
    pub outcome: JobOutcome,
}

/// One in-flight socket-API job.
///
/// Owned by the orchestrator for the duration of the request; the reply
/// sender is consumed by the first call to [`succeed`](ApiJob::succeed) or
/// [`fail`](ApiJob::fail) and later calls are ignored with a warning.
#[derive(Debug)]
pub struct ApiJob {
    arguments: Value,
    warnings: Vec<String>,
    reply: Option<oneshot::Sender<JobReply>>,
}

impl ApiJob {
    /// Create a job from a request payload.
    ///
    /// Returns the job together with the receiver the caller awaits the
    /// reply on.
    pub fn new(arguments: Value) -> (Self, oneshot::Receiver<JobReply>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                arguments,
                warnings: Vec::new(),
                reply: Some(sender),
            },
            receiver,
        )
    }

    /// The untyped request payload.
    pub fn arguments(&self) -> &Value {
        &self.arguments
    }

    /// Record a non-fatal advisory for the caller.
    pub fn set_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether a reply has already been delivered.
    pub fn is_settled(&self) -> bool {
        self.reply.is_none()
    }

    /// Deliver a success reply. First terminal call wins.
    pub fn succeed(&mut self, summary: BackupSummary) {
        self.settle(JobOutcome::Success(summary));
    }

    /// Deliver a failure reply. First terminal call wins.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.settle(JobOutcome::Failure(error.into()));
    }

    fn settle(&mut self, outcome: JobOutcome) {
        match self.reply.take() {
            Some(sender) => {
                let reply = JobReply {
                    warnings: std::mem::take(&mut self.warnings),
                    outcome,
                };
                // The caller may have gone away; abandoning is fine.
                let _ = sender.send(reply);
            }
            None => warn!("Ignoring second reply for an already settled job"),
        }
    }
}

impl Drop for ApiJob {
    fn drop(&mut self) {
        if self.reply.is_some() {
            warn!("API job dropped without a reply");
        }
    }
}
