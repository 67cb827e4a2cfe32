//! # Backup Coordinator
//!
//! Orchestrates one "back up this local folder to this remote path" request
//! on behalf of a socket-API client.
//!
//! ## Overview
//!
//! The `BackupCoordinator` is the control logic between the request surface
//! and the collaborators that do the work. For each request it:
//! - Parses the untyped payload into a [`BackupRequest`]
//! - Resolves the target account (uuid preferred; name lookup is deprecated
//!   and raises an advisory warning on the job)
//! - Validates the local path before any side effect
//! - Provisions a transient [`SqliteStateStore`] for the engine's bookkeeping
//! - Compiles the file-pattern filter and exclusion list
//! - Creates the remote directory, refusing to reuse an existing one
//! - Starts the synchronization engine and consumes its event stream
//! - Reports the outcome to the caller and to the UI sinks
//!
//! ## Workflow
//!
//! 1. `start()` admits the job and returns immediately
//! 2. The spawned run task walks `Created → Validating → DirectoryPending →
//!    Syncing` and ends in `Completed` or `Failed`
//! 3. Engine progress is forwarded to the progress dispatcher as it arrives;
//!    item completions accumulate into the ordered synced-files list
//! 4. Exactly one reply reaches the caller, and exactly one
//!    succeeded/failed status message reaches the reporter, on every path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_backup::{ApiJob, BackupCoordinator};
//! use std::sync::Arc;
//!
//! # async fn example(coordinator: BackupCoordinator, payload: serde_json::Value) {
//! let (job, reply) = ApiJob::new(payload);
//! let run_id = coordinator.start(job);
//! let outcome = reply.await;
//! # }
//! ```

use crate::api::{ApiJob, BackupSummary};
use crate::error::{BackupError, Result};
use crate::job::{BackupRun, BackupRunId};
use crate::reporter::OutcomeReporter;
use crate::request::{AccountSelector, BackupRequest};
use crate::state_store::SqliteStateStore;
use bridge_traits::engine::{EngineEvent, EngineRun, SyncEngine, SyncOptions};
use bridge_traits::notify::NotificationShell;
use bridge_traits::remote::RemoteStorage;
use bridge_traits::store::StateStore;
use core_accounts::{AccountHandle, AccountId, AccountManager};
use core_runtime::config::ClientConfig;
use core_runtime::events::{ProgressDispatcher, ProgressEvent};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

/// Orchestrator for backup requests arriving over the socket API.
pub struct BackupCoordinator {
    /// Account registry
    accounts: Arc<AccountManager>,

    /// Synchronization engine
    engine: Arc<dyn SyncEngine>,

    /// Remote storage connections by account
    remotes: Arc<RwLock<HashMap<AccountId, Arc<dyn RemoteStorage>>>>,

    /// Progress dispatcher for UI consumers
    dispatcher: Arc<ProgressDispatcher>,

    /// Status message fan-out
    reporter: Arc<OutcomeReporter>,

    /// Directory transient run databases are provisioned in
    state_dir: Option<PathBuf>,
}

impl BackupCoordinator {
    /// Create a coordinator with explicitly wired collaborators.
    pub fn new(
        accounts: Arc<AccountManager>,
        engine: Arc<dyn SyncEngine>,
        dispatcher: Arc<ProgressDispatcher>,
        notifications: Arc<dyn NotificationShell>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            engine,
            remotes: Arc::new(RwLock::new(HashMap::new())),
            dispatcher: Arc::clone(&dispatcher),
            reporter: Arc::new(OutcomeReporter::new(app_name, dispatcher, notifications)),
            state_dir: None,
        }
    }

    /// Create a coordinator wired from a [`ClientConfig`].
    pub fn from_config(
        config: &ClientConfig,
        accounts: Arc<AccountManager>,
        engine: Arc<dyn SyncEngine>,
    ) -> Self {
        let dispatcher = Arc::new(ProgressDispatcher::new(config.event_buffer_size));
        Self {
            accounts,
            engine,
            remotes: Arc::new(RwLock::new(HashMap::new())),
            dispatcher: Arc::clone(&dispatcher),
            reporter: Arc::new(OutcomeReporter::new(
                config.app_name.clone(),
                dispatcher,
                Arc::clone(&config.notifications),
            )),
            state_dir: Some(config.state_dir.clone()),
        }
    }

    /// The dispatcher runs publish progress through.
    pub fn dispatcher(&self) -> &Arc<ProgressDispatcher> {
        &self.dispatcher
    }

    /// Register the remote storage connection for an account.
    ///
    /// A request targeting an account without a registered connection fails
    /// with [`BackupError::NoConnection`].
    pub async fn register_remote(&self, account_id: AccountId, remote: Arc<dyn RemoteStorage>) {
        self.remotes.write().await.insert(account_id, remote);
        info!(account_id = %account_id, "Registered remote storage connection");
    }

    /// Admit a backup job and return its run id immediately.
    ///
    /// The run proceeds in the background; the outcome reaches the caller
    /// through the job's reply channel.
    pub fn start(&self, job: ApiJob) -> BackupRunId {
        let request = BackupRequest::from_payload(job.arguments());
        let run = BackupRun::new(request.local_path.clone(), request.remote_path.clone());
        let run_id = run.id;

        let coordinator = self.clone_for_task();
        tokio::spawn(async move {
            coordinator.run_backup(run, request, job).await;
        });

        run_id
    }

    /// Clone for the background run task (avoids `Arc<Arc<...>>`).
    fn clone_for_task(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            engine: Arc::clone(&self.engine),
            remotes: Arc::clone(&self.remotes),
            dispatcher: Arc::clone(&self.dispatcher),
            reporter: Arc::clone(&self.reporter),
            state_dir: self.state_dir.clone(),
        }
    }

    /// Drive one run to its terminal state.
    #[instrument(skip_all, fields(run_id = %run.id, local_path = %run.local_path))]
    async fn run_backup(&self, mut run: BackupRun, request: BackupRequest, mut job: ApiJob) {
        self.reporter
            .log_message(
                &run.local_path,
                &format!("Backup of {} started", run.local_path),
                true,
            )
            .await;

        match self.execute(&mut run, &request, &mut job).await {
            Ok(summary) => {
                self.reporter
                    .log_message(
                        &run.local_path,
                        &format!("Backup of {} succeeded", run.local_path),
                        true,
                    )
                    .await;
                info!(synced = summary.synced_files.len(), "Backup run completed");
                job.succeed(summary);
            }
            Err(err) => self.fail_run(&mut run, &mut job, err).await,
        }
    }

    async fn execute(
        &self,
        run: &mut BackupRun,
        request: &BackupRequest,
        job: &mut ApiJob,
    ) -> Result<BackupSummary> {
        run.begin_validation()?;

        let account = self.resolve_account(&request.account, job).await?;

        if !Path::new(&run.local_path).is_absolute() {
            return Err(BackupError::RelativeLocalPath);
        }

        let store = Arc::new(SqliteStateStore::create(self.state_dir.as_deref()).await?);
        let synced = self
            .sync_with_store(run, request, &account, Arc::clone(&store))
            .await;
        store.close().await;
        synced?;

        run.complete()?;
        Ok(BackupSummary {
            local_path: run.local_path.clone(),
            synced_files: run.synced_files.clone(),
        })
    }

    /// Everything between store provisioning and the terminal engine event.
    ///
    /// Split out so the store is closed on every exit path of [`execute`].
    async fn sync_with_store(
        &self,
        run: &mut BackupRun,
        request: &BackupRequest,
        account: &AccountHandle,
        store: Arc<SqliteStateStore>,
    ) -> Result<()> {
        let mut options = SyncOptions::default();
        options
            .set_file_pattern(&request.file_pattern)
            .map_err(|e| BackupError::InvalidPattern(e.to_string()))?;
        for exclude in &request.exclude_patterns {
            options.add_manual_exclude(exclude);
        }

        let remote = self
            .remote_for(account)
            .await
            .ok_or_else(|| BackupError::NoConnection(account.display_name.clone()))?;

        run.directory_pending()?;

        // Create the remote directory; an existing one is a hard conflict,
        // never a destination to merge into.
        match remote.create_folder(&run.remote_path).await {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                return Err(BackupError::DestinationExists(run.remote_path.clone()));
            }
            Err(err) => return Err(BackupError::Remote(err.message)),
        }

        let engine_run = EngineRun {
            local_root: PathBuf::from(with_trailing_separator(&run.local_path)),
            remote_root: run.remote_path.clone(),
            store: store as Arc<dyn StateStore>,
            options,
        };

        let mut events = self
            .engine
            .start(engine_run)
            .await
            .map_err(|e| BackupError::Engine(e.to_string()))?;

        run.syncing()?;

        loop {
            match events.recv().await {
                Some(EngineEvent::Progress(info)) => {
                    let _ = self.dispatcher.emit(ProgressEvent::Sync {
                        local_path: run.local_path.clone(),
                        info,
                    });
                }
                Some(EngineEvent::ItemCompleted(item)) => {
                    run.record_item(item.file)?;
                }
                Some(EngineEvent::Error { message, .. }) => {
                    return Err(BackupError::Engine(message));
                }
                Some(EngineEvent::Finished { ok: true }) => return Ok(()),
                Some(EngineEvent::Finished { ok: false }) => {
                    return Err(BackupError::Incomplete);
                }
                None => return Err(BackupError::EngineStopped),
            }
        }
    }

    /// Resolve the request's account selector against the registry.
    ///
    /// A present uuid wins outright; the name is only consulted when no uuid
    /// was submitted, and doing so raises a deprecation warning on the job.
    async fn resolve_account(
        &self,
        selector: &AccountSelector,
        job: &mut ApiJob,
    ) -> Result<AccountHandle> {
        let account = match selector.uuid {
            Some(uuid) => self.accounts.account_by_id(uuid).await,
            None => {
                job.set_warning(
                    "Using the name as identifier is deprecated, please use the uuid",
                );
                self.accounts.account_by_name(&selector.name).await
            }
        };

        account.ok_or_else(|| BackupError::AccountNotFound(selector.raw_json()))
    }

    async fn remote_for(&self, account: &AccountHandle) -> Option<Arc<dyn RemoteStorage>> {
        self.remotes.read().await.get(&account.id).cloned()
    }

    /// Settle a failed run: one status message, one failure reply.
    async fn fail_run(&self, run: &mut BackupRun, job: &mut ApiJob, err: BackupError) {
        let message = err.to_string();

        if let Err(state_err) = run.fail(message.clone()) {
            error!(error = %state_err, "Run already terminal while failing");
        }

        self.reporter
            .log_message(
                &run.local_path,
                &format!("Backup of {} failed with: {}", run.local_path, message),
                false,
            )
            .await;
        job.fail(message);
    }
}

/// Engine roots always carry a trailing separator.
fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
