//! Integration tests for the backup job orchestration
//!
//! These tests drive the complete flow with scripted collaborators:
//! - Success path with ordered synced-file accumulation
//! - Remote path normalization
//! - Account resolution (uuid preference, name deprecation, not-found echo)
//! - Conflict and transport failures of the remote directory step
//! - Engine error, incomplete-run, and unexpected-termination outcomes
//! - Side-effect ordering (nothing provisioned before validation passes)

use bridge_traits::engine::{
    EngineEvent, EngineRun, ErrorCategory, ProgressInfo, SyncEngine, SyncItem,
};
use bridge_traits::notify::{MessageIcon, NotificationShell};
use bridge_traits::remote::{RemoteDirError, RemoteStorage, STATUS_FOLDER_EXISTS};
use core_accounts::{Account, AccountHandle, AccountManager};
use core_backup::{ApiJob, BackupCoordinator, JobOutcome, JobReply};
use core_runtime::config::ClientConfig;
use core_runtime::events::{ProgressDispatcher, ProgressEvent};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use uuid::Uuid;

// ============================================================================
// Mock Implementations
// ============================================================================

/// What the scripted engine saw when it was started.
struct CapturedRun {
    local_root: PathBuf,
    remote_root: String,
    excludes: Vec<String>,
    has_pattern: bool,
    store_location: PathBuf,
}

/// Engine that replays a scripted event sequence.
struct ScriptedEngine {
    script: AsyncMutex<Vec<EngineEvent>>,
    starts: AsyncMutex<Vec<CapturedRun>>,
}

impl ScriptedEngine {
    fn new(script: Vec<EngineEvent>) -> Self {
        Self {
            script: AsyncMutex::new(script),
            starts: AsyncMutex::new(Vec::new()),
        }
    }

    async fn start_count(&self) -> usize {
        self.starts.lock().await.len()
    }

    async fn captured(&self) -> Vec<CapturedRun> {
        std::mem::take(&mut *self.starts.lock().await)
    }
}

#[async_trait::async_trait]
impl SyncEngine for ScriptedEngine {
    async fn start(
        &self,
        run: EngineRun,
    ) -> bridge_traits::error::Result<mpsc::Receiver<EngineEvent>> {
        self.starts.lock().await.push(CapturedRun {
            local_root: run.local_root.clone(),
            remote_root: run.remote_root.clone(),
            excludes: run.options.manual_excludes().to_vec(),
            has_pattern: run.options.file_pattern().is_some(),
            store_location: run.store.location().to_path_buf(),
        });

        let (sender, receiver) = mpsc::channel(64);
        for event in self.script.lock().await.drain(..) {
            sender.send(event).await.expect("script fits the buffer");
        }
        Ok(receiver)
    }
}

/// Engine that delivers some events and then drops the channel without a
/// terminal event.
struct VanishingEngine;

#[async_trait::async_trait]
impl SyncEngine for VanishingEngine {
    async fn start(
        &self,
        _run: EngineRun,
    ) -> bridge_traits::error::Result<mpsc::Receiver<EngineEvent>> {
        let (sender, receiver) = mpsc::channel(8);
        sender
            .send(EngineEvent::Progress(ProgressInfo::default()))
            .await
            .expect("buffer holds one event");
        Ok(receiver)
    }
}

#[derive(Clone)]
enum RemoteResponse {
    Ok,
    Conflict,
    Error(String),
}

/// Remote storage double recording every directory-creation call.
struct MockRemote {
    response: RemoteResponse,
    calls: AsyncMutex<Vec<String>>,
}

impl MockRemote {
    fn new(response: RemoteResponse) -> Self {
        Self {
            response,
            calls: AsyncMutex::new(Vec::new()),
        }
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl RemoteStorage for MockRemote {
    async fn create_folder(&self, path: &str) -> Result<(), RemoteDirError> {
        self.calls.lock().await.push(path.to_string());
        match &self.response {
            RemoteResponse::Ok => Ok(()),
            RemoteResponse::Conflict => Err(RemoteDirError::new(
                STATUS_FOLDER_EXISTS,
                "Method Not Allowed",
            )),
            RemoteResponse::Error(message) => Err(RemoteDirError::new(503, message.clone())),
        }
    }
}

/// Notification shell double recording every transient message.
#[derive(Default)]
struct RecordingShell {
    messages: AsyncMutex<Vec<(String, String, MessageIcon)>>,
}

impl RecordingShell {
    async fn messages(&self) -> Vec<(String, String, MessageIcon)> {
        self.messages.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationShell for RecordingShell {
    async fn show_transient_message(&self, title: &str, body: &str, icon: MessageIcon) {
        self.messages
            .lock()
            .await
            .push((title.to_string(), body.to_string(), icon));
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    coordinator: BackupCoordinator,
    accounts: Arc<AccountManager>,
    account: AccountHandle,
    engine: Arc<ScriptedEngine>,
    remote: Arc<MockRemote>,
    shell: Arc<RecordingShell>,
}

async fn harness(script: Vec<EngineEvent>, remote_response: RemoteResponse) -> Harness {
    let accounts = Arc::new(AccountManager::new());
    let account = accounts
        .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
        .await
        .unwrap();

    let engine = Arc::new(ScriptedEngine::new(script));
    let remote = Arc::new(MockRemote::new(remote_response));
    let shell = Arc::new(RecordingShell::default());
    let dispatcher = Arc::new(ProgressDispatcher::new(64));

    let coordinator = BackupCoordinator::new(
        Arc::clone(&accounts),
        Arc::clone(&engine) as Arc<dyn SyncEngine>,
        dispatcher,
        Arc::clone(&shell) as Arc<dyn NotificationShell>,
        "File Sync",
    );
    coordinator
        .register_remote(account.id, Arc::clone(&remote) as Arc<dyn RemoteStorage>)
        .await;

    Harness {
        coordinator,
        accounts,
        account,
        engine,
        remote,
        shell,
    }
}

fn payload_for(account_uuid: Option<Uuid>) -> Value {
    let account = match account_uuid {
        Some(uuid) => json!({ "name": "work", "uuid": uuid.to_string() }),
        None => json!({ "name": "work" }),
    };
    json!({
        "localPath": "/home/user/docs",
        "remotePath": "/backup",
        "pattern": "",
        "excludes": [],
        "account": account,
    })
}

async fn run_job(coordinator: &BackupCoordinator, payload: Value) -> JobReply {
    let (job, reply) = ApiJob::new(payload);
    coordinator.start(job);
    tokio::time::timeout(Duration::from_secs(5), reply)
        .await
        .expect("run reached a terminal state")
        .expect("a reply was delivered")
}

fn failure_message(reply: &JobReply) -> &str {
    match &reply.outcome {
        JobOutcome::Failure(message) => message,
        JobOutcome::Success(_) => panic!("expected a failure, got success"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn successful_backup_reports_synced_files_in_arrival_order() {
    let script = vec![
        EngineEvent::Progress(ProgressInfo {
            files_total: 3,
            ..ProgressInfo::default()
        }),
        EngineEvent::ItemCompleted(SyncItem {
            file: "photos/a.jpg".to_string(),
            size: Some(100),
        }),
        EngineEvent::ItemCompleted(SyncItem {
            file: "docs/b.txt".to_string(),
            size: Some(20),
        }),
        // Duplicates are reported as-is; nothing deduplicates them.
        EngineEvent::ItemCompleted(SyncItem {
            file: "photos/a.jpg".to_string(),
            size: Some(100),
        }),
        EngineEvent::Finished { ok: true },
    ];
    let harness = harness(script, RemoteResponse::Ok).await;
    let mut events = harness.coordinator.dispatcher().subscribe();

    let uuid = harness.account.id.into();
    let reply = run_job(&harness.coordinator, payload_for(Some(uuid))).await;

    match reply.outcome {
        JobOutcome::Success(summary) => {
            assert_eq!(summary.local_path, "/home/user/docs");
            assert_eq!(
                summary.synced_files,
                vec!["photos/a.jpg", "docs/b.txt", "photos/a.jpg"]
            );
        }
        JobOutcome::Failure(message) => panic!("backup failed: {}", message),
    }
    assert!(reply.warnings.is_empty());

    let captured = harness.engine.captured().await;
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].local_root, PathBuf::from("/home/user/docs/"));
    assert!(captured[0].local_root.to_string_lossy().ends_with('/'));
    assert_eq!(captured[0].remote_root, "/backup");
    assert!(!captured[0].has_pattern);
    assert!(captured[0].store_location.to_string_lossy().contains("sync_journal"));

    // One progress forward, plus the started/succeeded status records.
    let mut sync_events = 0;
    let mut item_events = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::Sync { local_path, .. } => {
                assert_eq!(local_path, "/home/user/docs");
                sync_events += 1;
            }
            ProgressEvent::Item { local_path, .. } => {
                assert_eq!(local_path, "/home/user/docs");
                item_events += 1;
            }
        }
    }
    assert_eq!(sync_events, 1);
    assert_eq!(item_events, 2);

    let messages = harness.shell.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, "File Sync backup");
    assert!(messages[0].1.contains("started"));
    assert!(messages[1].1.contains("succeeded"));
    assert_eq!(messages[1].2, MessageIcon::Default);
}

#[tokio::test]
async fn remote_path_without_separator_is_normalized_before_use() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let mut payload = payload_for(Some(harness.account.id.into()));
    payload["remotePath"] = json!("backup");
    let reply = run_job(&harness.coordinator, payload).await;

    assert!(matches!(reply.outcome, JobOutcome::Success(_)));
    assert_eq!(harness.remote.calls().await, vec!["/backup"]);
}

#[tokio::test]
async fn uuid_selector_wins_even_when_the_name_matches_another_account() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    // A second account whose display name the payload will carry.
    harness
        .accounts
        .add_account(Account::new("decoy", "https://other.example.com", "other"))
        .await
        .unwrap();

    let mut payload = payload_for(Some(harness.account.id.into()));
    payload["account"]["name"] = json!("decoy");
    let reply = run_job(&harness.coordinator, payload).await;

    // Resolved via uuid: no deprecation warning, and the run used the uuid
    // account's remote (the decoy has none registered).
    assert!(matches!(reply.outcome, JobOutcome::Success(_)));
    assert!(reply.warnings.is_empty());
}

#[tokio::test]
async fn unknown_uuid_fails_without_falling_back_to_the_name() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let mut payload = payload_for(Some(Uuid::new_v4()));
    payload["account"]["name"] = json!("work"); // resolvable, but must not be used
    let reply = run_job(&harness.coordinator, payload).await;

    assert!(failure_message(&reply).starts_with("Failed to find"));
    assert!(reply.warnings.is_empty());
    assert_eq!(harness.engine.start_count().await, 0);
}

#[tokio::test]
async fn name_only_selector_resolves_with_a_deprecation_warning() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let reply = run_job(&harness.coordinator, payload_for(None)).await;

    assert!(matches!(reply.outcome, JobOutcome::Success(_)));
    assert_eq!(
        reply.warnings,
        vec!["Using the name as identifier is deprecated, please use the uuid"]
    );
}

#[tokio::test]
async fn unresolvable_account_failure_echoes_the_submitted_payload() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let mut payload = payload_for(None);
    payload["account"]["name"] = json!("ghost");
    let reply = run_job(&harness.coordinator, payload).await;

    let message = failure_message(&reply);
    assert!(message.starts_with("Failed to find"));
    assert!(message.contains("ghost"));
    assert_eq!(harness.engine.start_count().await, 0);
    assert!(harness.remote.calls().await.is_empty());
}

#[tokio::test]
async fn existing_destination_aborts_before_the_engine_starts() {
    let harness = harness(
        vec![EngineEvent::Finished { ok: true }],
        RemoteResponse::Conflict,
    )
    .await;
    let mut events = harness.coordinator.dispatcher().subscribe();

    let mut payload = payload_for(Some(harness.account.id.into()));
    payload["remotePath"] = json!("backup");
    let reply = run_job(&harness.coordinator, payload).await;

    assert_eq!(
        failure_message(&reply),
        "Destination /backup already exists"
    );
    assert_eq!(harness.engine.start_count().await, 0);

    // No progress or item signals from an engine that never ran.
    while let Ok(event) = events.try_recv() {
        assert!(matches!(event, ProgressEvent::Item { .. }));
    }

    let messages = harness.shell.messages().await;
    assert_eq!(messages.len(), 2);
    assert!(messages[1].1.contains("failed with: Destination /backup already exists"));
    assert_eq!(messages[1].2, MessageIcon::SyncError);
}

#[tokio::test]
async fn remote_transport_error_is_forwarded_verbatim() {
    let harness = harness(
        vec![EngineEvent::Finished { ok: true }],
        RemoteResponse::Error("503 Service Unavailable".to_string()),
    )
    .await;

    let reply = run_job(
        &harness.coordinator,
        payload_for(Some(harness.account.id.into())),
    )
    .await;

    assert_eq!(failure_message(&reply), "503 Service Unavailable");
    assert_eq!(harness.engine.start_count().await, 0);
}

#[tokio::test]
async fn invalid_file_pattern_fails_with_the_regex_diagnostic() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let mut payload = payload_for(Some(harness.account.id.into()));
    payload["pattern"] = json!("[unclosed");
    let reply = run_job(&harness.coordinator, payload).await;

    assert!(failure_message(&reply).contains("unclosed"));
    assert!(harness.remote.calls().await.is_empty());
    assert_eq!(harness.engine.start_count().await, 0);
}

#[tokio::test]
async fn excludes_are_handed_to_the_engine_in_order() {
    let harness = harness(vec![EngineEvent::Finished { ok: true }], RemoteResponse::Ok).await;

    let mut payload = payload_for(Some(harness.account.id.into()));
    payload["excludes"] = json!([".cache", "node_modules"]);
    payload["pattern"] = json!(r"\.txt$");
    let reply = run_job(&harness.coordinator, payload).await;

    assert!(matches!(reply.outcome, JobOutcome::Success(_)));
    let captured = harness.engine.captured().await;
    assert_eq!(captured[0].excludes, vec![".cache", "node_modules"]);
    assert!(captured[0].has_pattern);
}

#[tokio::test]
async fn engine_error_fails_the_run_with_its_message() {
    let script = vec![
        EngineEvent::Progress(ProgressInfo::default()),
        EngineEvent::Error {
            message: "Remote quota exceeded".to_string(),
            category: ErrorCategory::RemoteStorage,
        },
    ];
    let harness = harness(script, RemoteResponse::Ok).await;

    let reply = run_job(
        &harness.coordinator,
        payload_for(Some(harness.account.id.into())),
    )
    .await;

    assert_eq!(failure_message(&reply), "Remote quota exceeded");
}

#[tokio::test]
async fn finished_not_ok_never_produces_a_success_reply() {
    let script = vec![
        EngineEvent::ItemCompleted(SyncItem {
            file: "a.txt".to_string(),
            size: None,
        }),
        EngineEvent::Finished { ok: false },
    ];
    let harness = harness(script, RemoteResponse::Ok).await;

    let reply = run_job(
        &harness.coordinator,
        payload_for(Some(harness.account.id.into())),
    )
    .await;

    assert_eq!(
        failure_message(&reply),
        "Backup did not complete successfully"
    );

    // One started message, one failed message, nothing claiming success.
    let messages = harness.shell.messages().await;
    assert_eq!(messages.len(), 2);
    assert!(!messages.iter().any(|(_, body, _)| body.contains("succeeded")));
}

#[tokio::test]
async fn engine_vanishing_without_a_terminal_event_fails_the_run() {
    let accounts = Arc::new(AccountManager::new());
    let account = accounts
        .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
        .await
        .unwrap();
    let shell = Arc::new(RecordingShell::default());
    let remote = Arc::new(MockRemote::new(RemoteResponse::Ok));

    let coordinator = BackupCoordinator::new(
        accounts,
        Arc::new(VanishingEngine) as Arc<dyn SyncEngine>,
        Arc::new(ProgressDispatcher::new(64)),
        Arc::clone(&shell) as Arc<dyn NotificationShell>,
        "File Sync",
    );
    coordinator
        .register_remote(account.id, remote as Arc<dyn RemoteStorage>)
        .await;

    let reply = run_job(&coordinator, payload_for(Some(account.id.into()))).await;
    assert_eq!(
        failure_message(&reply),
        "Sync engine terminated unexpectedly"
    );
}

#[tokio::test]
async fn relative_local_path_fails_before_any_side_effect() {
    let accounts = Arc::new(AccountManager::new());
    let account = accounts
        .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
        .await
        .unwrap();
    let engine = Arc::new(ScriptedEngine::new(vec![EngineEvent::Finished { ok: true }]));
    let remote = Arc::new(MockRemote::new(RemoteResponse::Ok));
    let shell = Arc::new(RecordingShell::default());

    // Route transient databases into an observable directory.
    let state_dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::builder()
        .state_dir(state_dir.path())
        .app_name("File Sync")
        .notifications(Arc::clone(&shell) as Arc<dyn NotificationShell>)
        .build()
        .unwrap();

    let coordinator = BackupCoordinator::from_config(
        &config,
        accounts,
        Arc::clone(&engine) as Arc<dyn SyncEngine>,
    );
    coordinator
        .register_remote(account.id, Arc::clone(&remote) as Arc<dyn RemoteStorage>)
        .await;

    let mut payload = payload_for(Some(account.id.into()));
    payload["localPath"] = json!("relative/dir");
    let reply = run_job(&coordinator, payload).await;

    assert_eq!(
        failure_message(&reply),
        "Local path must be an absolute path"
    );
    assert!(remote.calls().await.is_empty());
    assert_eq!(engine.start_count().await, 0);
    assert_eq!(std::fs::read_dir(state_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn transient_database_is_removed_after_a_successful_run() {
    let accounts = Arc::new(AccountManager::new());
    let account = accounts
        .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
        .await
        .unwrap();
    let engine = Arc::new(ScriptedEngine::new(vec![EngineEvent::Finished { ok: true }]));
    let remote = Arc::new(MockRemote::new(RemoteResponse::Ok));
    let shell = Arc::new(RecordingShell::default());

    let state_dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::builder()
        .state_dir(state_dir.path())
        .notifications(Arc::clone(&shell) as Arc<dyn NotificationShell>)
        .build()
        .unwrap();

    let coordinator = BackupCoordinator::from_config(
        &config,
        accounts,
        Arc::clone(&engine) as Arc<dyn SyncEngine>,
    );
    coordinator
        .register_remote(account.id, Arc::clone(&remote) as Arc<dyn RemoteStorage>)
        .await;

    let reply = run_job(&coordinator, payload_for(Some(account.id.into()))).await;
    assert!(matches!(reply.outcome, JobOutcome::Success(_)));

    // The run provisioned its journal inside state_dir and cleaned it up.
    let captured = engine.captured().await;
    assert_eq!(captured[0].store_location.parent().unwrap(), state_dir.path());
    assert_eq!(std::fs::read_dir(state_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn account_without_a_registered_connection_fails() {
    let accounts = Arc::new(AccountManager::new());
    let account = accounts
        .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
        .await
        .unwrap();
    let engine = Arc::new(ScriptedEngine::new(vec![EngineEvent::Finished { ok: true }]));
    let shell = Arc::new(RecordingShell::default());

    let coordinator = BackupCoordinator::new(
        accounts,
        Arc::clone(&engine) as Arc<dyn SyncEngine>,
        Arc::new(ProgressDispatcher::new(64)),
        Arc::clone(&shell) as Arc<dyn NotificationShell>,
        "File Sync",
    );
    // No register_remote call for this account.

    let reply = run_job(&coordinator, payload_for(Some(account.id.into()))).await;
    assert!(failure_message(&reply).contains("No connection available"));
    assert_eq!(engine.start_count().await, 0);
}
