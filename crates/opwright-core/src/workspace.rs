//! Workspace - the engine's entry point
//!
//! A [`Workspace`] owns one project's engine state: configuration, session
//! manager, orchestrator, status machine and command history. Responses are
//! handed over either complete ([`Workspace::apply`]) or as a chunk stream
//! ([`Workspace::process_stream`]); directives are only parsed from the
//! complete text. One batch at a time is applied per workspace.

use crate::batch::OperationBatch;
use crate::config::{ConfigStore, ConfigUpdate, EngineConfig};
use crate::directive::extract;
use crate::error::{Error, Result};
use crate::orchestrator::{Collaborators, Orchestrator};
use crate::reporter::{CommandHistory, EngineEvent, EventBus, Reporter};
use crate::results::ExecutionResults;
use crate::sanitize::sanitize;
use crate::status::{InteractionStatus, StatusEvent, StatusMachine, DEFAULT_ERROR_RESET_DELAY};
use futures::{Stream, StreamExt};
use opwright_tools::{SessionManager, TerminalEvent};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Workspace settings not covered by [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    /// Time spent in the error state before returning to idle
    pub error_reset_delay: Duration,
    /// Event bus capacity
    pub event_capacity: usize,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            error_reset_delay: DEFAULT_ERROR_RESET_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Result of applying one response.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedResponse {
    /// Directives extracted from the response
    pub batch: OperationBatch,
    /// Per-domain results
    pub results: ExecutionResults,
    /// Response text with directives replaced by labels
    pub display_text: String,
}

/// Engine state for one project.
pub struct Workspace {
    store: Arc<ConfigStore>,
    sessions: Arc<SessionManager>,
    orchestrator: Orchestrator,
    status: StatusMachine,
    bus: EventBus,
    history: Arc<CommandHistory>,
    applying: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl Workspace {
    /// Open a workspace over `collaborators`.
    ///
    /// Must be called within a tokio runtime: terminal output forwarding
    /// runs as a background task until [`Workspace::close`].
    #[must_use]
    pub fn open(store: Arc<ConfigStore>, collaborators: Collaborators, options: WorkspaceOptions) -> Self {
        let config = store.snapshot();
        let sessions = Arc::new(SessionManager::new(collaborators.terminal.clone()));
        let bus = EventBus::new(options.event_capacity);
        let history = Arc::new(CommandHistory::new());
        let reporter = Reporter::new(bus.clone(), history.clone());
        let orchestrator = Orchestrator::new(store.clone(), sessions.clone(), &collaborators, reporter);
        let status = StatusMachine::new(bus.clone(), options.error_reset_delay);

        let cancel = CancellationToken::new();
        let forwarder = spawn_output_forwarder(&sessions, bus.clone(), cancel.clone());

        info!(project = %config.project_path.display(), "Workspace opened");
        Self {
            store,
            sessions,
            orchestrator,
            status,
            bus,
            history,
            applying: tokio::sync::Mutex::new(()),
            cancel,
            forwarder: Mutex::new(Some(forwarder)),
        }
    }

    /// Extract and execute the directives of a complete response.
    ///
    /// Fails with [`Error::Busy`] while another batch is being applied.
    pub async fn apply(&self, text: &str) -> Result<AppliedResponse> {
        let _guard = self.applying.try_lock().map_err(|_| Error::Busy)?;
        self.status.transition(StatusEvent::Apply)?;
        Ok(self.apply_complete(text).await)
    }

    /// Accumulate a streamed response, then execute its directives.
    ///
    /// Nothing executes until the stream ends. A stream error moves the
    /// status to error and drops the partial text.
    pub async fn process_stream<S, E>(&self, stream: S) -> Result<AppliedResponse>
    where
        S: Stream<Item = std::result::Result<String, E>>,
        E: fmt::Display,
    {
        let _guard = self.applying.try_lock().map_err(|_| Error::Busy)?;
        self.status.transition(StatusEvent::Send)?;

        let mut text = String::new();
        let mut received_token = false;
        futures::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    if !received_token && !chunk.is_empty() {
                        self.status.transition(StatusEvent::FirstToken)?;
                        received_token = true;
                    }
                    text.push_str(&chunk);
                }
                Err(e) => {
                    warn!(error = %e, received = text.len(), "Response stream failed");
                    self.status.fail();
                    return Err(Error::Stream(e.to_string()));
                }
            }
        }
        debug!(bytes = text.len(), "Response stream complete");

        self.status.transition(StatusEvent::StreamComplete)?;
        Ok(self.apply_complete(&text).await)
    }

    async fn apply_complete(&self, text: &str) -> AppliedResponse {
        let batch = extract(text);
        let results = self.orchestrator.execute(&batch).await;
        if let Err(e) = self.status.transition(StatusEvent::AllResolved) {
            warn!(error = %e, "Status not reset after batch");
        }
        AppliedResponse {
            batch,
            results,
            display_text: sanitize(text),
        }
    }

    /// Current interaction status
    #[must_use]
    pub fn status(&self) -> InteractionStatus {
        self.status.current()
    }

    /// Receiver notified on status changes
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<InteractionStatus> {
        self.status.watch()
    }

    /// Subscribe to engine events
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Commands executed so far
    #[must_use]
    pub fn history(&self) -> &Arc<CommandHistory> {
        &self.history
    }

    /// Session manager
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.store.snapshot()
    }

    /// Update and persist the configuration; applies from the next directive
    pub fn update_config(&self, update: ConfigUpdate) -> Result<EngineConfig> {
        self.store.update(update)
    }

    /// Stop every named process and the output forwarder
    pub async fn close(&self) {
        self.sessions.shutdown().await;
        self.cancel.cancel();
        let handle = self
            .forwarder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Output forwarder ended abnormally");
            }
        }
        info!("Workspace closed");
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("status", &self.status.current())
            .field("config", &self.store)
            .finish_non_exhaustive()
    }
}

/// Republish terminal output on the engine bus
fn spawn_output_forwarder(
    sessions: &SessionManager,
    bus: EventBus,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut events = sessions.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(TerminalEvent::Output { session_id, data }) => {
                        bus.publish(EngineEvent::TerminalOutput { session_id, data });
                    }
                    Ok(TerminalEvent::Exit { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Terminal output forwarding lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!("Output forwarder stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use crate::testing::{MemoryFileStore, RecordingDeployBackend, RecordingGitBackend};
    use opwright_tools::session::testing::ScriptedTerminalRunner;

    fn open(runner: ScriptedTerminalRunner, config: EngineConfig) -> (Workspace, Arc<MemoryFileStore>) {
        let files = Arc::new(MemoryFileStore::new());
        let collaborators = Collaborators {
            terminal: Arc::new(runner),
            files: files.clone(),
            git: Arc::new(RecordingGitBackend::new()),
            deploy: Arc::new(RecordingDeployBackend::new()),
        };
        let store = Arc::new(ConfigStore::in_memory(config));
        let options = WorkspaceOptions {
            error_reset_delay: Duration::from_millis(30),
            ..WorkspaceOptions::default()
        };
        (Workspace::open(store, collaborators, options), files)
    }

    fn permissive() -> EngineConfig {
        EngineConfig {
            permissions: PermissionSet::all(),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_apply_executes_and_sanitizes() {
        let (ws, files) = open(ScriptedTerminalRunner::new(), permissive());
        let text = r#"Here you go: <file_create path="a.txt">hello</file_create>"#;

        let applied = ws.apply(text).await.unwrap();

        assert_eq!(applied.batch.len(), 1);
        assert!(applied.results.file[0].success);
        assert_eq!(applied.display_text, "Here you go: [Creating file]");
        assert_eq!(files.read("a.txt").as_deref(), Some("hello"));
        assert_eq!(ws.status(), InteractionStatus::Idle);
        ws.close().await;
    }

    #[tokio::test]
    async fn test_stream_parsed_only_when_complete() {
        let (ws, files) = open(ScriptedTerminalRunner::new(), permissive());
        let mut status = ws.watch_status();
        let chunks = vec![
            Ok::<_, std::io::Error>("Creating <file_cr".to_string()),
            Ok(r#"eate path="b.txt">par"#.to_string()),
            Ok("tial</file_create> done".to_string()),
        ];

        let applied = ws.process_stream(futures::stream::iter(chunks)).await.unwrap();

        assert_eq!(files.read("b.txt").as_deref(), Some("partial"));
        assert_eq!(applied.display_text, "Creating [Creating file] done");
        assert_eq!(ws.status(), InteractionStatus::Idle);
        assert!(status.has_changed().unwrap());
        ws.close().await;
    }

    #[tokio::test]
    async fn test_stream_error_enters_error_state() {
        let (ws, files) = open(ScriptedTerminalRunner::new(), permissive());
        let chunks = vec![
            Ok(r#"<file_create path="c.txt">x</file_create>"#.to_string()),
            Err("connection reset"),
        ];

        let err = ws.process_stream(futures::stream::iter(chunks)).await.unwrap_err();

        assert!(matches!(err, Error::Stream(ref m) if m == "connection reset"));
        assert_eq!(ws.status(), InteractionStatus::Error);
        assert!(files.read("c.txt").is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(ws.status(), InteractionStatus::Idle);
        ws.close().await;
    }

    #[tokio::test]
    async fn test_second_batch_rejected_while_applying() {
        let mut config = permissive();
        config.command_timeout_secs = 1;
        let (ws, _) = open(ScriptedTerminalRunner::new().with_hang("sleep 60"), config);
        let ws = Arc::new(ws);

        let first = {
            let ws = ws.clone();
            tokio::spawn(async move { ws.apply(r#"<terminal_run command="sleep 60"/>"#).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = ws.apply(r#"<git_status/>"#).await;
        assert!(matches!(second, Err(Error::Busy)));

        let applied = first.await.unwrap().unwrap();
        assert!(!applied.results.terminal[0].success);
        assert!(ws.apply(r#"<git_status/>"#).await.is_ok());
        ws.close().await;
    }

    #[tokio::test]
    async fn test_terminal_output_forwarded() {
        let (ws, _) = open(
            ScriptedTerminalRunner::new().with_exit("echo hi", "hi\n", 0),
            permissive(),
        );
        let mut events = ws.subscribe();

        ws.apply(r#"<terminal_run command="echo hi"/>"#).await.unwrap();

        let forwarded = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(EngineEvent::TerminalOutput { data, .. }) = events.recv().await {
                    return data;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(forwarded, b"hi\n".to_vec());
        assert_eq!(ws.history().len(), 1);
        ws.close().await;
    }

    #[tokio::test]
    async fn test_close_stops_named_processes() {
        let (ws, _) = open(ScriptedTerminalRunner::new(), permissive());
        ws.apply(r#"<terminal_start name="api" command="npm run api"/>"#)
            .await
            .unwrap();
        assert!(ws.sessions().named_session("api").is_some());

        ws.close().await;
        assert!(ws.sessions().list_named().is_empty());
    }
}
