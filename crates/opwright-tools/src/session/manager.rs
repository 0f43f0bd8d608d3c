//! Session Manager
//!
//! Sits on top of a [`TerminalRunner`] and provides two execution styles:
//! - Ephemeral commands: one session per command, closed when the command
//!   exits or its timeout elapses
//! - Named processes: long-running sessions (dev servers, watchers) tracked
//!   under a caller-chosen name, at most one live session per name

use super::output::{strip_input_echo, OutputCapture};
use super::runner::{Session, SessionOptions, TerminalCommandResult, TerminalEvent, TerminalRunner};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Per-command limits for ephemeral commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLimits {
    /// Time allowed before the session is force-closed
    pub timeout: Duration,
    /// Cap on captured output
    pub max_output_bytes: usize,
}

impl CommandLimits {
    /// Limits with `timeout` and the default output cap
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NamedSlot {
    /// Reserved while the session is being created
    Starting(Uuid),
    /// Bound to a live session id
    Running(String),
}

#[derive(Debug)]
struct NamedEntry {
    slot: NamedSlot,
    command: String,
    started_at: DateTime<Utc>,
}

/// A registered named process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedProcess {
    /// Caller-chosen name
    pub name: String,
    /// Session id, absent while the session is still starting
    pub session_id: Option<String>,
    /// Command written to the session
    pub command: String,
    /// Registration time
    pub started_at: DateTime<Utc>,
}

/// Creates, drives and tracks terminal sessions.
pub struct SessionManager {
    runner: Arc<dyn TerminalRunner>,
    named: DashMap<String, NamedEntry>,
}

impl SessionManager {
    /// Create a manager over the given runner
    #[must_use]
    pub fn new(runner: Arc<dyn TerminalRunner>) -> Self {
        Self {
            runner,
            named: DashMap::new(),
        }
    }

    // ── Raw session operations ───────────────────────────────────────────

    /// Create a session in `cwd` (runner default when absent)
    pub async fn create(&self, cwd: Option<PathBuf>) -> Result<Session> {
        let opts = SessionOptions {
            cwd,
            ..SessionOptions::default()
        };
        self.runner.create_session(opts).await
    }

    /// Write raw input to a session
    pub async fn write(&self, session_id: &str, data: &str) -> Result<()> {
        self.runner.write(session_id, data).await
    }

    /// Resize a session's terminal
    pub async fn resize(&self, session_id: &str, cols: u16, rows: u16) -> Result<()> {
        self.runner.resize(session_id, cols, rows).await
    }

    /// Close a session
    pub async fn close(&self, session_id: &str) -> Result<()> {
        self.runner.close(session_id).await
    }

    /// Subscribe to output and exit events of all sessions
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TerminalEvent> {
        self.runner.subscribe()
    }

    // ── Ephemeral commands ───────────────────────────────────────────────

    /// Run `command` in a fresh session and wait for it to exit.
    ///
    /// On timeout the session is force-closed and the result is a failure
    /// with a timeout marker appended to the output. Errors are returned
    /// only when the session could not be created or written to.
    pub async fn execute_command(
        &self,
        command: &str,
        cwd: Option<&Path>,
        limits: CommandLimits,
    ) -> Result<TerminalCommandResult> {
        let CommandLimits {
            timeout,
            max_output_bytes,
        } = limits;
        let start = Instant::now();

        // Subscribe before the session exists so no early output is missed
        let mut events = self.runner.subscribe();
        let session = self.create(cwd.map(Path::to_path_buf)).await?;

        let script = format!("{}\nexit $?\n", command);
        if let Err(e) = self.runner.write(&session.id, &script).await {
            let _ = self.runner.close(&session.id).await;
            return Err(e);
        }
        debug!(session_id = %session.id, command = %command, "Command dispatched");

        let mut capture = OutputCapture::new(max_output_bytes);
        let waited = tokio::time::timeout(timeout, async {
            loop {
                match events.recv().await {
                    Ok(TerminalEvent::Output { session_id, data }) if session_id == session.id => {
                        capture.push(&data);
                    }
                    Ok(TerminalEvent::Exit { session_id, code }) if session_id == session.id => {
                        return Some(code);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(session_id = %session.id, skipped, "Terminal events lagged, output incomplete");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let truncated = capture.truncated();
        let mut output = strip_input_echo(&capture.into_text(), &script);

        let result = match waited {
            Ok(Some(code)) => TerminalCommandResult {
                success: code == 0,
                command: command.to_string(),
                output,
                exit_code: Some(code),
                duration_ms,
                truncated,
            },
            Ok(None) => TerminalCommandResult {
                success: false,
                command: command.to_string(),
                output: format!("{}\n[terminal host shut down]", output),
                exit_code: None,
                duration_ms,
                truncated,
            },
            Err(_) => {
                if let Err(e) = self.runner.close(&session.id).await {
                    warn!(session_id = %session.id, error = %e, "Failed to close timed out session");
                }
                warn!(command = %command, timeout_secs = timeout.as_secs(), "Command timed out");
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&format!("[timed out after {}s]", timeout.as_secs()));
                TerminalCommandResult {
                    success: false,
                    command: command.to_string(),
                    output,
                    exit_code: None,
                    duration_ms,
                    truncated,
                }
            }
        };

        info!(
            command = %command,
            success = result.success,
            exit_code = ?result.exit_code,
            duration_ms,
            "Command finished"
        );
        Ok(result)
    }

    // ── Named processes ──────────────────────────────────────────────────

    /// Start `command` in a session registered under `name`.
    ///
    /// Fails without side effects when `name` already maps to a live
    /// session. The name is reserved atomically before the session is
    /// created, so concurrent starts cannot both succeed.
    pub async fn start_named(&self, name: &str, command: &str, cwd: Option<&Path>) -> Result<Session> {
        self.release_if_exited(name).await;

        let reservation = Uuid::new_v4();
        match self.named.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(Error::AlreadyRunning(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(NamedEntry {
                    slot: NamedSlot::Starting(reservation),
                    command: command.to_string(),
                    started_at: Utc::now(),
                });
            }
        }

        let session = match self.spawn_named(command, cwd).await {
            Ok(session) => session,
            Err(e) => {
                self.named
                    .remove_if(name, |_, entry| entry.slot == NamedSlot::Starting(reservation));
                return Err(e);
            }
        };

        let promoted = self
            .named
            .get_mut(name)
            .map(|mut entry| {
                if entry.slot == NamedSlot::Starting(reservation) {
                    entry.slot = NamedSlot::Running(session.id.clone());
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);

        if !promoted {
            // Stopped while starting
            let _ = self.runner.close(&session.id).await;
            return Err(Error::NotRunning(name.to_string()));
        }

        info!(name = %name, session_id = %session.id, command = %command, "Named process started");
        Ok(session)
    }

    /// Stop the process registered under `name` and drop the mapping
    pub async fn stop_named(&self, name: &str) -> Result<()> {
        let (_, entry) = self
            .named
            .remove(name)
            .ok_or_else(|| Error::NotRunning(name.to_string()))?;

        if let NamedSlot::Running(session_id) = entry.slot {
            match self.runner.close(&session_id).await {
                // Already exited on its own
                Ok(()) | Err(Error::SessionNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            info!(name = %name, session_id = %session_id, "Named process stopped");
        }
        Ok(())
    }

    /// Session id registered under `name`, if running
    #[must_use]
    pub fn named_session(&self, name: &str) -> Option<String> {
        self.named.get(name).and_then(|entry| match &entry.slot {
            NamedSlot::Running(id) => Some(id.clone()),
            NamedSlot::Starting(_) => None,
        })
    }

    /// All registered named processes, sorted by name
    #[must_use]
    pub fn list_named(&self) -> Vec<NamedProcess> {
        let mut list: Vec<NamedProcess> = self
            .named
            .iter()
            .map(|entry| NamedProcess {
                name: entry.key().clone(),
                session_id: match &entry.slot {
                    NamedSlot::Running(id) => Some(id.clone()),
                    NamedSlot::Starting(_) => None,
                },
                command: entry.command.clone(),
                started_at: entry.started_at,
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Stop every named process
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.named.iter().map(|e| e.key().clone()).collect();
        for name in names {
            if let Err(e) = self.stop_named(&name).await {
                warn!(name = %name, error = %e, "Failed to stop named process");
            }
        }
    }

    async fn spawn_named(&self, command: &str, cwd: Option<&Path>) -> Result<Session> {
        let session = self.create(cwd.map(Path::to_path_buf)).await?;
        if let Err(e) = self.runner.write(&session.id, &format!("{}\n", command)).await {
            let _ = self.runner.close(&session.id).await;
            return Err(e);
        }
        Ok(session)
    }

    /// Drop the mapping for `name` if its session already exited
    async fn release_if_exited(&self, name: &str) {
        let Some(session_id) = self.named_session(name) else {
            return;
        };
        if !self.runner.is_active(&session_id).await {
            let bound = NamedSlot::Running(session_id.clone());
            if self.named.remove_if(name, |_, entry| entry.slot == bound).is_some() {
                debug!(name = %name, session_id = %session_id, "Released name of exited process");
            }
        }
    }
}
