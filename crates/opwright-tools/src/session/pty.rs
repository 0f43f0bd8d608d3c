//! PTY-backed terminal runner
//!
//! Every session is an interactive shell attached to its own pseudo
//! terminal. A reader task per session forwards raw output to the event
//! channel and reports the exit code once the shell terminates or the
//! session is closed.

use super::runner::{Session, SessionOptions, TerminalEvent, TerminalRunner};
use crate::error::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const READ_CHUNK_BYTES: usize = 4096;

/// Shell used for new sessions.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shell program
    pub program: String,
    /// Arguments passed to the shell
    pub args: Vec<String>,
    /// Working directory when a session does not specify one
    pub default_cwd: PathBuf,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "/bin/bash".to_string(),
            args: vec!["--noprofile".to_string(), "--norc".to_string()],
            default_cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl ShellConfig {
    /// Default shell rooted at the given directory
    #[must_use]
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            default_cwd: cwd.into(),
            ..Self::default()
        }
    }
}

struct PtyHandle {
    writer: pty_process::OwnedWritePty,
    cancel: CancellationToken,
}

/// Terminal runner spawning shells on pseudo terminals.
pub struct PtyTerminalRunner {
    config: ShellConfig,
    sessions: Arc<Mutex<HashMap<String, PtyHandle>>>,
    events: broadcast::Sender<TerminalEvent>,
}

impl PtyTerminalRunner {
    /// Create a runner with the given shell configuration
    #[must_use]
    pub fn new(config: ShellConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn spawn_reader(
        &self,
        session_id: String,
        mut reader: pty_process::OwnedReadPty,
        mut child: tokio::process::Child,
        cancel: CancellationToken,
    ) {
        let events = self.events.clone();
        let sessions = self.sessions.clone();

        tokio::spawn(async move {
            let mut buf = [0u8; READ_CHUNK_BYTES];
            let killed = loop {
                tokio::select! {
                    _ = cancel.cancelled() => break true,
                    n = reader.read(&mut buf) => match n {
                        // EIO once the shell and all its children released the PTY
                        Ok(0) | Err(_) => break false,
                        Ok(n) => {
                            let _ = events.send(TerminalEvent::Output {
                                session_id: session_id.clone(),
                                data: buf[..n].to_vec(),
                            });
                        }
                    }
                }
            };

            let code = if killed {
                if let Err(e) = child.kill().await {
                    warn!(session_id = %session_id, error = %e, "Failed to kill session process");
                }
                -1
            } else {
                match child.wait().await {
                    Ok(status) => status.code().unwrap_or(-1),
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to wait for session process");
                        -1
                    }
                }
            };

            sessions.lock().await.remove(&session_id);
            debug!(session_id = %session_id, code, "Terminal session exited");
            let _ = events.send(TerminalEvent::Exit { session_id, code });
        });
    }
}

impl Default for PtyTerminalRunner {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[async_trait::async_trait]
impl TerminalRunner for PtyTerminalRunner {
    async fn create_session(&self, opts: SessionOptions) -> Result<Session> {
        let id = Uuid::new_v4().to_string();
        let cwd = opts.cwd.unwrap_or_else(|| self.config.default_cwd.clone());

        let (pty, pts) = pty_process::open()
            .map_err(|e| Error::Execution(format!("Failed to open PTY: {}", e)))?;
        pty.resize(pty_process::Size::new(opts.rows, opts.cols))
            .map_err(|e| Error::Execution(format!("Failed to size PTY: {}", e)))?;

        let child = pty_process::Command::new(&self.config.program)
            .args(&self.config.args)
            .env("TERM", "xterm-256color")
            .env("PS1", "")
            .env("PS2", "")
            .current_dir(&cwd)
            .spawn(pts)
            .map_err(|e| {
                Error::Execution(format!("Failed to spawn {}: {}", self.config.program, e))
            })?;

        let (reader, writer) = pty.into_split();
        let cancel = CancellationToken::new();

        self.sessions.lock().await.insert(
            id.clone(),
            PtyHandle {
                writer,
                cancel: cancel.clone(),
            },
        );
        self.spawn_reader(id.clone(), reader, child, cancel);

        info!(session_id = %id, cwd = %cwd.display(), "Terminal session created");
        Ok(Session {
            id,
            cwd,
            created_at: Utc::now(),
        })
    }

    async fn write(&self, session_id: &str, data: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        let handle = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        handle
            .writer
            .write_all(data.as_bytes())
            .await
            .map_err(|e| Error::Execution(format!("Failed to write to session: {}", e)))
    }

    async fn resize(&self, session_id: &str, cols: u16, rows: u16) -> Result<()> {
        let sessions = self.sessions.lock().await;
        let handle = sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        handle
            .writer
            .resize(pty_process::Size::new(rows, cols))
            .map_err(|e| Error::Execution(format!("Failed to resize session: {}", e)))
    }

    async fn close(&self, session_id: &str) -> Result<()> {
        let handle = self
            .sessions
            .lock()
            .await
            .remove(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        handle.cancel.cancel();
        info!(session_id = %session_id, "Terminal session closed");
        Ok(())
    }

    async fn is_active(&self, session_id: &str) -> bool {
        self.sessions.lock().await.contains_key(session_id)
    }

    fn subscribe(&self) -> broadcast::Receiver<TerminalEvent> {
        self.events.subscribe()
    }
}
