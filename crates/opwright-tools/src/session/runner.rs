//! Terminal runner contract
//!
//! A `TerminalRunner` hosts interactive terminal sessions. Output and exit
//! notifications are delivered over a broadcast channel so that several
//! listeners (the session manager, progress reporters) can observe the same
//! byte stream independently.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Default terminal width in columns.
pub const DEFAULT_COLS: u16 = 120;
/// Default terminal height in rows.
pub const DEFAULT_ROWS: u16 = 32;

/// An ephemeral or named terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Working directory the shell was started in
    pub cwd: PathBuf,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Options for creating a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Working directory (runner default when absent)
    pub cwd: Option<PathBuf>,
    /// Terminal width
    pub cols: u16,
    /// Terminal height
    pub rows: u16,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl SessionOptions {
    /// Options rooted at the given directory
    #[must_use]
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Self::default()
        }
    }
}

/// Event emitted by a terminal runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Raw bytes written by the session's process
    Output {
        /// Session the bytes belong to
        session_id: String,
        /// Raw output, possibly containing ANSI escapes
        data: Vec<u8>,
    },
    /// The session's process exited
    Exit {
        /// Session that exited
        session_id: String,
        /// Exit code (-1 when killed or unknown)
        code: i32,
    },
}

impl TerminalEvent {
    /// Session the event belongs to
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Output { session_id, .. } | Self::Exit { session_id, .. } => session_id,
        }
    }
}

/// Host for interactive terminal sessions.
#[async_trait::async_trait]
pub trait TerminalRunner: Send + Sync {
    /// Create a new session with a fresh unique id
    async fn create_session(&self, opts: SessionOptions) -> Result<Session>;

    /// Write raw input to a session
    async fn write(&self, session_id: &str, data: &str) -> Result<()>;

    /// Resize a session's terminal
    async fn resize(&self, session_id: &str, cols: u16, rows: u16) -> Result<()>;

    /// Close a session, terminating its process
    async fn close(&self, session_id: &str) -> Result<()>;

    /// Whether the session is still alive
    async fn is_active(&self, session_id: &str) -> bool;

    /// Subscribe to output and exit events of every session
    fn subscribe(&self) -> broadcast::Receiver<TerminalEvent>;
}

/// Result of a single terminal command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalCommandResult {
    /// Whether the command exited with code 0
    pub success: bool,
    /// Command that was executed
    pub command: String,
    /// Captured output (ANSI escapes removed)
    pub output: String,
    /// Exit code, absent on timeout or when the command never ran
    pub exit_code: Option<i32>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether captured output hit the size cap
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl TerminalCommandResult {
    /// Failure that happened before or instead of running the command
    #[must_use]
    pub fn failure(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            command: command.into(),
            output: message.into(),
            exit_code: None,
            duration_ms: 0,
            truncated: false,
        }
    }
}
