//! Scripted in-memory terminal runner
//!
//! Stands in for a real terminal host in tests. Commands written to a
//! session are matched against a script; output and exit events are
//! published immediately. Commands without a trailing `exit $?` line (named
//! processes) keep their session alive until closed.

use super::runner::{Session, SessionOptions, TerminalEvent, TerminalRunner};
use crate::error::{Error, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Scripted behaviour for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedCommand {
    /// Print `output` and exit with `code`
    Exit {
        /// Output printed before exiting
        output: String,
        /// Exit code
        code: i32,
    },
    /// Never produce an exit event
    Hang,
}

#[derive(Default)]
struct State {
    next_id: u64,
    active: HashSet<String>,
    created: Vec<Session>,
    written: Vec<String>,
    closed: Vec<String>,
}

/// In-memory terminal runner driven by a command script.
pub struct ScriptedTerminalRunner {
    script: HashMap<String, ScriptedCommand>,
    fail_create: bool,
    state: Mutex<State>,
    events: broadcast::Sender<TerminalEvent>,
}

impl ScriptedTerminalRunner {
    /// Runner where every command succeeds with empty output
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            script: HashMap::new(),
            fail_create: false,
            state: Mutex::new(State::default()),
            events,
        }
    }

    /// Script `command` to print `output` and exit with `code`
    #[must_use]
    pub fn with_exit(mut self, command: &str, output: &str, code: i32) -> Self {
        self.script.insert(
            command.to_string(),
            ScriptedCommand::Exit {
                output: output.to_string(),
                code,
            },
        );
        self
    }

    /// Script `command` to never exit
    #[must_use]
    pub fn with_hang(mut self, command: &str) -> Self {
        self.script.insert(command.to_string(), ScriptedCommand::Hang);
        self
    }

    /// Make every `create_session` call fail
    #[must_use]
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Number of sessions created so far
    pub fn created_count(&self) -> usize {
        self.lock().created.len()
    }

    /// Commands dispatched so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.lock().written.clone()
    }

    /// Session ids closed through `close`
    pub fn closed(&self) -> Vec<String> {
        self.lock().closed.clone()
    }

    /// Simulate a session's process exiting on its own
    pub fn exit_session(&self, session_id: &str, code: i32) {
        self.lock().active.remove(session_id);
        let _ = self.events.send(TerminalEvent::Exit {
            session_id: session_id.to_string(),
            code,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ScriptedTerminalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TerminalRunner for ScriptedTerminalRunner {
    async fn create_session(&self, opts: SessionOptions) -> Result<Session> {
        if self.fail_create {
            return Err(Error::Execution("terminal host unavailable".to_string()));
        }
        let mut state = self.lock();
        state.next_id += 1;
        let session = Session {
            id: format!("scripted-{}", state.next_id),
            cwd: opts.cwd.unwrap_or_else(|| PathBuf::from(".")),
            created_at: Utc::now(),
        };
        state.active.insert(session.id.clone());
        state.created.push(session.clone());
        Ok(session)
    }

    async fn write(&self, session_id: &str, data: &str) -> Result<()> {
        let mut lines = data.lines();
        let command = lines.next().unwrap_or_default().to_string();
        let exits = lines.any(|l| l.trim() == "exit $?");
        {
            let mut state = self.lock();
            if !state.active.contains(session_id) {
                return Err(Error::SessionNotFound(session_id.to_string()));
            }
            state.written.push(command.clone());
        }

        let scripted = self.script.get(&command).cloned().unwrap_or(ScriptedCommand::Exit {
            output: String::new(),
            code: 0,
        });
        match scripted {
            ScriptedCommand::Exit { output, code } => {
                if !output.is_empty() {
                    let _ = self.events.send(TerminalEvent::Output {
                        session_id: session_id.to_string(),
                        data: output.into_bytes(),
                    });
                }
                if exits {
                    self.exit_session(session_id, code);
                }
            }
            ScriptedCommand::Hang => {}
        }
        Ok(())
    }

    async fn resize(&self, session_id: &str, _cols: u16, _rows: u16) -> Result<()> {
        if self.lock().active.contains(session_id) {
            Ok(())
        } else {
            Err(Error::SessionNotFound(session_id.to_string()))
        }
    }

    async fn close(&self, session_id: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.active.remove(session_id) {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        state.closed.push(session_id.to_string());
        drop(state);
        let _ = self.events.send(TerminalEvent::Exit {
            session_id: session_id.to_string(),
            code: -1,
        });
        Ok(())
    }

    async fn is_active(&self, session_id: &str) -> bool {
        self.lock().active.contains(session_id)
    }

    fn subscribe(&self) -> broadcast::Receiver<TerminalEvent> {
        self.events.subscribe()
    }
}
