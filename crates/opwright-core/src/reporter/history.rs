//! Command history
//!
//! Append-only record of every command the engine ran in a terminal
//! session, in execution order. Cleared only on request.

use crate::results::TerminalCommandResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// One executed terminal command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    /// Command text
    pub command: String,
    /// Final result
    pub result: TerminalCommandResult,
    /// When the command resolved
    pub timestamp: DateTime<Utc>,
}

/// Append-only command history, cleared only on request.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: Mutex<Vec<CommandHistoryEntry>>,
}

impl CommandHistory {
    /// Empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result
    pub fn append(&self, result: TerminalCommandResult) {
        let entry = CommandHistoryEntry {
            command: result.command.clone(),
            result,
            timestamp: Utc::now(),
        };
        self.lock().push(entry);
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<CommandHistoryEntry> {
        self.lock().clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CommandHistoryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
