//! Terminal sessions
//!
//! - `TerminalRunner`: host contract for interactive terminal sessions
//! - `PtyTerminalRunner`: shells attached to pseudo terminals
//! - `SessionManager`: ephemeral commands with timeouts and the
//!   named-process table

mod manager;
mod output;
mod pty;
mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use manager::{CommandLimits, NamedProcess, SessionManager};
pub use pty::{PtyTerminalRunner, ShellConfig};
pub use runner::{
    Session, SessionOptions, TerminalCommandResult, TerminalEvent, TerminalRunner, DEFAULT_COLS,
    DEFAULT_ROWS,
};
