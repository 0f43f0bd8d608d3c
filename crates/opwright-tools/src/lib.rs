//! Opwright Tools - Collaborators for the directive engine
//!
//! This crate provides the side-effecting half of opwright:
//! - Session: PTY terminal runner, ephemeral commands and named processes
//! - File: project-rooted file store
//! - Git: git CLI backend
//! - Deploy: deployment backend (Vercel)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod deploy;
pub mod error;
pub mod file;
pub mod git;
pub mod session;

pub use deploy::{DeployBackend, DeployFile, DeployOptions, DeployOutcome, VercelDeployBackend};
pub use error::{Error, Result};
pub use file::{FileStore, LocalFileStore, ProjectFile};
pub use git::{
    CommitInfo, GitBackend, GitCliBackend, GitCredentials, GitStatus, GitStatusEntry,
};
pub use session::{
    CommandLimits, NamedProcess, PtyTerminalRunner, Session, SessionManager, SessionOptions,
    ShellConfig, TerminalCommandResult, TerminalEvent, TerminalRunner,
};
