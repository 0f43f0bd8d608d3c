//! Opwright Core - Directive Protocol and Execution Engine
//!
//! This crate turns an assistant's response into side effects on a project:
//! - Directive: tag grammar and extraction into an [`OperationBatch`]
//! - Permissions: per-domain gate consulted before every directive
//! - Config: engine settings with persistent partial updates
//! - Orchestrator: phased execution against the tool collaborators
//! - Reporter: progress events, command history and text reports
//! - Sanitize: display text with directives replaced by labels
//! - Status: interaction state machine
//! - Workspace: one project's engine, tying the above together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod directive;
pub mod error;
pub mod orchestrator;
pub mod permissions;
pub mod reporter;
pub mod results;
pub mod sanitize;
pub mod status;
pub mod workspace;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use batch::OperationBatch;
pub use config::{ConfigStore, ConfigUpdate, EngineConfig, PermissionUpdate};
pub use directive::{extract, Directive, DirectiveKind, Domain, EnvVar};
pub use error::{Error, Result};
pub use orchestrator::{Collaborators, Orchestrator};
pub use permissions::{disabled_message, PermissionGate, PermissionSet};
pub use reporter::{
    BatchSummary, CommandHistory, CommandHistoryEntry, EngineEvent, EventBus, ExecutionReport,
    Reporter,
};
pub use results::{
    BuildResult, DeployResult, DirectiveOutcome, ExecutionResults, FileOperation,
    FileOperationResult, GitOperationResult, TerminalCommandResult,
};
pub use sanitize::sanitize;
pub use status::{InteractionStatus, StatusEvent, StatusMachine};
pub use workspace::{AppliedResponse, Workspace, WorkspaceOptions};
