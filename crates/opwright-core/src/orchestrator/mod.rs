//! Orchestrator - executes an operation batch
//!
//! # Module Structure
//!
//! - `core`: [`Orchestrator`] struct and its [`Collaborators`]
//! - `process`: batch loop, phase ordering and permission gating
//! - `execution`: per-domain directive handlers
//! - `helpers`: default commands, credentials and disabled results
//!
//! Phases run in a fixed order: folder operations, file operations,
//! terminal, git, build, deploy. Within a phase, directives run one at a
//! time in their original order. A failing directive never stops the ones
//! after it.

mod core;
mod execution;
mod helpers;
mod process;


pub use core::{Collaborators, Orchestrator};
pub use helpers::{
    DEFAULT_BUILD_COMMAND, DEFAULT_DEPLOY_PLATFORM, DEFAULT_DEV_COMMAND, DEFAULT_DEV_NAME,
    DEFAULT_REMOTE, DEFAULT_RUN_COMMAND, DEFAULT_TEST_COMMAND,
};
