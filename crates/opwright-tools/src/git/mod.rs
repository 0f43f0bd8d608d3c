//! Git collaborator
//!
//! - [`GitBackend`]: the operations the engine issues against a repository
//! - [`GitCliBackend`]: implementation that shells out to the `git` binary

mod backend;
mod cli;
mod parse;
pub mod security;

#[cfg(test)]
mod tests;

pub use backend::{CommitInfo, GitBackend, GitCredentials, GitStatus, GitStatusEntry};
pub use cli::GitCliBackend;
