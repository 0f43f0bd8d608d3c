//! Project file store
//!
//! - `FileStore`: the file/folder contract used by the orchestrator
//! - `LocalFileStore`: disk-backed store rooted at the project directory
//!
//! Every path is resolved relative to the project root; paths that would
//! escape it are rejected before touching the disk.

mod local;
pub mod security;
mod store;

#[cfg(test)]
mod tests;

pub use local::LocalFileStore;
pub use store::{FileStore, ProjectFile};
