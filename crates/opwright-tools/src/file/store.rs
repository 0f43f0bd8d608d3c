use crate::error::Result;
use serde::Serialize;

/// A file captured from the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFile {
    /// Path relative to the project root, `/`-separated
    pub path: String,
    /// Raw file contents
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// File and folder operations against a project.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Create or overwrite a file, creating parent folders as needed
    async fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Delete a file
    async fn delete(&self, path: &str) -> Result<()>;

    /// Move or rename a file or folder
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a folder and any missing parents
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Delete a folder and everything in it
    async fn remove_dir(&self, path: &str) -> Result<()>;

    /// Collect the project's files, skipping VCS and build output folders
    async fn snapshot(&self) -> Result<Vec<ProjectFile>>;
}
