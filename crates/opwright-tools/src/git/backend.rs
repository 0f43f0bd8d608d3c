use crate::error::Result;
use serde::{Deserialize, Serialize};

/// HTTP credentials for push and pull.
#[derive(Clone, Deserialize)]
pub struct GitCredentials {
    /// Account name
    pub username: String,
    /// Access token or password
    pub token: String,
}

impl GitCredentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// One line of `git status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusEntry {
    /// Two-letter porcelain code, trimmed (`M`, `??`, `A`, ...)
    pub status: String,
    /// Path relative to the repository root
    pub path: String,
}

/// Working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    /// Current branch, absent when HEAD is detached
    pub branch: Option<String>,
    /// Changed and untracked files
    pub entries: Vec<GitStatusEntry>,
}

impl GitStatus {
    /// Whether the tree has no changes
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One commit from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full commit hash
    pub sha: String,
    /// Author name
    pub author: String,
    /// Author date, ISO 8601
    pub date: String,
    /// Subject line
    pub message: String,
}

/// Version control operations against one repository.
#[async_trait::async_trait]
pub trait GitBackend: Send + Sync {
    /// Initialize a repository, returning git's message
    async fn init(&self) -> Result<String>;

    /// Working tree status
    async fn status(&self) -> Result<GitStatus>;

    /// Stage one path
    async fn add(&self, path: &str) -> Result<()>;

    /// Stage every change
    async fn add_all(&self) -> Result<()>;

    /// Commit staged changes, returning the new commit hash
    async fn commit(&self, message: &str) -> Result<String>;

    /// Create a branch without switching to it
    async fn create_branch(&self, name: &str) -> Result<()>;

    /// Switch to `branch`, creating it first when `create` is set
    async fn checkout(&self, branch: &str, create: bool) -> Result<()>;

    /// Push `branch` (current when absent) to `remote`
    async fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String>;

    /// Pull `branch` (current when absent) from `remote`
    async fn pull(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String>;

    /// Most recent `depth` commits
    async fn log(&self, depth: usize) -> Result<Vec<CommitInfo>>;

    /// Unstaged diff, limited to `path` when given
    async fn diff(&self, path: Option<&str>) -> Result<String>;

    /// Local branch names
    async fn branches(&self) -> Result<Vec<String>>;
}
