//! In-memory collaborators for tests
//!
//! Each fake records the calls it receives and can be told to fail for a
//! given argument, so tests can check both side effects and isolation.

use opwright_tools::{
    CommitInfo, DeployBackend, DeployFile, DeployOptions, DeployOutcome, Error, FileStore,
    GitBackend, GitCredentials, GitStatus, ProjectFile, Result,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// File store keeping files in a map.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<String, String>>,
    folders: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl MemoryFileStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `path` fail
    #[must_use]
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Seed a file
    #[must_use]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        lock(&self.files).insert(path.to_string(), content.to_string());
        self
    }

    /// Content of `path`
    pub fn read(&self, path: &str) -> Option<String> {
        lock(&self.files).get(path).cloned()
    }

    /// Whether a folder was created at `path`
    pub fn has_folder(&self, path: &str) -> bool {
        lock(&self.folders).contains(path)
    }

    /// Operations received, as `op path`
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, op: &str, path: &str) -> Result<()> {
        lock(&self.calls).push(format!("{} {}", op, path));
        if self.failing.contains(path) {
            return Err(Error::Execution(format!("{} failed for {}", op, path)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl FileStore for MemoryFileStore {
    async fn write(&self, path: &str, content: &str) -> Result<()> {
        self.record("write", path)?;
        lock(&self.files).insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record("delete", path)?;
        lock(&self.files)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::InvalidInput(format!("no such file: {}", path)))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.record("rename", from)?;
        let mut files = lock(&self.files);
        let content = files
            .remove(from)
            .ok_or_else(|| Error::InvalidInput(format!("no such file: {}", from)))?;
        files.insert(to.to_string(), content);
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        self.record("mkdir", path)?;
        lock(&self.folders).insert(path.to_string());
        Ok(())
    }

    async fn remove_dir(&self, path: &str) -> Result<()> {
        self.record("rmdir", path)?;
        lock(&self.folders).remove(path);
        let prefix = format!("{}/", path);
        lock(&self.files).retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<ProjectFile>> {
        Ok(lock(&self.files)
            .iter()
            .map(|(path, content)| ProjectFile {
                path: path.clone(),
                data: content.clone().into_bytes(),
            })
            .collect())
    }
}

/// Git backend that records operations.
#[derive(Debug, Default)]
pub struct RecordingGitBackend {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    commits: Mutex<u32>,
}

impl RecordingGitBackend {
    /// Backend where every operation succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` (`commit`, `push`, ...) fail
    #[must_use]
    pub fn failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    /// Operations received, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) -> Result<()> {
        let op = call.split_whitespace().next().unwrap_or_default().to_string();
        lock(&self.calls).push(call);
        if self.failing.contains(&op) {
            return Err(Error::Execution(format!("git {} failed", op)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GitBackend for RecordingGitBackend {
    async fn init(&self) -> Result<String> {
        self.record("init".to_string())?;
        Ok("Initialized empty Git repository".to_string())
    }

    async fn status(&self) -> Result<GitStatus> {
        self.record("status".to_string())?;
        Ok(GitStatus {
            branch: Some("main".to_string()),
            entries: Vec::new(),
        })
    }

    async fn add(&self, path: &str) -> Result<()> {
        self.record(format!("add {}", path))
    }

    async fn add_all(&self) -> Result<()> {
        self.record("add -A".to_string())
    }

    async fn commit(&self, message: &str) -> Result<String> {
        self.record(format!("commit {}", message))?;
        let mut count = lock(&self.commits);
        *count += 1;
        Ok(format!("{:040x}", *count))
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("branch {}", name))
    }

    async fn checkout(&self, branch: &str, create: bool) -> Result<()> {
        if create {
            self.record(format!("checkout -b {}", branch))
        } else {
            self.record(format!("checkout {}", branch))
        }
    }

    async fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String> {
        let auth = if creds.is_some() { " (auth)" } else { "" };
        self.record(format!("push {} {}{}", remote, branch.unwrap_or("HEAD"), auth))?;
        Ok(String::new())
    }

    async fn pull(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String> {
        let auth = if creds.is_some() { " (auth)" } else { "" };
        self.record(format!("pull {} {}{}", remote, branch.unwrap_or("HEAD"), auth))?;
        Ok("Already up to date.".to_string())
    }

    async fn log(&self, depth: usize) -> Result<Vec<CommitInfo>> {
        self.record(format!("log {}", depth))?;
        Ok(Vec::new())
    }

    async fn diff(&self, path: Option<&str>) -> Result<String> {
        self.record(format!("diff {}", path.unwrap_or("")).trim_end().to_string())?;
        Ok(String::new())
    }

    async fn branches(&self) -> Result<Vec<String>> {
        self.record("branches".to_string())?;
        Ok(vec!["main".to_string()])
    }
}

/// A deploy call as received by [`RecordingDeployBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCall {
    /// Uploaded paths
    pub files: Vec<String>,
    /// Project name
    pub project: String,
    /// Token used
    pub token: String,
    /// Options passed
    pub options: DeployOptions,
}

/// Deploy backend that records calls and returns a fixed outcome.
#[derive(Debug, Default)]
pub struct RecordingDeployBackend {
    calls: Mutex<Vec<DeployCall>>,
    fail: bool,
}

impl RecordingDeployBackend {
    /// Backend where deployments succeed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend where deployments fail
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Calls received
    pub fn calls(&self) -> Vec<DeployCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl DeployBackend for RecordingDeployBackend {
    async fn deploy(
        &self,
        files: Vec<DeployFile>,
        project_name: &str,
        token: &str,
        opts: &DeployOptions,
    ) -> Result<DeployOutcome> {
        lock(&self.calls).push(DeployCall {
            files: files.into_iter().map(|f| f.path).collect(),
            project: project_name.to_string(),
            token: token.to_string(),
            options: opts.clone(),
        });
        if self.fail {
            return Err(Error::Api {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(DeployOutcome {
            url: Some(format!("https://{}.example.app", project_name)),
            id: "dpl_test".to_string(),
            state: Some("QUEUED".to_string()),
        })
    }
}
