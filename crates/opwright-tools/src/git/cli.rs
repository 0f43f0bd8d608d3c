use super::backend::{CommitInfo, GitBackend, GitCredentials, GitStatus};
use super::parse::{parse_branches, parse_log, parse_status, LOG_FORMAT};
use super::security::{
    is_valid_branch_name, is_valid_pathspec, is_valid_remote_name, sanitize_remote_error,
};
use crate::error::{Error, Result};
use base64::Engine;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Cap on commits returned by `log`
const MAX_LOG_DEPTH: usize = 100;

/// [`GitBackend`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCliBackend {
    repo: PathBuf,
}

impl GitCliBackend {
    /// Backend operating on the repository at `repo`
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Repository directory
    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    async fn run(&self, args: &[&str], creds: Option<&GitCredentials>) -> Result<String> {
        let operation = args.first().copied().unwrap_or("git");
        debug!(repo = %self.repo.display(), operation = %operation, "Running git");

        let mut cmd = Command::new("git");
        if let Some(creds) = creds {
            cmd.arg("-c").arg(auth_header(creds));
        }
        cmd.args(args);
        cmd.current_dir(&self.repo);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::Execution(format!("Failed to run git {}: {}", operation, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let message = if creds.is_some() || matches!(operation, "push" | "pull") {
            sanitize_remote_error(operation, &stderr)
        } else {
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            format!("git {} failed: {}", operation, detail.trim())
        };
        Err(Error::Execution(message))
    }

    async fn sync(
        &self,
        operation: &str,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String> {
        if !is_valid_remote_name(remote) {
            return Err(Error::InvalidInput(format!("Invalid remote name: {}", remote)));
        }
        if let Some(b) = branch {
            if !is_valid_branch_name(b) {
                return Err(Error::InvalidInput(format!("Invalid branch name: {}", b)));
            }
        }

        // Never forced: no --force, -f or --force-with-lease
        let mut args = vec![operation, remote];
        if let Some(b) = branch {
            args.push(b);
        }
        self.run(&args, creds).await
    }
}

fn auth_header(creds: &GitCredentials) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", creds.username, creds.token));
    format!("http.extraheader=Authorization: Basic {}", encoded)
}

#[async_trait::async_trait]
impl GitBackend for GitCliBackend {
    async fn init(&self) -> Result<String> {
        let out = self.run(&["init"], None).await?;
        Ok(out.trim().to_string())
    }

    async fn status(&self) -> Result<GitStatus> {
        let out = self
            .run(&["status", "--porcelain=v1", "--branch"], None)
            .await?;
        Ok(parse_status(&out))
    }

    async fn add(&self, path: &str) -> Result<()> {
        if !is_valid_pathspec(path) {
            return Err(Error::InvalidInput(format!("Invalid path: {}", path)));
        }
        self.run(&["add", "--", path], None).await?;
        Ok(())
    }

    async fn add_all(&self) -> Result<()> {
        self.run(&["add", "-A"], None).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(Error::InvalidInput("commit message must not be empty".to_string()));
        }
        self.run(&["commit", "-m", message], None).await?;
        let sha = self.run(&["rev-parse", "HEAD"], None).await?;
        Ok(sha.trim().to_string())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        if !is_valid_branch_name(name) {
            return Err(Error::InvalidInput(format!("Invalid branch name: {}", name)));
        }
        self.run(&["branch", name], None).await?;
        Ok(())
    }

    async fn checkout(&self, branch: &str, create: bool) -> Result<()> {
        if !is_valid_branch_name(branch) {
            return Err(Error::InvalidInput(format!("Invalid branch name: {}", branch)));
        }
        if create {
            self.run(&["checkout", "-b", branch], None).await?;
        } else {
            self.run(&["checkout", branch], None).await?;
        }
        Ok(())
    }

    async fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String> {
        self.sync("push", remote, branch, creds).await
    }

    async fn pull(
        &self,
        remote: &str,
        branch: Option<&str>,
        creds: Option<&GitCredentials>,
    ) -> Result<String> {
        self.sync("pull", remote, branch, creds).await
    }

    async fn log(&self, depth: usize) -> Result<Vec<CommitInfo>> {
        let limit = format!("-n{}", depth.clamp(1, MAX_LOG_DEPTH));
        let out = self.run(&["log", LOG_FORMAT, &limit], None).await?;
        Ok(parse_log(&out))
    }

    async fn diff(&self, path: Option<&str>) -> Result<String> {
        match path {
            Some(p) => {
                if !is_valid_pathspec(p) {
                    return Err(Error::InvalidInput(format!("Invalid path: {}", p)));
                }
                self.run(&["diff", "--", p], None).await
            }
            None => self.run(&["diff"], None).await,
        }
    }

    async fn branches(&self) -> Result<Vec<String>> {
        let out = self
            .run(&["branch", "--format=%(refname:short)"], None)
            .await?;
        Ok(parse_branches(&out))
    }
}
