//! Per-domain result types

use crate::directive::Domain;
use serde::{Deserialize, Serialize};

pub use opwright_tools::TerminalCommandResult;

/// File operation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    /// File created
    Create,
    /// File content replaced
    Edit,
    /// File deleted
    Delete,
    /// File renamed or moved
    Rename,
    /// Folder created
    CreateFolder,
    /// Folder deleted
    DeleteFolder,
}

impl FileOperation {
    /// Human-readable verb
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::CreateFolder => "create folder",
            Self::DeleteFolder => "delete folder",
        }
    }
}

/// Outcome of one file or folder directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Path operated on (`from -> to` for renames)
    pub path: String,
    /// Operation kind
    pub operation: FileOperation,
    /// Captured error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOperationResult {
    /// Successful result
    #[must_use]
    pub fn ok(operation: FileOperation, path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: path.into(),
            operation,
            error: None,
        }
    }

    /// Failed result
    #[must_use]
    pub fn failed(operation: FileOperation, path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: path.into(),
            operation,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a build, test, run or dev directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Whether the command succeeded
    pub success: bool,
    /// Command that was run
    pub command: String,
    /// Raw command output
    pub output: String,
    /// Captured errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Notes such as truncated output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl BuildResult {
    /// Failed result that never ran
    #[must_use]
    pub fn failed(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            command: command.into(),
            output: String::new(),
            errors: vec![error.into()],
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Convert a finished terminal command
    #[must_use]
    pub fn from_command(result: TerminalCommandResult) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        if !result.success {
            errors.push(match result.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "did not exit".to_string(),
            });
        }
        if result.truncated {
            warnings.push("output truncated".to_string());
        }
        Self {
            success: result.success,
            command: result.command,
            output: result.output,
            errors,
            warnings,
            duration_ms: result.duration_ms,
        }
    }
}

/// Outcome of a deploy directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    /// Whether the deployment was created
    pub success: bool,
    /// Public URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Platform deployment id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    /// Platform state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Captured error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeployResult {
    /// Failed result
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Outcome of a git directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitOperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Operation name (`commit`, `push`, ...)
    pub operation: String,
    /// Operation-specific data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Captured error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GitOperationResult {
    /// Successful result
    #[must_use]
    pub fn ok(operation: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            operation: operation.into(),
            data,
            error: None,
        }
    }

    /// Failed result
    #[must_use]
    pub fn failed(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            operation: operation.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Final result of one directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "result", rename_all = "snake_case")]
pub enum DirectiveOutcome {
    /// Single terminal command or named-process operation
    Terminal(TerminalCommandResult),
    /// Executed prefix of a command sequence
    TerminalSequence(Vec<TerminalCommandResult>),
    /// File or folder operation
    File(FileOperationResult),
    /// Build, test, run or dev
    Build(BuildResult),
    /// Deployment
    Deploy(DeployResult),
    /// Version control
    Git(GitOperationResult),
}

impl DirectiveOutcome {
    /// Domain of the directive
    #[must_use]
    pub fn domain(&self) -> Domain {
        match self {
            Self::Terminal(_) | Self::TerminalSequence(_) => Domain::Terminal,
            Self::File(_) => Domain::File,
            Self::Build(_) => Domain::Build,
            Self::Deploy(_) => Domain::Deploy,
            Self::Git(_) => Domain::Git,
        }
    }

    /// Whether the directive succeeded; a sequence succeeds when every command did
    #[must_use]
    pub fn success(&self) -> bool {
        match self {
            Self::Terminal(r) => r.success,
            Self::TerminalSequence(rs) => rs.iter().all(|r| r.success),
            Self::File(r) => r.success,
            Self::Build(r) => r.success,
            Self::Deploy(r) => r.success,
            Self::Git(r) => r.success,
        }
    }
}

/// Results of one batch, one collection per domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResults {
    /// Terminal results; sequence members appear individually
    pub terminal: Vec<TerminalCommandResult>,
    /// File and folder results
    pub file: Vec<FileOperationResult>,
    /// Build results
    pub build: Vec<BuildResult>,
    /// Deploy results
    pub deploy: Vec<DeployResult>,
    /// Git results
    pub git: Vec<GitOperationResult>,
}

impl ExecutionResults {
    /// Record a directive outcome
    pub fn record(&mut self, outcome: DirectiveOutcome) {
        match outcome {
            DirectiveOutcome::Terminal(r) => self.terminal.push(r),
            DirectiveOutcome::TerminalSequence(rs) => self.terminal.extend(rs),
            DirectiveOutcome::File(r) => self.file.push(r),
            DirectiveOutcome::Build(r) => self.build.push(r),
            DirectiveOutcome::Deploy(r) => self.deploy.push(r),
            DirectiveOutcome::Git(r) => self.git.push(r),
        }
    }

    /// Total number of recorded results
    #[must_use]
    pub fn len(&self) -> usize {
        self.terminal.len() + self.file.len() + self.build.len() + self.deploy.len() + self.git.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of failed results
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.terminal.iter().filter(|r| !r.success).count()
            + self.file.iter().filter(|r| !r.success).count()
            + self.build.iter().filter(|r| !r.success).count()
            + self.deploy.iter().filter(|r| !r.success).count()
            + self.git.iter().filter(|r| !r.success).count()
    }
}
