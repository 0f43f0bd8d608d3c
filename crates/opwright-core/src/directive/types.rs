//! Directive types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five execution domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Terminal commands and named processes
    Terminal,
    /// File and folder operations
    File,
    /// Build, test, run and dev server
    Build,
    /// Deployment
    Deploy,
    /// Version control
    Git,
}

impl Domain {
    /// Every domain, in display order
    pub const ALL: [Domain; 5] = [
        Domain::Terminal,
        Domain::File,
        Domain::Build,
        Domain::Deploy,
        Domain::Git,
    ];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Terminal => "Terminal",
            Self::File => "File",
            Self::Build => "Build",
            Self::Deploy => "Deploy",
            Self::Git => "Git",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An environment variable attached to a deploy directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: String,
}

/// Directive kinds, one per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DirectiveKind {
    TerminalRun,
    TerminalSequence,
    TerminalStart,
    TerminalStop,
    FileCreate,
    FileEdit,
    FileDelete,
    FileRename,
    FolderCreate,
    FolderDelete,
    Build,
    Test,
    Run,
    Dev,
    Deploy,
    GitInit,
    GitStatus,
    GitAdd,
    GitCommit,
    GitBranch,
    GitCheckout,
    GitPush,
    GitPull,
    GitLog,
    GitDiff,
}

impl DirectiveKind {
    /// Domain the kind belongs to
    #[must_use]
    pub fn domain(self) -> Domain {
        use DirectiveKind::*;
        match self {
            TerminalRun | TerminalSequence | TerminalStart | TerminalStop => Domain::Terminal,
            FileCreate | FileEdit | FileDelete | FileRename | FolderCreate | FolderDelete => {
                Domain::File
            }
            Build | Test | Run | Dev => Domain::Build,
            Deploy => Domain::Deploy,
            GitInit | GitStatus | GitAdd | GitCommit | GitBranch | GitCheckout | GitPush
            | GitPull | GitLog | GitDiff => Domain::Git,
        }
    }

    /// Short placeholder shown in place of the directive in display text
    #[must_use]
    pub fn label(self) -> &'static str {
        use DirectiveKind::*;
        match self {
            TerminalRun | TerminalSequence => "[Running command]",
            TerminalStart => "[Starting process]",
            TerminalStop => "[Stopping process]",
            FileCreate => "[Creating file]",
            FileEdit => "[Editing file]",
            FileDelete => "[Deleting file]",
            FileRename => "[Renaming file]",
            FolderCreate => "[Creating folder]",
            FolderDelete => "[Deleting folder]",
            Build => "[Building project]",
            Test => "[Running tests]",
            Run => "[Running project]",
            Dev => "[Starting dev server]",
            Deploy => "[Deploying project]",
            GitInit => "[Initializing repository]",
            GitStatus => "[Checking git status]",
            GitAdd => "[Staging changes]",
            GitCommit => "[Committing changes]",
            GitBranch => "[Creating branch]",
            GitCheckout => "[Switching branch]",
            GitPush => "[Pushing changes]",
            GitPull => "[Pulling changes]",
            GitLog => "[Reading git log]",
            GitDiff => "[Reading git diff]",
        }
    }
}

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Run one command in an ephemeral session
    TerminalRun {
        /// Shell command
        command: String,
    },
    /// Run commands in order, stopping at the first failure
    TerminalSequence {
        /// Shell commands
        commands: Vec<String>,
    },
    /// Start a long-running named process
    TerminalStart {
        /// Process name
        name: String,
        /// Shell command
        command: String,
    },
    /// Stop a named process
    TerminalStop {
        /// Process name
        name: String,
    },
    /// Create a file
    FileCreate {
        /// Project-relative path
        path: String,
        /// File content
        content: String,
    },
    /// Replace a file's content
    FileEdit {
        /// Project-relative path
        path: String,
        /// New content
        content: String,
    },
    /// Delete a file
    FileDelete {
        /// Project-relative path
        path: String,
    },
    /// Rename or move a file
    FileRename {
        /// Current path
        from: String,
        /// New path
        to: String,
    },
    /// Create a folder
    FolderCreate {
        /// Project-relative path
        path: String,
    },
    /// Delete a folder recursively
    FolderDelete {
        /// Project-relative path
        path: String,
    },
    /// Build the project
    Build {
        /// Build command override
        command: Option<String>,
    },
    /// Run the test suite
    Test {
        /// Test command override
        command: Option<String>,
        /// Test name filter
        pattern: Option<String>,
    },
    /// Run the project to completion
    Run {
        /// Run command override
        command: Option<String>,
    },
    /// Start the dev server as a named process
    Dev {
        /// Dev command override
        command: Option<String>,
        /// Process name override
        name: Option<String>,
    },
    /// Deploy the project
    Deploy {
        /// Target platform
        platform: Option<String>,
        /// Project name on the platform
        project: Option<String>,
        /// Environment variables
        env: Vec<EnvVar>,
    },
    /// `git init`
    GitInit,
    /// `git status`
    GitStatus,
    /// Stage a path, or everything when absent
    GitAdd {
        /// Path to stage
        path: Option<String>,
    },
    /// Commit staged changes
    GitCommit {
        /// Commit message
        message: String,
    },
    /// Create a branch, optionally switching to it
    GitBranch {
        /// Branch name
        name: String,
        /// Switch to the branch after creating it
        checkout: bool,
    },
    /// Switch branches
    GitCheckout {
        /// Branch name
        branch: String,
    },
    /// Push to a remote
    GitPush {
        /// Remote name
        remote: Option<String>,
        /// Branch name
        branch: Option<String>,
    },
    /// Pull from a remote
    GitPull {
        /// Remote name
        remote: Option<String>,
        /// Branch name
        branch: Option<String>,
    },
    /// Recent commits
    GitLog {
        /// Number of commits
        depth: usize,
    },
    /// Working tree diff
    GitDiff {
        /// Limit to one file
        file: Option<String>,
    },
}

impl Directive {
    /// Kind of this directive
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::TerminalRun { .. } => DirectiveKind::TerminalRun,
            Self::TerminalSequence { .. } => DirectiveKind::TerminalSequence,
            Self::TerminalStart { .. } => DirectiveKind::TerminalStart,
            Self::TerminalStop { .. } => DirectiveKind::TerminalStop,
            Self::FileCreate { .. } => DirectiveKind::FileCreate,
            Self::FileEdit { .. } => DirectiveKind::FileEdit,
            Self::FileDelete { .. } => DirectiveKind::FileDelete,
            Self::FileRename { .. } => DirectiveKind::FileRename,
            Self::FolderCreate { .. } => DirectiveKind::FolderCreate,
            Self::FolderDelete { .. } => DirectiveKind::FolderDelete,
            Self::Build { .. } => DirectiveKind::Build,
            Self::Test { .. } => DirectiveKind::Test,
            Self::Run { .. } => DirectiveKind::Run,
            Self::Dev { .. } => DirectiveKind::Dev,
            Self::Deploy { .. } => DirectiveKind::Deploy,
            Self::GitInit => DirectiveKind::GitInit,
            Self::GitStatus => DirectiveKind::GitStatus,
            Self::GitAdd { .. } => DirectiveKind::GitAdd,
            Self::GitCommit { .. } => DirectiveKind::GitCommit,
            Self::GitBranch { .. } => DirectiveKind::GitBranch,
            Self::GitCheckout { .. } => DirectiveKind::GitCheckout,
            Self::GitPush { .. } => DirectiveKind::GitPush,
            Self::GitPull { .. } => DirectiveKind::GitPull,
            Self::GitLog { .. } => DirectiveKind::GitLog,
            Self::GitDiff { .. } => DirectiveKind::GitDiff,
        }
    }

    /// Domain of this directive
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.kind().domain()
    }

    /// Whether this is a folder operation (run before file operations)
    #[must_use]
    pub fn is_folder_op(&self) -> bool {
        matches!(self, Self::FolderCreate { .. } | Self::FolderDelete { .. })
    }
}
