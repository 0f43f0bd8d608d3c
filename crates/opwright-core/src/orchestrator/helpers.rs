//! Orchestrator helpers

use crate::config::EngineConfig;
use crate::directive::Directive;
use crate::permissions::disabled_message;
use crate::results::{
    BuildResult, DeployResult, DirectiveOutcome, FileOperation, FileOperationResult,
    GitOperationResult, TerminalCommandResult,
};
use opwright_tools::GitCredentials;
use std::path::Path;

/// Build command when none is given
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";
/// Test command when none is given
pub const DEFAULT_TEST_COMMAND: &str = "npm test";
/// Run command when none is given
pub const DEFAULT_RUN_COMMAND: &str = "npm start";
/// Dev server command when none is given
pub const DEFAULT_DEV_COMMAND: &str = "npm run dev";
/// Named process the dev server is registered under
pub const DEFAULT_DEV_NAME: &str = "dev";
/// Deployment platform when none is given
pub const DEFAULT_DEPLOY_PLATFORM: &str = "vercel";
/// Remote used by push and pull when none is given
pub const DEFAULT_REMOTE: &str = "origin";

/// Quote `arg` for a POSIX shell
pub(crate) fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '='))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Shell command a build-domain directive runs
pub(crate) fn build_command(directive: &Directive) -> String {
    match directive {
        Directive::Build { command } => command.as_deref().unwrap_or(DEFAULT_BUILD_COMMAND).to_string(),
        Directive::Test { command, pattern } => {
            let base = command.as_deref().unwrap_or(DEFAULT_TEST_COMMAND);
            match pattern {
                Some(pattern) => format!("{} -- {}", base, shell_quote(pattern)),
                None => base.to_string(),
            }
        }
        Directive::Run { command } => command.as_deref().unwrap_or(DEFAULT_RUN_COMMAND).to_string(),
        Directive::Dev { command, .. } => command.as_deref().unwrap_or(DEFAULT_DEV_COMMAND).to_string(),
        other => format!("{:?}", other.kind()),
    }
}

/// Project name derived from the project directory
pub(crate) fn project_name(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("project")
        .to_string()
}

/// Credentials for push and pull, when both parts are configured
pub(crate) fn git_credentials(config: &EngineConfig) -> Option<GitCredentials> {
    match (&config.git_username, &config.git_token) {
        (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
            Some(GitCredentials::new(user.clone(), token.clone()))
        }
        _ => None,
    }
}

/// Operation name reported for a git directive
pub(crate) fn git_operation(directive: &Directive) -> &'static str {
    match directive {
        Directive::GitInit => "init",
        Directive::GitStatus => "status",
        Directive::GitAdd { .. } => "add",
        Directive::GitCommit { .. } => "commit",
        Directive::GitBranch { .. } => "branch",
        Directive::GitCheckout { .. } => "checkout",
        Directive::GitPush { .. } => "push",
        Directive::GitPull { .. } => "pull",
        Directive::GitLog { .. } => "log",
        Directive::GitDiff { .. } => "diff",
        _ => "unknown",
    }
}

/// File operation and display path of a file-domain directive
pub(crate) fn file_target(directive: &Directive) -> (FileOperation, String) {
    match directive {
        Directive::FileCreate { path, .. } => (FileOperation::Create, path.clone()),
        Directive::FileEdit { path, .. } => (FileOperation::Edit, path.clone()),
        Directive::FileDelete { path } => (FileOperation::Delete, path.clone()),
        Directive::FileRename { from, to } => (FileOperation::Rename, format!("{} -> {}", from, to)),
        Directive::FolderCreate { path } => (FileOperation::CreateFolder, path.clone()),
        Directive::FolderDelete { path } => (FileOperation::DeleteFolder, path.clone()),
        other => (FileOperation::Edit, format!("{:?}", other.kind())),
    }
}

/// Command text shown for a terminal-domain directive
pub(crate) fn terminal_command(directive: &Directive) -> String {
    match directive {
        Directive::TerminalRun { command } | Directive::TerminalStart { command, .. } => command.clone(),
        Directive::TerminalSequence { commands } => commands.join(" && "),
        Directive::TerminalStop { name } => format!("stop {}", name),
        other => format!("{:?}", other.kind()),
    }
}

/// Failure result for a directive whose domain is disabled
pub(crate) fn disabled_outcome(directive: &Directive) -> DirectiveOutcome {
    let message = disabled_message(directive.domain());
    failed_outcome(directive, message)
}

/// Failure result of the directive's domain carrying `error`
pub(crate) fn failed_outcome(directive: &Directive, error: String) -> DirectiveOutcome {
    use crate::directive::Domain;
    match directive.domain() {
        Domain::Terminal => {
            DirectiveOutcome::Terminal(TerminalCommandResult::failure(terminal_command(directive), error))
        }
        Domain::File => {
            let (operation, path) = file_target(directive);
            DirectiveOutcome::File(FileOperationResult::failed(operation, path, error))
        }
        Domain::Build => DirectiveOutcome::Build(BuildResult::failed(build_command(directive), error)),
        Domain::Deploy => DirectiveOutcome::Deploy(DeployResult::failed(error)),
        Domain::Git => DirectiveOutcome::Git(GitOperationResult::failed(git_operation(directive), error)),
    }
}
