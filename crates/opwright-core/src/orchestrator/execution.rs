//! Per-domain directive handlers

use super::core::Orchestrator;
use super::helpers::{
    build_command, failed_outcome, file_target, git_credentials, git_operation, project_name,
    DEFAULT_DEPLOY_PLATFORM, DEFAULT_DEV_NAME, DEFAULT_REMOTE,
};
use crate::directive::Directive;
use crate::results::{
    BuildResult, DeployResult, DirectiveOutcome, FileOperationResult, GitOperationResult,
    TerminalCommandResult,
};
use opwright_tools::{DeployOptions, Result as ToolResult};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};

impl Orchestrator {
    // ── Terminal ─────────────────────────────────────────────────────────

    pub(crate) async fn run_terminal(&self, directive: &Directive) -> DirectiveOutcome {
        match directive {
            Directive::TerminalRun { command } => {
                DirectiveOutcome::Terminal(self.run_command(command).await)
            }
            Directive::TerminalSequence { commands } => {
                let mut results = Vec::with_capacity(commands.len());
                for command in commands {
                    let result = self.run_command(command).await;
                    let failed = !result.success;
                    results.push(result);
                    if failed {
                        info!(command = %command, "Sequence stopped at failed command");
                        break;
                    }
                }
                DirectiveOutcome::TerminalSequence(results)
            }
            Directive::TerminalStart { name, command } => {
                DirectiveOutcome::Terminal(self.start_process(name, command).await)
            }
            Directive::TerminalStop { name } => {
                let label = format!("stop {}", name);
                let result = match self.sessions.stop_named(name).await {
                    Ok(()) => TerminalCommandResult {
                        success: true,
                        command: label,
                        output: format!("Stopped '{}'", name),
                        exit_code: None,
                        duration_ms: 0,
                        truncated: false,
                    },
                    Err(e) => TerminalCommandResult::failure(label, e.to_string()),
                };
                DirectiveOutcome::Terminal(result)
            }
            other => failed_outcome(other, "not a terminal directive".to_string()),
        }
    }

    /// Run one command in an ephemeral session and record it in the history
    async fn run_command(&self, command: &str) -> TerminalCommandResult {
        let config = self.store.snapshot();
        let result = match self
            .sessions
            .execute_command(command, Some(&config.project_path), config.command_limits())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(command = %command, error = %e, "Command could not be started");
                TerminalCommandResult::failure(command, e.to_string())
            }
        };
        self.reporter.command_executed(&result);
        result
    }

    /// Start a named process and record it in the history
    async fn start_process(&self, name: &str, command: &str) -> TerminalCommandResult {
        let config = self.store.snapshot();
        let start = Instant::now();
        let result = match self
            .sessions
            .start_named(name, command, Some(&config.project_path))
            .await
        {
            Ok(session) => TerminalCommandResult {
                success: true,
                command: command.to_string(),
                output: format!("Started '{}' in session {}", name, session.id),
                exit_code: None,
                duration_ms: start.elapsed().as_millis() as u64,
                truncated: false,
            },
            Err(e) => TerminalCommandResult::failure(command, e.to_string()),
        };
        self.reporter.command_executed(&result);
        result
    }

    // ── Files ────────────────────────────────────────────────────────────

    pub(crate) async fn run_file(&self, directive: &Directive) -> DirectiveOutcome {
        let (operation, path) = file_target(directive);
        let outcome: ToolResult<()> = match directive {
            Directive::FileCreate { path, content } | Directive::FileEdit { path, content } => {
                self.files.write(path, content).await
            }
            Directive::FileDelete { path } => self.files.delete(path).await,
            Directive::FileRename { from, to } => self.files.rename(from, to).await,
            Directive::FolderCreate { path } => self.files.mkdir(path).await,
            Directive::FolderDelete { path } => self.files.remove_dir(path).await,
            other => return failed_outcome(other, "not a file directive".to_string()),
        };
        let result = match outcome {
            Ok(()) => FileOperationResult::ok(operation, path),
            Err(e) => FileOperationResult::failed(operation, path, e.to_string()),
        };
        DirectiveOutcome::File(result)
    }

    // ── Build ────────────────────────────────────────────────────────────

    pub(crate) async fn run_build(&self, directive: &Directive) -> DirectiveOutcome {
        let command = build_command(directive);
        let result = match directive {
            Directive::Build { .. } | Directive::Test { .. } | Directive::Run { .. } => {
                BuildResult::from_command(self.run_command(&command).await)
            }
            Directive::Dev { name, .. } => {
                let name = name.as_deref().unwrap_or(DEFAULT_DEV_NAME);
                let started = self.start_process(name, &command).await;
                BuildResult {
                    success: started.success,
                    command: started.command,
                    errors: if started.success {
                        Vec::new()
                    } else {
                        vec![started.output.clone()]
                    },
                    output: started.output,
                    warnings: Vec::new(),
                    duration_ms: started.duration_ms,
                }
            }
            other => return failed_outcome(other, "not a build directive".to_string()),
        };
        DirectiveOutcome::Build(result)
    }

    // ── Deploy ───────────────────────────────────────────────────────────

    pub(crate) async fn run_deploy(&self, directive: &Directive) -> DirectiveOutcome {
        let Directive::Deploy {
            platform,
            project,
            env,
        } = directive
        else {
            return failed_outcome(directive, "not a deploy directive".to_string());
        };

        let config = self.store.snapshot();
        let Some(token) = config.deployment_token.filter(|t| !t.is_empty()) else {
            warn!("Deploy requested without a deployment token");
            return DirectiveOutcome::Deploy(DeployResult::failed(
                "configuration error: deployment token not set",
            ));
        };

        let platform = platform.as_deref().unwrap_or(DEFAULT_DEPLOY_PLATFORM);
        let project = project
            .clone()
            .unwrap_or_else(|| project_name(&config.project_path));
        let opts = env.iter().fold(DeployOptions::new(platform), |opts, var| {
            opts.with_env(var.name.clone(), var.value.clone())
        });

        let files = match self.files.snapshot().await {
            Ok(files) => files,
            Err(e) => return DirectiveOutcome::Deploy(DeployResult::failed(e.to_string())),
        };
        info!(platform = %platform, project = %project, files = files.len(), "Deploying");

        let result = match self.deploy.deploy(files, &project, &token, &opts).await {
            Ok(outcome) => DeployResult {
                success: true,
                url: outcome.url,
                deployment_id: Some(outcome.id),
                state: outcome.state,
                error: None,
            },
            Err(e) => DeployResult::failed(e.to_string()),
        };
        DirectiveOutcome::Deploy(result)
    }

    // ── Git ──────────────────────────────────────────────────────────────

    pub(crate) async fn run_git(&self, directive: &Directive) -> DirectiveOutcome {
        let operation = git_operation(directive);
        let result = match self.git_data(directive).await {
            Ok(data) => GitOperationResult::ok(operation, data),
            Err(e) => GitOperationResult::failed(operation, e.to_string()),
        };
        DirectiveOutcome::Git(result)
    }

    async fn git_data(&self, directive: &Directive) -> ToolResult<Option<Value>> {
        let git = &self.git;
        let data = match directive {
            Directive::GitInit => json!({ "output": git.init().await? }),
            Directive::GitStatus => to_value(&git.status().await?),
            Directive::GitAdd { path } => {
                match path {
                    Some(path) => git.add(path).await?,
                    None => git.add_all().await?,
                }
                json!({ "path": path.as_deref().unwrap_or(".") })
            }
            Directive::GitCommit { message } => {
                let sha = git.commit(message).await?;
                json!({ "sha": sha, "message": message })
            }
            Directive::GitBranch { name, checkout } => {
                if *checkout {
                    git.checkout(name, true).await?;
                } else {
                    git.create_branch(name).await?;
                }
                json!({ "branch": name, "checkout": checkout })
            }
            Directive::GitCheckout { branch } => {
                git.checkout(branch, false).await?;
                json!({ "branch": branch })
            }
            Directive::GitPush { remote, branch } | Directive::GitPull { remote, branch } => {
                let remote = remote.as_deref().unwrap_or(DEFAULT_REMOTE);
                let creds = git_credentials(&self.store.snapshot());
                let output = if matches!(directive, Directive::GitPush { .. }) {
                    git.push(remote, branch.as_deref(), creds.as_ref()).await?
                } else {
                    git.pull(remote, branch.as_deref(), creds.as_ref()).await?
                };
                json!({ "remote": remote, "branch": branch, "output": output })
            }
            Directive::GitLog { depth } => to_value(&git.log(*depth).await?),
            Directive::GitDiff { file } => json!({ "diff": git.diff(file.as_deref()).await? }),
            _ => {
                return Err(opwright_tools::Error::InvalidInput(
                    "not a git directive".to_string(),
                ))
            }
        };
        Ok(Some(data))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
