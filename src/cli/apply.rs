//! `opwright apply` - execute a response against a project

use super::loader::load_config;
use super::read_input;
use anyhow::{Context, Result};
use clap::Args;
use opwright_core::{
    Collaborators, ConfigStore, EngineEvent, ExecutionReport, Workspace, WorkspaceOptions,
};
use opwright_tools::{
    GitCliBackend, LocalFileStore, PtyTerminalRunner, ShellConfig, VercelDeployBackend,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Response file, or `-` for stdin
    pub input: PathBuf,
    /// Project directory (overrides `project_path`)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
    /// Print results as JSON instead of a report
    #[arg(long)]
    pub json: bool,
    /// Keep named processes (dev servers) running until Ctrl-C
    #[arg(long)]
    pub keep_running: bool,
}

pub async fn run(args: ApplyArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    let mut config = load_config().context("Failed to load configuration")?;
    if let Some(project) = args.project {
        config.project_path = project;
    }
    let project = config.project_path.clone();
    info!(project = %project.display(), "Applying response");

    let collaborators = Collaborators {
        terminal: Arc::new(PtyTerminalRunner::new(ShellConfig::in_dir(&project))),
        files: Arc::new(LocalFileStore::new(&project)),
        git: Arc::new(GitCliBackend::new(&project)),
        deploy: Arc::new(VercelDeployBackend::new().context("Failed to create deploy client")?),
    };
    let store = Arc::new(ConfigStore::in_memory(config));
    let workspace = Workspace::open(store, collaborators, WorkspaceOptions::default());

    // Live terminal output goes to stderr so stdout stays machine-readable
    let mut events = workspace.subscribe();
    let echo = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EngineEvent::TerminalOutput { data, .. }) => {
                    let mut stderr = std::io::stderr().lock();
                    let _ = stderr.write_all(&data);
                    let _ = stderr.flush();
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let applied = workspace.apply(&text).await;

    if args.keep_running && !workspace.sessions().list_named().is_empty() {
        eprintln!("\nNamed processes running. Press Ctrl-C to stop them.");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
    }
    workspace.close().await;
    echo.abort();

    let applied = applied.context("Failed to apply response")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&applied.results)?);
    } else {
        println!("{}", applied.display_text.trim_end());
        println!();
        print!("{}", ExecutionReport::new(&applied.results).render());
    }

    let failed = applied.results.failure_count();
    if failed > 0 {
        eprintln!("{} operation(s) failed", failed);
        std::process::exit(1);
    }
    Ok(())
}
