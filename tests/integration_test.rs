//! Integration tests for Opwright
//!
//! These tests drive a whole response through the engine:
//! - opwright-core: extraction, permissions, orchestration, status, sanitizer
//! - opwright-tools: the disk-backed file store and the session manager

use std::path::Path;
use std::sync::Arc;

use opwright_core::testing::{RecordingDeployBackend, RecordingGitBackend};
use opwright_core::{
    Collaborators, ConfigStore, ConfigUpdate, Domain, EngineConfig, EngineEvent, ExecutionReport,
    InteractionStatus, PermissionSet, Workspace, WorkspaceOptions,
};
use opwright_tools::session::testing::ScriptedTerminalRunner;
use opwright_tools::LocalFileStore;

const RESPONSE: &str = r#"I'll scaffold the project.

<folder_create path="src"/>
<file_create path="src/index.js">
console.log("hello");
</file_create>
<file_create path="package.json">{"name": "demo"}</file_create>

Now install and build:

<terminal_sequence>
npm install
npm run lint
</terminal_sequence>
<build/>
<git_init/>
<git_add/>
<git_commit message="Initial commit"/>
<deploy project="demo"/>

Done!"#;

struct Harness {
    workspace: Workspace,
    runner: Arc<ScriptedTerminalRunner>,
    git: Arc<RecordingGitBackend>,
    deploy: Arc<RecordingDeployBackend>,
}

fn harness(root: &Path, config: EngineConfig, runner: ScriptedTerminalRunner) -> Harness {
    let runner = Arc::new(runner);
    let git = Arc::new(RecordingGitBackend::new());
    let deploy = Arc::new(RecordingDeployBackend::new());
    let collaborators = Collaborators {
        terminal: runner.clone(),
        files: Arc::new(LocalFileStore::new(root)),
        git: git.clone(),
        deploy: deploy.clone(),
    };
    let config = EngineConfig {
        project_path: root.to_path_buf(),
        ..config
    };
    let store = Arc::new(ConfigStore::in_memory(config));
    Harness {
        workspace: Workspace::open(store, collaborators, WorkspaceOptions::default()),
        runner,
        git,
        deploy,
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_full_response_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        permissions: PermissionSet::all(),
        deployment_token: Some("token".to_string()),
        ..EngineConfig::default()
    };
    let h = harness(dir.path(), config, ScriptedTerminalRunner::new());

    let applied = h.workspace.apply(RESPONSE).await.unwrap();

    assert_eq!(applied.batch.len(), 9);
    assert_eq!(applied.results.failure_count(), 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/index.js")).unwrap(),
        "console.log(\"hello\");\n"
    );
    assert!(dir.path().join("package.json").is_file());
    assert_eq!(
        h.runner.commands(),
        vec!["npm install", "npm run lint", "npm run build"]
    );
    assert_eq!(
        h.git.calls(),
        vec!["init", "add -A", "commit Initial commit"]
    );

    let deployed = &h.deploy.calls()[0];
    assert_eq!(deployed.project, "demo");
    let mut files = deployed.files.clone();
    files.sort();
    assert_eq!(files, vec!["package.json", "src/index.js"]);

    assert!(applied.display_text.starts_with("I'll scaffold the project."));
    assert!(applied.display_text.contains("[Creating folder]"));
    assert!(applied.display_text.contains("[Deploying project]"));
    assert!(!applied.display_text.contains('<'));
    assert_eq!(h.workspace.status(), InteractionStatus::Idle);
    assert_eq!(h.workspace.history().len(), 3);

    h.workspace.close().await;
}

#[tokio::test]
async fn test_default_permissions_block_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        deployment_token: Some("token".to_string()),
        ..EngineConfig::default()
    };
    let h = harness(dir.path(), config, ScriptedTerminalRunner::new());

    let applied = h.workspace.apply(RESPONSE).await.unwrap();

    assert_eq!(applied.results.failure_count(), 1);
    assert_eq!(
        applied.results.deploy[0].error.as_deref(),
        Some("Deploy operations disabled")
    );
    assert!(h.deploy.calls().is_empty());

    let report = ExecutionReport::new(&applied.results).render();
    assert!(report.contains("FAILED  deploy [Deploy]: Deploy operations disabled"));

    h.workspace.close().await;
}

#[tokio::test]
async fn test_failures_stay_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        permissions: PermissionSet::all().with(Domain::Deploy, false),
        ..EngineConfig::default()
    };
    let runner = ScriptedTerminalRunner::new().with_exit("npm run lint", "3 problems", 1);
    let h = harness(dir.path(), config, runner);

    let text = r#"
<file_delete path="missing.txt"/>
<file_create path="kept.txt">kept</file_create>
<file_create path="../outside.txt">escape</file_create>
<terminal_sequence>
npm install
npm run lint
npm test
</terminal_sequence>
<git_status/>
"#;
    let applied = h.workspace.apply(text).await.unwrap();
    let results = &applied.results;

    assert!(!results.file[0].success);
    assert!(results.file[1].success);
    assert!(!results.file[2].success);
    assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    assert_eq!(results.terminal.len(), 2);
    assert_eq!(h.runner.commands(), vec!["npm install", "npm run lint"]);
    assert!(results.git[0].success);

    h.workspace.close().await;
}

#[tokio::test]
async fn test_config_update_applies_between_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        permissions: PermissionSet::all(),
        ..EngineConfig::default()
    };
    let h = harness(dir.path(), config, ScriptedTerminalRunner::new());

    h.workspace
        .update_config(ConfigUpdate::from_key_value("permissions.file_operations", "false").unwrap())
        .unwrap();
    let applied = h
        .workspace
        .apply(r#"<file_create path="a.txt">a</file_create>"#)
        .await
        .unwrap();

    assert_eq!(
        applied.results.file[0].error.as_deref(),
        Some("File operations disabled")
    );
    assert!(!dir.path().join("a.txt").exists());

    h.workspace.close().await;
}

#[tokio::test]
async fn test_events_published_per_directive() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        permissions: PermissionSet::all(),
        ..EngineConfig::default()
    };
    let h = harness(dir.path(), config, ScriptedTerminalRunner::new());
    let mut events = h.workspace.subscribe();

    h.workspace
        .apply(r#"<folder_create path="a"/><folder_create path="b"/><git_log/>"#)
        .await
        .unwrap();

    let mut resolved = 0;
    let mut statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::DirectiveResolved { .. } => resolved += 1,
            EngineEvent::StatusChanged { to, .. } => statuses.push(to),
            _ => {}
        }
    }
    assert_eq!(resolved, 3);
    assert_eq!(
        statuses,
        vec![InteractionStatus::Applying, InteractionStatus::Idle]
    );

    h.workspace.close().await;
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_persisted_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let store = ConfigStore::persistent(EngineConfig::default(), &path);

    store
        .update(ConfigUpdate::from_key_value("permissions.deploy", "true").unwrap())
        .unwrap();
    store
        .update(ConfigUpdate::from_key_value("command_timeout_secs", "300").unwrap())
        .unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert!(loaded.permissions.deploy);
    assert_eq!(loaded.command_timeout_secs, 300);
    assert_eq!(loaded, store.snapshot());
}
