//! Tests for terminal sessions

use super::testing::ScriptedTerminalRunner;
use super::*;
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;

fn manager(runner: Arc<ScriptedTerminalRunner>) -> SessionManager {
    SessionManager::new(runner)
}

#[tokio::test]
async fn test_execute_command_success() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_exit("npm install", "added 12 packages", 0));
    let sessions = manager(runner.clone());

    let result = sessions
        .execute_command(
            "npm install",
            None,
            CommandLimits::with_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.output, "added 12 packages");
    assert_eq!(runner.created_count(), 1);
}

#[tokio::test]
async fn test_execute_command_caps_output() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_exit("cat big.log", "0123456789", 0));
    let sessions = manager(runner);

    let result = sessions
        .execute_command(
            "cat big.log",
            None,
            CommandLimits {
                timeout: Duration::from_secs(5),
                max_output_bytes: 4,
            },
        )
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.truncated);
    assert_eq!(result.output, "0123");
}

#[tokio::test]
async fn test_execute_command_nonzero_exit() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_exit("false", "", 1));
    let sessions = manager(runner);

    let result = sessions
        .execute_command(
            "false",
            None,
            CommandLimits::with_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.exit_code, Some(1));
}

#[tokio::test]
async fn test_execute_command_timeout_closes_session() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_hang("sleep 100"));
    let sessions = manager(runner.clone());

    let result = sessions
        .execute_command(
            "sleep 100",
            None,
            CommandLimits::with_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.exit_code, None);
    assert!(result.output.contains("[timed out after"), "output: {}", result.output);
    assert_eq!(runner.closed().len(), 1);
}

#[tokio::test]
async fn test_execute_command_create_failure() {
    let runner = Arc::new(ScriptedTerminalRunner::new().failing_create());
    let sessions = manager(runner);

    let result = sessions
        .execute_command(
            "ls",
            None,
            CommandLimits::with_timeout(Duration::from_secs(1)),
        )
        .await;
    assert!(matches!(result, Err(Error::Execution(_))));
}

#[tokio::test]
async fn test_start_named_rejects_duplicate_until_stopped() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_hang("npm run dev"));
    let sessions = manager(runner.clone());

    let first = sessions.start_named("dev", "npm run dev", None).await.unwrap();
    let second = sessions.start_named("dev", "npm run dev", None).await;
    assert!(matches!(second, Err(Error::AlreadyRunning(ref n)) if n == "dev"));
    // The failed start had no side effect
    assert_eq!(runner.created_count(), 1);
    assert_eq!(sessions.named_session("dev"), Some(first.id.clone()));

    sessions.stop_named("dev").await.unwrap();
    assert_eq!(runner.closed(), vec![first.id]);
    assert!(sessions.named_session("dev").is_none());

    let third = sessions.start_named("dev", "npm run dev", None).await;
    assert!(third.is_ok());
}

#[tokio::test]
async fn test_stop_named_unknown_name() {
    let sessions = manager(Arc::new(ScriptedTerminalRunner::new()));
    let result = sessions.stop_named("ghost").await;
    assert!(matches!(result, Err(Error::NotRunning(_))));
}

#[tokio::test]
async fn test_exited_named_process_releases_name() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_hang("npm run dev"));
    let sessions = manager(runner.clone());

    let first = sessions.start_named("dev", "npm run dev", None).await.unwrap();
    runner.exit_session(&first.id, 1);

    let second = sessions.start_named("dev", "npm run dev", None).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_concurrent_named_starts_register_once() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_hang("serve"));
    let sessions = Arc::new(manager(runner));

    let a = {
        let sessions = sessions.clone();
        tokio::spawn(async move { sessions.start_named("web", "serve", None).await })
    };
    let b = {
        let sessions = sessions.clone();
        tokio::spawn(async move { sessions.start_named("web", "serve", None).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(sessions.list_named().len(), 1);
}

#[tokio::test]
async fn test_shutdown_stops_all_named() {
    let runner = Arc::new(ScriptedTerminalRunner::new().with_hang("a").with_hang("b"));
    let sessions = manager(runner.clone());
    sessions.start_named("a", "a", None).await.unwrap();
    sessions.start_named("b", "b", None).await.unwrap();

    sessions.shutdown().await;

    assert!(sessions.list_named().is_empty());
    assert_eq!(runner.closed().len(), 2);
}

// ── Real PTY ─────────────────────────────────────────────────────────────

fn pty_manager(dir: &std::path::Path) -> SessionManager {
    let runner = Arc::new(PtyTerminalRunner::new(ShellConfig::in_dir(dir)));
    SessionManager::new(runner)
}

#[tokio::test]
async fn test_pty_echo() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = pty_manager(dir.path());

    let result = sessions
        .execute_command(
            "echo hello_pty_test",
            None,
            CommandLimits::with_timeout(Duration::from_secs(10)),
        )
        .await
        .unwrap();

    assert!(result.success, "output: {}", result.output);
    assert!(result.output.contains("hello_pty_test"));
}

#[tokio::test]
async fn test_pty_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = pty_manager(dir.path());

    let result = sessions
        .execute_command(
            "(exit 3)",
            None,
            CommandLimits::with_timeout(Duration::from_secs(10)),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.exit_code, Some(3));
}

#[tokio::test]
async fn test_pty_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = pty_manager(dir.path());

    let result = sessions
        .execute_command(
            "sleep 30",
            None,
            CommandLimits::with_timeout(Duration::from_millis(300)),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.output.contains("[timed out after"));
}

#[tokio::test]
async fn test_pty_runs_in_cwd() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let sessions = pty_manager(dir.path());

    let result = sessions
        .execute_command(
            "ls",
            Some(dir.path()),
            CommandLimits::with_timeout(Duration::from_secs(10)),
        )
        .await
        .unwrap();

    assert!(result.output.contains("marker.txt"), "output: {}", result.output);
}
