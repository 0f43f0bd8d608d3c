use super::*;
use crate::directive::Domain;
use crate::results::{
    DeployResult, ExecutionResults, FileOperation, FileOperationResult, GitOperationResult,
};

fn command(cmd: &str, success: bool, code: i32, output: &str) -> TerminalCommandResult {
    TerminalCommandResult {
        success,
        command: cmd.to_string(),
        output: output.to_string(),
        exit_code: Some(code),
        duration_ms: 5,
        truncated: false,
    }
}

#[tokio::test]
async fn test_directive_resolved_published_once() {
    let reporter = Reporter::new(EventBus::new(16), Arc::new(CommandHistory::new()));
    let mut rx = reporter.bus().subscribe();
    let batch_id = Uuid::new_v4();

    let outcome = DirectiveOutcome::File(FileOperationResult::ok(FileOperation::Create, "a.ts"));
    reporter.directive_resolved(batch_id, &outcome);

    match rx.recv().await.unwrap() {
        EngineEvent::DirectiveResolved {
            batch_id: id,
            domain,
            outcome: received,
        } => {
            assert_eq!(id, batch_id);
            assert_eq!(domain, Domain::File);
            assert_eq!(received, outcome);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_history_append_and_clear() {
    let history = Arc::new(CommandHistory::new());
    let reporter = Reporter::new(EventBus::default(), history.clone());

    reporter.command_executed(&command("npm install", true, 0, ""));
    reporter.command_executed(&command("npm test", false, 1, "1 failing"));

    let entries = history.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].command, "npm install");
    assert!(!entries[1].result.success);
    assert!(entries[0].timestamp <= entries[1].timestamp);

    history.clear();
    assert!(history.is_empty());
}

#[test]
fn test_event_serialization() {
    let event = EngineEvent::BatchStarted {
        batch_id: Uuid::nil(),
        directives: 3,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "batch_started");
    assert_eq!(json["directives"], 3);
}

#[test]
fn test_report_render() {
    let mut results = ExecutionResults::default();
    results.terminal.push(command("npm install", true, 0, ""));
    results.terminal.push(command("npm test", false, 1, "running\n1 failing\n"));
    results.file.push(FileOperationResult::failed(
        FileOperation::Delete,
        "gone.txt",
        "io error: not found",
    ));
    results.git.push(GitOperationResult::ok("commit", None));
    results.deploy.push(DeployResult::failed("Deploy operations disabled"));

    let text = ExecutionReport::new(&results).render();

    assert!(text.contains("Terminal\n"));
    assert!(text.contains("ok      npm install"));
    assert!(text.contains("FAILED  npm test [Terminal]: exited with code 1: 1 failing"));
    assert!(text.contains("FAILED  delete gone.txt [File]: io error: not found"));
    assert!(text.contains("FAILED  deploy [Deploy]: Deploy operations disabled"));
    assert!(text.contains("ok      commit"));
    assert!(!text.contains("Build\n"));
}

#[test]
fn test_report_empty() {
    let results = ExecutionResults::default();
    assert_eq!(ExecutionReport::new(&results).render(), "No operations\n");
}
