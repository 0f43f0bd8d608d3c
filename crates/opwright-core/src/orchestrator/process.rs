//! Batch execution loop

use super::core::Orchestrator;
use super::helpers::disabled_outcome;
use crate::batch::OperationBatch;
use crate::directive::{Directive, Domain};
use crate::reporter::BatchSummary;
use crate::results::{DirectiveOutcome, ExecutionResults};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Directives in execution order.
fn phases(batch: &OperationBatch) -> impl Iterator<Item = &Directive> {
    let folders = batch.file.iter().filter(|d| d.is_folder_op());
    let files = batch.file.iter().filter(|d| !d.is_folder_op());
    folders
        .chain(files)
        .chain(batch.terminal.iter())
        .chain(batch.git.iter())
        .chain(batch.build.iter())
        .chain(batch.deploy.iter())
}

impl Orchestrator {
    /// Execute every directive of `batch` and collect the results.
    ///
    /// Each directive resolves exactly once: its outcome is reported before
    /// the next directive starts. Collaborator failures are captured in the
    /// results, never returned.
    #[tracing::instrument(skip(self, batch), fields(directives = batch.len()))]
    pub async fn execute(&self, batch: &OperationBatch) -> ExecutionResults {
        let batch_id = Uuid::new_v4();
        let start = Instant::now();
        info!(batch_id = %batch_id, directives = batch.len(), "Executing batch");
        self.reporter.batch_started(batch_id, batch.len());

        let mut results = ExecutionResults::default();
        for directive in phases(batch) {
            let outcome = self.execute_directive(directive).await;
            self.reporter.directive_resolved(batch_id, &outcome);
            results.record(outcome);
        }

        let summary = BatchSummary {
            directives: batch.len(),
            failed: results.failure_count(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            batch_id = %batch_id,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "Batch completed"
        );
        self.reporter.batch_completed(batch_id, summary);
        results
    }

    /// Execute one directive, checking its domain's permission first
    pub async fn execute_directive(&self, directive: &Directive) -> DirectiveOutcome {
        let domain = directive.domain();
        if !self.store.is_allowed(domain) {
            debug!(domain = %domain, kind = ?directive.kind(), "Domain disabled, directive skipped");
            return disabled_outcome(directive);
        }

        match domain {
            Domain::Terminal => self.run_terminal(directive).await,
            Domain::File => self.run_file(directive).await,
            Domain::Build => self.run_build(directive).await,
            Domain::Deploy => self.run_deploy(directive).await,
            Domain::Git => self.run_git(directive).await,
        }
    }
}
