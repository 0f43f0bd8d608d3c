//! Reporter - progress events and command history
//!
//! - `events`: [`EventBus`] broadcasting [`EngineEvent`]s
//! - `history`: append-only [`CommandHistory`]
//! - `report`: [`ExecutionReport`] text rendering

mod events;
mod history;
mod report;

#[cfg(test)]
mod tests;

pub use events::{BatchSummary, EngineEvent, EventBus};
pub use history::{CommandHistory, CommandHistoryEntry};
pub use report::ExecutionReport;

use crate::results::{DirectiveOutcome, TerminalCommandResult};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Receives directive results and terminal commands from the orchestrator.
#[derive(Debug, Clone)]
pub struct Reporter {
    bus: EventBus,
    history: Arc<CommandHistory>,
}

impl Reporter {
    /// Reporter publishing to `bus` and appending to `history`
    #[must_use]
    pub fn new(bus: EventBus, history: Arc<CommandHistory>) -> Self {
        Self { bus, history }
    }

    /// Event bus
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Command history
    #[must_use]
    pub fn history(&self) -> &Arc<CommandHistory> {
        &self.history
    }

    /// A batch is about to run
    pub fn batch_started(&self, batch_id: Uuid, directives: usize) {
        self.bus.publish(EngineEvent::BatchStarted {
            batch_id,
            directives,
        });
    }

    /// A directive reached its final result; called exactly once per directive
    pub fn directive_resolved(&self, batch_id: Uuid, outcome: &DirectiveOutcome) {
        let domain = outcome.domain();
        if outcome.success() {
            debug!(batch_id = %batch_id, domain = %domain, "Directive succeeded");
        } else {
            warn!(batch_id = %batch_id, domain = %domain, "Directive failed");
        }
        self.bus.publish(EngineEvent::DirectiveResolved {
            batch_id,
            domain,
            outcome: outcome.clone(),
        });
    }

    /// A terminal command finished
    pub fn command_executed(&self, result: &TerminalCommandResult) {
        self.history.append(result.clone());
    }

    /// Every directive of the batch resolved
    pub fn batch_completed(&self, batch_id: Uuid, summary: BatchSummary) {
        self.bus.publish(EngineEvent::BatchCompleted { batch_id, summary });
    }
}
