//! EventBus - broadcast channel for engine events.
//!
//! Publishes directive resolutions, terminal output and status changes to
//! any number of subscribers. Publishing with no subscribers is a no-op.

use crate::directive::Domain;
use crate::results::DirectiveOutcome;
use crate::status::InteractionStatus;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Directives resolved
    pub directives: usize,
    /// Directives that failed
    pub failed: usize,
    /// Wall-clock duration
    pub duration_ms: u64,
}

/// Events emitted while a workspace processes responses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Batch execution has started
    BatchStarted {
        /// Batch identifier
        batch_id: Uuid,
        /// Number of directives in the batch
        directives: usize,
    },
    /// One directive reached its final result
    DirectiveResolved {
        /// Batch identifier
        batch_id: Uuid,
        /// Directive domain
        domain: Domain,
        /// Final result
        outcome: DirectiveOutcome,
    },
    /// Raw bytes from a terminal session, forwarded as they arrive
    TerminalOutput {
        /// Session identifier
        session_id: String,
        /// Unmodified output bytes
        data: Vec<u8>,
    },
    /// Every directive of the batch has resolved
    BatchCompleted {
        /// Batch identifier
        batch_id: Uuid,
        /// Totals
        summary: BatchSummary,
    },
    /// Interaction status changed
    StatusChanged {
        /// Previous state
        from: InteractionStatus,
        /// New state
        to: InteractionStatus,
    },
}

/// Broadcast-based event bus for engine events.
///
/// Slow subscribers miss events (lagged) rather than blocking the publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all active subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: EngineEvent) -> usize {
        // send() returns Err if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the current number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
