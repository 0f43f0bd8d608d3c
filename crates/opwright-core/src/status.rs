//! Interaction status state machine
//!
//! ```text
//! idle --send--> thinking --first token--> streaming --complete--> applying --resolved--> idle
//!   \--apply------------------------------------------------------> applying
//! thinking | streaming | applying --failure--> error --(delay)--> idle
//! ```
//!
//! A stream that completes without any token goes straight from thinking to
//! applying. The error state resets itself after a delay unless another
//! transition happened first; `send` and `apply` are accepted from error.

use crate::error::{Error, Result};
use crate::reporter::{EngineEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Default time spent in the error state before returning to idle
pub const DEFAULT_ERROR_RESET_DELAY: Duration = Duration::from_secs(3);

/// Interaction states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    /// Nothing in progress
    Idle,
    /// Request sent, no token yet
    Thinking,
    /// Tokens arriving
    Streaming,
    /// Directives executing
    Applying,
    /// Something failed
    Error,
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Streaming => "streaming",
            Self::Applying => "applying",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Events driving the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    /// Request sent
    Send,
    /// First token received
    FirstToken,
    /// Stream finished
    StreamComplete,
    /// Complete text handed over for execution
    Apply,
    /// Every directive resolved
    AllResolved,
    /// Uncaught failure
    Failure,
    /// Error delay elapsed
    Reset,
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Send => "send",
            Self::FirstToken => "first token",
            Self::StreamComplete => "stream complete",
            Self::Apply => "apply",
            Self::AllResolved => "all resolved",
            Self::Failure => "failure",
            Self::Reset => "reset",
        };
        f.write_str(s)
    }
}

/// Transition table
fn next_state(from: InteractionStatus, event: StatusEvent) -> Option<InteractionStatus> {
    use InteractionStatus::*;
    use StatusEvent::*;
    match (from, event) {
        (Idle | Error, Send) => Some(Thinking),
        (Idle | Error, Apply) => Some(Applying),
        (Thinking, FirstToken) => Some(Streaming),
        (Thinking | Streaming, StreamComplete) => Some(Applying),
        (Applying, AllResolved) => Some(Idle),
        (Thinking | Streaming | Applying, Failure) => Some(Error),
        (Error, Reset) => Some(Idle),
        _ => None,
    }
}

struct Inner {
    state: watch::Sender<InteractionStatus>,
    generation: AtomicU64,
    reset_delay: Duration,
    bus: EventBus,
}

/// Observable interaction status.
#[derive(Clone)]
pub struct StatusMachine {
    inner: Arc<Inner>,
}

impl fmt::Debug for StatusMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusMachine")
            .field("state", &self.current())
            .field("reset_delay", &self.inner.reset_delay)
            .finish()
    }
}

impl StatusMachine {
    /// Machine in the idle state publishing changes to `bus`
    #[must_use]
    pub fn new(bus: EventBus, reset_delay: Duration) -> Self {
        let (state, _) = watch::channel(InteractionStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                state,
                generation: AtomicU64::new(0),
                reset_delay,
                bus,
            }),
        }
    }

    /// Current state
    #[must_use]
    pub fn current(&self) -> InteractionStatus {
        *self.inner.state.borrow()
    }

    /// Receiver notified on every change
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<InteractionStatus> {
        self.inner.state.subscribe()
    }

    /// Apply `event`, returning the new state.
    ///
    /// Entering the error state schedules the automatic reset when a tokio
    /// runtime is available.
    pub fn transition(&self, event: StatusEvent) -> Result<InteractionStatus> {
        let mut outcome: Result<(InteractionStatus, InteractionStatus)> = Err(Error::InvalidTransition {
            from: self.current(),
            event,
        });
        self.inner.state.send_if_modified(|state| match next_state(*state, event) {
            Some(to) => {
                outcome = Ok((*state, to));
                *state = to;
                true
            }
            None => {
                outcome = Err(Error::InvalidTransition {
                    from: *state,
                    event,
                });
                false
            }
        });

        let (from, to) = outcome?;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%from, %to, %event, "Status changed");
        self.inner.bus.publish(EngineEvent::StatusChanged { from, to });

        if to == InteractionStatus::Error {
            self.schedule_reset(generation);
        }
        Ok(to)
    }

    /// Enter the error state from wherever the machine is, if allowed
    pub fn fail(&self) {
        if let Err(e) = self.transition(StatusEvent::Failure) {
            debug!(error = %e, "Failure not recorded in status");
        }
    }

    fn schedule_reset(&self, generation: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, error status will not reset automatically");
            return;
        };
        let machine = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(machine.inner.reset_delay).await;
            if machine.inner.generation.load(Ordering::SeqCst) == generation {
                let _ = machine.transition(StatusEvent::Reset);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(delay: Duration) -> StatusMachine {
        StatusMachine::new(EventBus::new(64), delay)
    }

    #[test]
    fn test_happy_path() {
        let status = machine(DEFAULT_ERROR_RESET_DELAY);
        assert_eq!(status.current(), InteractionStatus::Idle);
        assert_eq!(status.transition(StatusEvent::Send).unwrap(), InteractionStatus::Thinking);
        assert_eq!(
            status.transition(StatusEvent::FirstToken).unwrap(),
            InteractionStatus::Streaming
        );
        assert_eq!(
            status.transition(StatusEvent::StreamComplete).unwrap(),
            InteractionStatus::Applying
        );
        assert_eq!(
            status.transition(StatusEvent::AllResolved).unwrap(),
            InteractionStatus::Idle
        );
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let status = machine(DEFAULT_ERROR_RESET_DELAY);
        let err = status.transition(StatusEvent::FirstToken).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: InteractionStatus::Idle,
                event: StatusEvent::FirstToken
            }
        ));
        assert_eq!(status.current(), InteractionStatus::Idle);
        // Failure is not reachable from idle
        assert!(status.transition(StatusEvent::Failure).is_err());
    }

    #[test]
    fn test_empty_stream_skips_streaming() {
        let status = machine(DEFAULT_ERROR_RESET_DELAY);
        status.transition(StatusEvent::Send).unwrap();
        assert_eq!(
            status.transition(StatusEvent::StreamComplete).unwrap(),
            InteractionStatus::Applying
        );
    }

    #[tokio::test]
    async fn test_error_resets_after_delay() {
        let status = machine(Duration::from_millis(20));
        let mut rx = status.watch();
        status.transition(StatusEvent::Send).unwrap();
        status.transition(StatusEvent::Failure).unwrap();
        assert_eq!(status.current(), InteractionStatus::Error);

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.unwrap();
                if *rx.borrow() == InteractionStatus::Idle {
                    break;
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_newer_transition_cancels_reset() {
        let status = machine(Duration::from_millis(50));
        status.transition(StatusEvent::Apply).unwrap();
        status.transition(StatusEvent::Failure).unwrap();
        status.transition(StatusEvent::Send).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(status.current(), InteractionStatus::Thinking);
    }

    #[tokio::test]
    async fn test_status_changes_published() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let status = StatusMachine::new(bus, DEFAULT_ERROR_RESET_DELAY);

        status.transition(StatusEvent::Apply).unwrap();
        match rx.recv().await.unwrap() {
            EngineEvent::StatusChanged { from, to } => {
                assert_eq!(from, InteractionStatus::Idle);
                assert_eq!(to, InteractionStatus::Applying);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
