//! Decoupled event bus between the submission core and the terminal.
//!
//! The orchestrator and leaderboard emit via [`EventBus::emit`]; the
//! terminal subscribes via [`EventBus::subscribe`] to drive its in-flight
//! indicator. Built on [`tokio::sync::broadcast`] so multiple listeners can
//! react independently.

use tokio::sync::broadcast;

use crate::submission::Phase;

/// Events that flow through the system.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The orchestrator moved to a new phase.
    PhaseChanged { phase: Phase },
    /// A leaderboard fetch started.
    RefreshStarted,
    /// A leaderboard fetch ended. `ok` is false when the previous snapshot was kept.
    RefreshFinished { records: usize, ok: bool },
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(32)
    }
}
