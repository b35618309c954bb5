use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::{RunId, SessionId};

/// Lifecycle notifications published on the internal bus.
///
/// These are observability signals about sessions and runs. Per-run stream
/// output (tokens, completion) travels separately over the window channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    SessionCreated {
        session_id: SessionId,
    },
    SessionDestroyed {
        session_id: SessionId,
        cancelled_runs: usize,
    },
    RunStarted {
        run_id: RunId,
        session_id: SessionId,
    },
    RunCompleted {
        run_id: RunId,
        session_id: SessionId,
        token_count: usize,
    },
    RunFailed {
        run_id: RunId,
        session_id: SessionId,
        message: String,
    },
    RunCancelled {
        run_id: RunId,
        session_id: SessionId,
    },
    Shutdown,
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Stable dotted name, used as the event name when forwarding to IPC.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionCreated { .. } => "session.created",
            Event::SessionDestroyed { .. } => "session.destroyed",
            Event::RunStarted { .. } => "run.started",
            Event::RunCompleted { .. } => "run.completed",
            Event::RunFailed { .. } => "run.failed",
            Event::RunCancelled { .. } => "run.cancelled",
            Event::Shutdown => "shutdown",
            Event::Unknown => "unknown",
        }
    }
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        tracing::trace!(event = event.name(), "lifecycle event");
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
