//! Guaranteed run cleanup.

use std::sync::Arc;

use chorus_common::{Event, RunId, SessionId};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::cancel::RunCancel;
use super::Inner;
use crate::event::StreamEvent;

/// Releases a run from the session and the run registry exactly once.
///
/// Cleanup happens at the terminal event, or on drop for runs that were
/// cancelled or abandoned by their consumer. A dropped unfinished run also
/// trips its cancellation handle so the backend stops.
pub(super) struct RunGuard {
    inner: Arc<Inner>,
    run_id: RunId,
    session_id: SessionId,
    cancel: RunCancel,
    released: bool,
}

impl RunGuard {
    pub(super) fn new(
        inner: Arc<Inner>,
        run_id: RunId,
        session_id: SessionId,
        cancel: RunCancel,
    ) -> Self {
        Self {
            inner,
            run_id,
            session_id,
            cancel,
            released: false,
        }
    }

    pub(super) fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub(super) fn token(&self) -> CancellationToken {
        self.cancel.token().clone()
    }

    /// Release the run for a terminal event. Non-terminal events are ignored.
    pub(super) fn finish(&mut self, event: &StreamEvent) {
        let lifecycle = match event {
            StreamEvent::Done { token_count, .. } => {
                info!(run_id = %self.run_id, session_id = %self.session_id, token_count, "run completed");
                Event::RunCompleted {
                    run_id: self.run_id.clone(),
                    session_id: self.session_id.clone(),
                    token_count: *token_count,
                }
            }
            StreamEvent::Error { message, kind, .. } => {
                warn!(run_id = %self.run_id, session_id = %self.session_id, ?kind, %message, "run failed");
                Event::RunFailed {
                    run_id: self.run_id.clone(),
                    session_id: self.session_id.clone(),
                    message: message.clone(),
                }
            }
            StreamEvent::Token { .. } | StreamEvent::Thinking { .. } => return,
        };
        self.release(lifecycle);
    }

    fn release(&mut self, lifecycle: Event) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(session) = self.inner.sessions.get(&self.session_id) {
            session.lock().remove_run(&self.run_id);
        }
        self.inner.runs.remove(&self.run_id);
        self.inner.sink.emit(lifecycle);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.cancel.cancel();
        warn!(run_id = %self.run_id, session_id = %self.session_id, "run cancelled");
        self.release(Event::RunCancelled {
            run_id: self.run_id.clone(),
            session_id: self.session_id.clone(),
        });
    }
}
