//! Run orchestration.
//!
//! The [`Orchestrator`] owns the session registry and the active-run
//! registry. Each run gets its own cancellation handle, is registered with
//! its session and the run registry, drives the [`StreamingExecutor`], and is
//! released by a drop guard on every exit path.
//!
//! Two delivery modes share one run pipeline:
//! - pull: [`Orchestrator::stream`] returns the events as a `Stream`
//! - push: [`Orchestrator::start`] spawns a task that forwards events to the
//!   [`EventSink`] and returns the run id immediately

mod cancel;
mod guard;
mod registry;
mod request;
mod sink;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_stream::stream;
use chorus_common::{Event, RunId, SessionId, WindowId};
use chorus_config::SessionDefaults;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::event::{ErrorKind, StreamEvent};
use crate::executor::{ExecutorParams, StreamingExecutor};
use crate::provider::{ModelFactory, ProviderResolver};
use crate::session::{Session, SessionOptions, SessionRegistry, SessionSnapshot};

use guard::RunGuard;
use registry::RunRegistry;

pub use cancel::RunCancel;
pub use registry::RunInfo;
pub use request::{RunRequest, StartOptions};
pub use sink::{ChannelSink, EventSink, Target, WindowMessage, STREAM_CHANNEL};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("push-mode runs need a Tokio runtime")]
    NoRuntime,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStatus {
    pub total_sessions: usize,
    /// Sessions with at least one active run.
    pub active_sessions: usize,
    pub active_runs: usize,
}

struct Inner {
    sessions: SessionRegistry,
    runs: RunRegistry,
    resolver: ProviderResolver,
    executor: StreamingExecutor,
    sink: Arc<dyn EventSink>,
}

/// Shared handle; clones refer to the same registries.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        defaults: SessionDefaults,
        resolver: ProviderResolver,
        factory: Arc<dyn ModelFactory>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: SessionRegistry::new(defaults),
                runs: RunRegistry::default(),
                resolver,
                executor: StreamingExecutor::new(factory),
                sink,
            }),
        }
    }

    pub fn create_session(&self, options: SessionOptions) -> SessionSnapshot {
        let snapshot = self.inner.sessions.create(options);
        self.inner.sink.emit(Event::SessionCreated {
            session_id: snapshot.id.clone(),
        });
        snapshot
    }

    pub fn session(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.inner.sessions.snapshot(id)
    }

    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.inner.sessions.list()
    }

    /// Cancel the session's runs, then remove it. `false` for an unknown id.
    pub fn destroy_session(&self, id: &SessionId) -> bool {
        let runs = &self.inner.runs;
        let Some(cancelled_runs) = self.inner.sessions.destroy(id, |run_id| {
            runs.cancel(run_id);
        }) else {
            debug!(session_id = %id, "destroy of unknown session");
            return false;
        };
        self.inner.sink.emit(Event::SessionDestroyed {
            session_id: id.clone(),
            cancelled_runs,
        });
        true
    }

    /// Pull mode: run `request` and return its events.
    ///
    /// The run is registered immediately. Dropping the stream before the
    /// terminal event cancels the run and releases it.
    pub fn stream(
        &self,
        session_id: &SessionId,
        request: RunRequest,
        external_cancel: Option<CancellationToken>,
    ) -> BoxStream<'static, StreamEvent> {
        let Some(session) = self.inner.sessions.get(session_id) else {
            warn!(session_id = %session_id, "stream requested for unknown session");
            let event = StreamEvent::Error {
                run_id: RunId::unassigned(),
                message: OrchestratorError::SessionNotFound(session_id.clone()).to_string(),
                kind: ErrorKind::SessionNotFound,
            };
            return Box::pin(futures_util::stream::once(async move { event }));
        };
        let guard = self.begin_run(session_id, &session, external_cancel.as_ref());
        run_events(Arc::clone(&self.inner), guard, session, request)
    }

    /// Push mode: spawn the run and deliver its events to `target_window`,
    /// or to every window when none is given.
    pub fn start(
        &self,
        session_id: &SessionId,
        request: RunRequest,
        options: StartOptions,
    ) -> Result<RunId, OrchestratorError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;
        let Some(session) = self.inner.sessions.get(session_id) else {
            warn!(session_id = %session_id, "start requested for unknown session");
            return Err(OrchestratorError::SessionNotFound(session_id.clone()));
        };

        let guard = self.begin_run(session_id, &session, options.external_cancel.as_ref());
        let run_id = guard.run_id().clone();
        let mut events = run_events(Arc::clone(&self.inner), guard, session, request);
        let sink = Arc::clone(&self.inner.sink);
        let target = options.target_window;

        runtime.spawn(async move {
            while let Some(event) = events.next().await {
                deliver(sink.as_ref(), target, &event);
            }
        });
        Ok(run_id)
    }

    /// Trip a run's cancellation. `false` if unknown, finished, or already
    /// cancelled. The run unregisters itself once it stops.
    pub fn cancel(&self, run_id: &RunId) -> bool {
        let cancelled = self.inner.runs.cancel(run_id);
        if cancelled {
            info!(run_id = %run_id, "run cancel requested");
        }
        cancelled
    }

    /// Cancel every active run of a session. `false` if it had none.
    pub fn cancel_session(&self, session_id: &SessionId) -> bool {
        let Some(session) = self.inner.sessions.get(session_id) else {
            return false;
        };
        let runs: Vec<RunId> = session.lock().active_runs().cloned().collect();
        for run_id in &runs {
            self.inner.runs.cancel(run_id);
        }
        !runs.is_empty()
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            total_sessions: self.inner.sessions.len(),
            active_sessions: self.inner.sessions.active_count(),
            active_runs: self.inner.runs.len(),
        }
    }

    pub fn list_active_runs(&self) -> Vec<RunInfo> {
        self.inner.runs.list()
    }

    /// Cancel every active run. Returns how many were cancelled.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inner.runs.cancel_all();
        info!(cancelled, "orchestrator shutting down");
        self.inner.sink.emit(Event::Shutdown);
        cancelled
    }

    fn begin_run(
        &self,
        session_id: &SessionId,
        session: &Arc<Mutex<Session>>,
        external_cancel: Option<&CancellationToken>,
    ) -> RunGuard {
        let run_id = RunId::new();
        let cancel = match external_cancel {
            Some(parent) => RunCancel::linked_to(parent),
            None => RunCancel::new(),
        };

        // Registered before joining the session so a concurrent destroy that
        // collects this run can also cancel it.
        self.inner
            .runs
            .register(run_id.clone(), session_id.clone(), cancel.clone());
        if !session.lock().add_run(run_id.clone()) {
            debug!(run_id = %run_id, session_id = %session_id, "session closed during run start");
            cancel.cancel();
        }

        info!(run_id = %run_id, session_id = %session_id, "run started");
        self.inner.sink.emit(Event::RunStarted {
            run_id: run_id.clone(),
            session_id: session_id.clone(),
        });
        RunGuard::new(Arc::clone(&self.inner), run_id, session_id.clone(), cancel)
    }
}

/// The run pipeline shared by both delivery modes.
fn run_events(
    inner: Arc<Inner>,
    mut guard: RunGuard,
    session: Arc<Mutex<Session>>,
    request: RunRequest,
) -> BoxStream<'static, StreamEvent> {
    Box::pin(stream! {
        let run_id = guard.run_id().clone();
        if guard.token().is_cancelled() {
            return;
        }
        let (config, session_history) = {
            let session = session.lock();
            (session.config().clone(), session.history().to_vec())
        };

        let provider_id = request
            .provider_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&config.provider_id);
        let model_id = request
            .model_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| Some(config.model_id.as_str()).filter(|id| !id.is_empty()));

        let provider = match inner.resolver.resolve(Some(provider_id), model_id) {
            Ok(provider) => provider,
            Err(err) => {
                let event = StreamEvent::Error {
                    run_id,
                    message: err.to_string(),
                    kind: ErrorKind::NoCredential,
                };
                guard.finish(&event);
                yield event;
                return;
            }
        };

        let record_history = request.messages.is_none();
        let params = ExecutorParams {
            run_id,
            provider,
            system_prompt: config.system_prompt.clone(),
            history: request.messages.unwrap_or(session_history),
            input: request.prompt.clone(),
            temperature: request.temperature.or(Some(config.temperature)),
            max_tokens: request.max_tokens.or(config.max_tokens),
            graph: config.graph.clone(),
            cancel: guard.token(),
        };

        let mut events = inner.executor.stream(params);
        while let Some(event) = events.next().await {
            if let StreamEvent::Done { full_content, .. } = &event {
                if record_history {
                    session
                        .lock()
                        .append_exchange(request.prompt.clone(), full_content.clone());
                }
            }
            guard.finish(&event);
            yield event;
        }
    })
}

fn deliver(sink: &dyn EventSink, target: Option<WindowId>, event: &StreamEvent) {
    let payload = match serde_json::to_value(event) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(run_id = %event.run_id(), error = %e, "failed to serialize stream event");
            return;
        }
    };
    match target {
        Some(window) => sink.send_to(window, STREAM_CHANNEL, payload),
        None => sink.broadcast(STREAM_CHANNEL, payload),
    }
}
