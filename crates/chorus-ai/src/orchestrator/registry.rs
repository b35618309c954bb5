//! Active-run registry.

use std::collections::HashMap;

use chorus_common::{RunId, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::cancel::RunCancel;

struct ActiveRun {
    session_id: SessionId,
    cancel: RunCancel,
    started_at: DateTime<Utc>,
}

/// Point-in-time view of one active run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: RunId,
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct RunRegistry {
    runs: Mutex<HashMap<RunId, ActiveRun>>,
}

impl RunRegistry {
    pub(crate) fn register(&self, run_id: RunId, session_id: SessionId, cancel: RunCancel) {
        self.runs.lock().insert(
            run_id,
            ActiveRun {
                session_id,
                cancel,
                started_at: Utc::now(),
            },
        );
    }

    pub(crate) fn remove(&self, run_id: &RunId) -> bool {
        self.runs.lock().remove(run_id).is_some()
    }

    /// Trip the run's handle. `false` for unknown or already-cancelled runs.
    pub(crate) fn cancel(&self, run_id: &RunId) -> bool {
        self.runs
            .lock()
            .get(run_id)
            .is_some_and(|run| run.cancel.cancel())
    }

    pub(crate) fn cancel_all(&self) -> usize {
        self.runs
            .lock()
            .values()
            .filter(|run| run.cancel.cancel())
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub(crate) fn list(&self) -> Vec<RunInfo> {
        let mut list: Vec<_> = self
            .runs
            .lock()
            .iter()
            .map(|(run_id, run)| RunInfo {
                run_id: run_id.clone(),
                session_id: run.session_id.clone(),
                started_at: run.started_at,
            })
            .collect();
        list.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        list
    }
}
