//! Session registry.

use std::collections::HashMap;
use std::sync::Arc;

use chorus_common::{RunId, SessionId};
use chorus_config::SessionDefaults;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::manager::Session;
use super::types::{SessionConfig, SessionOptions, SessionSnapshot};

/// Owns every live session.
///
/// Each session sits behind its own mutex so history writes from runs
/// finishing concurrently on the same session are serialized.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    defaults: SessionDefaults,
}

impl SessionRegistry {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    pub fn create(&self, options: SessionOptions) -> SessionSnapshot {
        let session = Session::new(SessionConfig::from_options(options, &self.defaults));
        let snapshot = session.snapshot();
        info!(
            session_id = %snapshot.id,
            provider = %snapshot.provider_id,
            "session created"
        );
        self.sessions
            .write()
            .insert(snapshot.id.clone(), Arc::new(Mutex::new(session)));
        snapshot
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn snapshot(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.get(id).map(|session| session.lock().snapshot())
    }

    pub fn list(&self) -> Vec<SessionSnapshot> {
        let mut list: Vec<_> = self
            .sessions
            .read()
            .values()
            .map(|session| session.lock().snapshot())
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|session| session.lock().is_active())
            .count()
    }

    /// Close the session, cancel every run through `cancel_run`, then remove it.
    ///
    /// Closing and collecting the runs happen under the session lock, so a
    /// run registering concurrently is either collected here or refused by
    /// [`Session::add_run`]. Returns `None` for an unknown or already
    /// destroyed id, otherwise the number of runs that were still active.
    pub fn destroy(
        &self,
        id: &SessionId,
        mut cancel_run: impl FnMut(&RunId),
    ) -> Option<usize> {
        let session = self.get(id)?;
        let runs = session.lock().close()?;
        for run_id in &runs {
            cancel_run(run_id);
        }
        self.sessions.write().remove(id)?;
        info!(session_id = %id, cancelled_runs = runs.len(), "session destroyed");
        Some(runs.len())
    }
}
