//! Session struct and bounded history.

use std::collections::HashSet;

use chorus_common::{RunId, SessionId};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::types::{HistoryMessage, SessionConfig, SessionSnapshot};

/// One conversation: immutable config plus mutable history and run set.
#[derive(Debug)]
pub struct Session {
    pub(super) id: SessionId,
    pub(super) config: SessionConfig,
    pub(super) history: Vec<HistoryMessage>,
    pub(super) active_runs: HashSet<RunId>,
    /// Set once by destroy; no run may join afterwards.
    pub(super) closed: bool,
    pub(super) created_at: DateTime<Utc>,
    pub(super) last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            config,
            history: Vec::new(),
            active_runs: HashSet::new(),
            closed: false,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &[HistoryMessage] {
        &self.history
    }

    /// Record a completed exchange, dropping the oldest pairs past the cap.
    pub fn append_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.history.push(HistoryMessage::user(prompt));
        self.history.push(HistoryMessage::assistant(reply));

        let max = self.config.max_history_messages;
        let mut dropped = 0;
        while self.history.len() > max && self.history.len() >= 2 {
            self.history.drain(..2);
            dropped += 2;
        }
        if dropped > 0 {
            debug!(session_id = %self.id, dropped, "trimmed session history");
        }
        self.touch();
    }

    /// Join a run to the session. `false` once the session is closed.
    pub fn add_run(&mut self, run_id: RunId) -> bool {
        if self.closed {
            return false;
        }
        self.active_runs.insert(run_id);
        self.touch();
        true
    }

    /// Refuse further runs and hand back the ones still active. `None` if
    /// the session was already closed.
    pub fn close(&mut self) -> Option<Vec<RunId>> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(self.active_runs.iter().cloned().collect())
    }

    pub fn remove_run(&mut self, run_id: &RunId) -> bool {
        let removed = self.active_runs.remove(run_id);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn active_runs(&self) -> impl Iterator<Item = &RunId> {
        self.active_runs.iter()
    }

    pub fn is_active(&self) -> bool {
        !self.active_runs.is_empty()
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            provider_id: self.config.provider_id.clone(),
            model_id: self.config.model_id.clone(),
            system_prompt: self.config.system_prompt.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            max_history_messages: self.config.max_history_messages,
            metadata: self.config.metadata.clone(),
            history: self.history.clone(),
            history_length: self.history.len(),
            is_active: self.is_active(),
            active_runs: self.active_runs.len(),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}
