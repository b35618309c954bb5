//! Per-run stream events.
//!
//! A run emits zero or more `Token`/`Thinking` events followed by at most
//! one terminal event (`Done` xor `Error`). A cancelled run emits no
//! terminal event.

use chorus_common::RunId;
use serde::{Deserialize, Serialize};

/// Category of a surfaced failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Unknown,
    NoCredential,
    SessionNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    /// A content fragment.
    Token { run_id: RunId, text: String },
    /// Advisory status text; not part of the final content.
    Thinking { run_id: RunId, text: String },
    Done {
        run_id: RunId,
        full_content: String,
        /// Number of `Token` events emitted.
        token_count: usize,
    },
    Error {
        run_id: RunId,
        message: String,
        kind: ErrorKind,
    },
}

impl StreamEvent {
    pub fn run_id(&self) -> &RunId {
        match self {
            StreamEvent::Token { run_id, .. }
            | StreamEvent::Thinking { run_id, .. }
            | StreamEvent::Done { run_id, .. }
            | StreamEvent::Error { run_id, .. } => run_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            StreamEvent::Done { .. } | StreamEvent::Error { .. } => true,
            StreamEvent::Token { .. } | StreamEvent::Thinking { .. } => false,
        }
    }
}
