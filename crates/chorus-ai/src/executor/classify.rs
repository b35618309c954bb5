//! Failure classification for stream errors.

use chorus_common::RunId;
use tokio_util::sync::CancellationToken;

use crate::event::{ErrorKind, StreamEvent};
use crate::AiError;

pub(crate) const AUTH_MESSAGE: &str =
    "Authentication failed: the API key for this provider was rejected. Update it in settings and try again.";
pub(crate) const RATE_LIMIT_MESSAGE: &str =
    "The provider is rate limiting requests. Wait a moment and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureClass {
    /// Cancellation surfaced as an error. Never reported.
    Abort,
    Auth,
    RateLimit,
    Unknown,
}

pub(crate) fn classify(err: &AiError) -> FailureClass {
    match err {
        AiError::Aborted => return FailureClass::Abort,
        AiError::Unauthorized(_) => return FailureClass::Auth,
        AiError::RateLimited => return FailureClass::RateLimit,
        _ => {}
    }

    let message = err.to_string().to_lowercase();
    if message.contains("abort") || message.contains("cancel") {
        FailureClass::Abort
    } else if ["401", "unauthorized", "invalid api key", "incorrect api key"]
        .iter()
        .any(|needle| message.contains(needle))
    {
        FailureClass::Auth
    } else if ["429", "rate limit", "too many requests"]
        .iter()
        .any(|needle| message.contains(needle))
    {
        FailureClass::RateLimit
    } else {
        FailureClass::Unknown
    }
}

/// Terminal event for a failed stream, or `None` when the failure is an
/// abort or the run was already cancelled.
pub(crate) fn failure_event(
    run_id: &RunId,
    err: &AiError,
    cancel: &CancellationToken,
) -> Option<StreamEvent> {
    if cancel.is_cancelled() {
        return None;
    }
    let (kind, message) = match classify(err) {
        FailureClass::Abort => return None,
        FailureClass::Auth => (ErrorKind::Auth, AUTH_MESSAGE.to_string()),
        FailureClass::RateLimit => (ErrorKind::RateLimit, RATE_LIMIT_MESSAGE.to_string()),
        FailureClass::Unknown => (ErrorKind::Unknown, format!("Chat stream failed: {err}")),
    };
    Some(StreamEvent::Error {
        run_id: run_id.clone(),
        message,
        kind,
    })
}
