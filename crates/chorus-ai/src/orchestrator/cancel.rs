//! Per-run cancellation handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Cancellation handle owned by one run.
///
/// Clones share state. Only the first [`cancel`](Self::cancel) reports `true`.
#[derive(Debug, Clone)]
pub struct RunCancel {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl RunCancel {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that is cancelled when `parent` is. Cancelling the handle
    /// leaves `parent` untouched.
    pub fn linked_to(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trip the handle. Returns `false` if it was already tripped this way.
    pub fn cancel(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for RunCancel {
    fn default() -> Self {
        Self::new()
    }
}
