//! A cloneable handle for poking a thread from external code.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// A cloneable handle for aborting a thread's in-flight send.
///
/// Arc-wrapped internally, so cloning is cheap.
#[derive(Clone)]
pub struct ThreadHandle {
    cancel: Arc<Mutex<CancellationToken>>,
}

impl ThreadHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Abort the in-flight send, if any.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// The current cancellation token, for callers that need to observe
    /// cancellation directly.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Swap in a fresh token for a new invocation and return it.
    pub(crate) fn reset_cancel(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        *self.cancel.lock() = fresh.clone();
        fresh
    }
}
