//! Cooperative cancellation scopes.
//!
//! A scope is a clonable handle with a process-unique identity. Clones share
//! the identity and the flag, so cancelling any clone releases every caller
//! holding that scope. The identity is part of the deduplication key: two
//! callers with different scopes never share an in-flight call, which keeps
//! one caller's cancel from detaching another's request.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct CancelScope {
    id: u64,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelScope {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Stable identity shared by all clones of this scope.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the scope is cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.shared.notify.notified();
            // re-check after registering, a cancel may have landed in between
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}
