//! One-shot keep-alive timer.
//!
//! Armed while a persistent connection waits for its next request. Firing
//! and cancelling race with each other; a single atomic transition out of
//! `ARMED` decides the winner, so a connection is never both timed out and
//! handed a request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

struct Shared {
    state: AtomicU8,
    notify: Notify,
}

pub struct KeepAliveTimer {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl KeepAliveTimer {
    /// Starts the timer. Must be called from within a tokio runtime.
    pub fn arm(timeout: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(ARMED),
            notify: Notify::new(),
        });

        let task_shared = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if task_shared
                .state
                .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // Stores a permit if nobody is waiting yet
                task_shared.notify.notify_one();
            }
        });

        Self { shared, task }
    }

    /// Completes once the timer has fired. Never completes after a
    /// successful [`cancel`](Self::cancel).
    pub async fn expired(&self) {
        if self.has_fired() {
            return;
        }
        self.shared.notify.notified().await;
    }

    /// Disarms the timer. Only the call that actually disarmed an armed timer
    /// returns `true`; `false` after a fire means the connection timed out.
    pub fn cancel(&self) -> bool {
        let won = self
            .shared
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.task.abort();
        won
    }

    pub fn has_fired(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == FIRED
    }
}

impl Drop for KeepAliveTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
