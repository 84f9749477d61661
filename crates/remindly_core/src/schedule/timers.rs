//! Cancellable one-shot notification timers.
//!
//! # Responsibility
//! - Arm one delayed notification per reminder occurrence.
//! - Cancel armed timers when the occurrence is completed or deleted.
//!
//! # Invariants
//! - At most one armed timer per reminder id; re-arming replaces the old one.
//! - Dropping `NotificationTimers` cancels every pending timer.
//! - Arming outside a tokio runtime is a logged no-op.

use crate::model::reminder::ReminderId;
use crate::notify::{dispatch_best_effort, Notification, NotificationDispatcher};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Registry of pending one-shot notification tasks keyed by reminder id.
pub struct NotificationTimers {
    dispatcher: Arc<dyn NotificationDispatcher>,
    pending: HashMap<ReminderId, JoinHandle<()>>,
}

impl NotificationTimers {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            dispatcher,
            pending: HashMap::new(),
        }
    }

    /// Schedules `notification` to fire after `delay`.
    ///
    /// Returns `false` when no tokio runtime is available on this thread.
    pub fn arm(&mut self, id: ReminderId, delay: Duration, notification: Notification) -> bool {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("event=timer_arm module=schedule status=skipped reason=no_runtime");
                return false;
            }
        };

        self.prune_finished();
        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            dispatch_best_effort(dispatcher.as_ref(), &notification);
        });

        if let Some(previous) = self.pending.insert(id, handle) {
            previous.abort();
        }
        debug!(
            "event=timer_arm module=schedule status=ok delay_ms={}",
            delay.as_millis()
        );
        true
    }

    /// Cancels the timer of one reminder. Returns whether one was pending.
    pub fn cancel(&mut self, id: ReminderId) -> bool {
        match self.pending.remove(&id) {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    /// Whether a timer for `id` is armed and has not fired yet.
    pub fn is_armed(&self, id: ReminderId) -> bool {
        self.pending
            .get(&id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of timers that have not fired yet.
    pub fn armed_count(&self) -> usize {
        self.pending
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn prune_finished(&mut self) {
        self.pending.retain(|_, handle| !handle.is_finished());
    }
}

impl Drop for NotificationTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
