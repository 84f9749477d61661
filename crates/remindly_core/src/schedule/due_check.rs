//! Periodic due-check task.
//!
//! # Responsibility
//! - Run `ReminderService::run_due_check` on a fixed cadence.
//! - Tie the task lifetime to an explicit handle.
//!
//! # Invariants
//! - The first pass runs one interval after `start`.
//! - Missed ticks are skipped, never replayed in a burst.
//! - Stopping or dropping the handle aborts the task.

use crate::config::{ConfigError, SchedulerConfig};
use crate::repo::reminder_repo::ReminderRepository;
use crate::service::reminder_service::ReminderService;
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Controller shared between the scheduler and manual callers.
pub type SharedReminderService<R> = Arc<Mutex<ReminderService<R>>>;

/// Handle of a running due-check task.
pub struct DueCheckScheduler {
    handle: JoinHandle<()>,
}

impl DueCheckScheduler {
    /// Starts the due-check on the current tokio runtime using local time.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn start<R>(
        service: SharedReminderService<R>,
        config: &SchedulerConfig,
    ) -> Result<Self, ConfigError>
    where
        R: ReminderRepository + Send + 'static,
    {
        Self::start_with_clock(service, config, || Local::now().naive_local())
    }

    /// Starts the due-check with a caller-provided clock.
    pub fn start_with_clock<R, C>(
        service: SharedReminderService<R>,
        config: &SchedulerConfig,
        clock: C,
    ) -> Result<Self, ConfigError>
    where
        R: ReminderRepository + Send + 'static,
        C: Fn() -> NaiveDateTime + Send + 'static,
    {
        config.validate()?;
        let period = config.due_check_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "event=due_check_start module=schedule status=ok interval_ms={}",
                period.as_millis()
            );

            loop {
                ticker.tick().await;
                let now = clock();
                let report = service.lock().await.run_due_check(now);
                debug!(
                    "event=due_check_tick module=schedule status=ok notified={} auto_completed={}",
                    report.notified.len(),
                    report.auto_completed.len()
                );
            }
        });

        Ok(Self { handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the task. Any pass already holding the service lock completes.
    pub fn stop(self) {
        self.handle.abort();
        info!("event=due_check_stop module=schedule status=ok");
    }
}

impl Drop for DueCheckScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
