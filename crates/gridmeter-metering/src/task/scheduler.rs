//! Deadline scheduler
//!
//! One loop with a bounded tick interval drives the wall-clock transitions
//! (`Scheduled → Sampling`, `Sampling → Completed`). Nothing blocks waiting
//! for a deadline; missed deadlines are picked up on the next tick.

use super::lifecycle::TaskLifecycle;
use gridmeter_common::config::MeterConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handle to the running scheduler loop
pub struct Scheduler {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    /// Spawn with the configured tick interval
    pub fn from_config(lifecycle: Arc<TaskLifecycle>, config: &MeterConfig) -> Self {
        Self::spawn(lifecycle, Duration::from_millis(config.scheduler_tick_ms))
    }

    /// Spawn the scheduler loop against the wall clock
    pub fn spawn(lifecycle: Arc<TaskLifecycle>, tick: Duration) -> Self {
        Self::spawn_with_clock(lifecycle, tick, || chrono::Utc::now().timestamp())
    }

    /// Spawn with an injected clock; tests pair this with tokio's paused
    /// time so window transitions run without real sleeps
    pub fn spawn_with_clock<C>(lifecycle: Arc<TaskLifecycle>, tick: Duration, clock: C) -> Self
    where
        C: Fn() -> i64 + Send + 'static,
    {
        let (shutdown, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(tick_ms = tick.as_millis() as u64, "scheduler started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        lifecycle.tick(clock());
                    }
                    _ = stop_rx.changed() => {
                        debug!("scheduler stopping");
                        break;
                    }
                }
            }
        });

        Self { handle, shutdown }
    }

    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
