//! Sensor-side sample delivery
//!
//! A [`SampleSource`] produces raw readings on the task's sampling cadence;
//! [`run_feed`] drives them into the lifecycle until the task leaves the
//! sampling window or the feed is shut down. [`SimulatedSensor`] stands in
//! for metering hardware: uniform random readings in `[0, maxSampleValue]`.

use crate::task::lifecycle::TaskLifecycle;
use async_trait::async_trait;
use gridmeter_common::{
    MeterError, SamplingError, SamplingParams, TaskId, TaskStatus, DEFAULT_SAMPLE_CHANNEL_CAPACITY,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// A source of raw sensor readings for one task
#[async_trait]
pub trait SampleSource: Send {
    /// Next reading as `(value, unix_timestamp)`, or `None` when the source
    /// is exhausted
    async fn next_sample(&mut self) -> Option<(i64, i64)>;
}

/// Mock metering hardware: waits for the task's start, then emits one
/// uniform random reading per sampling period, `sampleCount` times.
pub struct SimulatedSensor {
    params: SamplingParams,
    remaining: u64,
    started: bool,
    rng: StdRng,
}

impl SimulatedSensor {
    pub fn new(params: SamplingParams) -> Self {
        Self {
            params,
            remaining: params.sample_count(),
            started: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic readings for tests
    pub fn with_seed(params: SamplingParams, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(params)
        }
    }
}

#[async_trait]
impl SampleSource for SimulatedSensor {
    async fn next_sample(&mut self) -> Option<(i64, i64)> {
        if self.remaining == 0 {
            return None;
        }

        if !self.started {
            let wait = self.params.start - chrono::Utc::now().timestamp();
            if wait > 0 {
                debug!(seconds = wait, "waiting for sampling start");
                tokio::time::sleep(Duration::from_secs(wait as u64)).await;
            }
            self.started = true;
        }

        tokio::time::sleep(Duration::from_secs(self.params.sampling_period as u64)).await;
        self.remaining -= 1;

        let value = self.rng.gen_range(0..=self.params.max_sample_value);
        Some((value, chrono::Utc::now().timestamp()))
    }
}

/// Deliver samples from `source` into the lifecycle for `task_id`.
///
/// Readings pass through a bounded channel, so a slow delivery side
/// backpressures the reader instead of buffering without limit.
/// Out-of-range readings are logged and skipped; delivery before the task
/// enters `Sampling` (or after it leaves) waits out the race via the next
/// reading; a batch overflow ends the feed (the lifecycle has already moved
/// the task to `Failed`). Returns the number of accepted samples.
pub async fn run_feed(
    lifecycle: Arc<TaskLifecycle>,
    task_id: TaskId,
    source: impl SampleSource + 'static,
    shutdown: watch::Receiver<bool>,
) -> u64 {
    run_feed_with_capacity(
        lifecycle,
        task_id,
        source,
        shutdown,
        DEFAULT_SAMPLE_CHANNEL_CAPACITY,
    )
    .await
}

/// [`run_feed`] with an explicit channel capacity, normally
/// `MeterConfig::sample_channel_capacity`
pub async fn run_feed_with_capacity(
    lifecycle: Arc<TaskLifecycle>,
    task_id: TaskId,
    mut source: impl SampleSource + 'static,
    mut shutdown: watch::Receiver<bool>,
    capacity: usize,
) -> u64 {
    let (tx, mut rx) = mpsc::channel::<(i64, i64)>(capacity);
    let mut reader_shutdown = shutdown.clone();
    let reader = tokio::spawn(async move {
        loop {
            let sample = tokio::select! {
                sample = source.next_sample() => sample,
                _ = reader_shutdown.changed() => break,
            };
            let Some(sample) = sample else { break };
            if tx.send(sample).await.is_err() {
                break;
            }
        }
    });

    let mut accepted: u64 = 0;

    loop {
        let sample = tokio::select! {
            sample = rx.recv() => sample,
            _ = shutdown.changed() => {
                info!(task_id = %task_id, "sample feed shut down");
                break;
            }
        };

        let Some((value, timestamp)) = sample else {
            info!(task_id = %task_id, accepted, "sample source exhausted");
            break;
        };

        match lifecycle.accept_sample(task_id, value, timestamp) {
            Ok(()) => accepted += 1,
            Err(MeterError::Sampling(SamplingError::OutOfRange { value, max })) => {
                warn!(task_id = %task_id, value, max, "out-of-range reading skipped");
            }
            Err(MeterError::Sampling(SamplingError::TaskNotActive { status, .. })) => {
                // terminal or completed: nothing more to deliver
                if status != TaskStatus::Scheduled {
                    info!(task_id = %task_id, ?status, "task no longer sampling, feed ending");
                    break;
                }
            }
            Err(MeterError::Sampling(SamplingError::BatchIndexOverflow { .. })) => {
                warn!(task_id = %task_id, "batch overflow, feed ending");
                break;
            }
            Err(err) => {
                warn!(task_id = %task_id, %err, "sample delivery failed, feed ending");
                break;
            }
        }
    }

    // the reader may be mid-sleep on the sampling cadence
    reader.abort();
    accepted
}
