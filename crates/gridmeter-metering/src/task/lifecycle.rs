//! Task lifecycle service
//!
//! Creation-time validation, the task registry, sample ingestion, and the
//! deadline-driven transitions evaluated on scheduler ticks.

use super::TaskState;
use crate::topology::TopologyBootstrap;
use gridmeter_billing::TariffCatalog;
use gridmeter_common::{
    BatchParams, FailureReason, Result, SamplingParams, ScheduleError, TaskDetail, TaskError,
    TaskId, TaskRequest, TopologyError,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument};

/// Owner of all task state.
///
/// Each task lives behind its own lock, so sample ingestion, batch sealing,
/// and billing folding for one task are serialized while tasks stay
/// independent of each other.
pub struct TaskLifecycle {
    catalog: Arc<TariffCatalog>,
    topology: Arc<TopologyBootstrap>,
    tasks: DashMap<TaskId, Arc<Mutex<TaskState>>>,
}

impl TaskLifecycle {
    pub fn new(catalog: Arc<TariffCatalog>, topology: Arc<TopologyBootstrap>) -> Self {
        Self {
            catalog,
            topology,
            tasks: DashMap::new(),
        }
    }

    /// Validate and schedule a new task.
    ///
    /// Requires a completed topology bootstrap, an existing tariff, a start
    /// strictly in the future, and a duration that is an exact positive
    /// multiple of `samplingPeriod * batchSize`.
    #[instrument(skip(self, request), fields(customer = %request.customer_id))]
    pub fn create(&self, request: TaskRequest) -> Result<TaskDetail> {
        self.create_at(request, chrono::Utc::now().timestamp())
    }

    /// `create` against an explicit clock; the scheduler and tests drive
    /// time through here
    pub fn create_at(&self, request: TaskRequest, now: i64) -> Result<TaskDetail> {
        if !self.topology.ready_for_tasks() {
            return Err(TopologyError::NotReady(
                "no registered sensor or no bound authority".into(),
            )
            .into());
        }

        let tariff = self.catalog.get(request.tariff_id)?;

        if request.start <= now {
            return Err(ScheduleError::StartNotInFuture {
                start: request.start,
                now,
            }
            .into());
        }

        let batch_span = tariff.batch_span();
        if request.duration <= 0 || request.duration % batch_span != 0 {
            return Err(ScheduleError::NonDivisibleDuration {
                duration: request.duration,
                batch_span,
            }
            .into());
        }

        let batch_cnt = request.duration / batch_span;
        if batch_cnt > u32::MAX as i64 {
            return Err(ScheduleError::BatchCountTooLarge {
                duration: request.duration,
                batch_cnt,
                max: u32::MAX,
            }
            .into());
        }

        let batch = BatchParams {
            batch_size: tariff.batch_size,
            batch_cnt: batch_cnt as u32,
        };
        tariff.check_coverage(&batch)?;

        let params = SamplingParams {
            start: request.start,
            sampling_period: tariff.sampling_period,
            batch,
            max_sample_value: tariff.max_sample_value,
        };

        let id = TaskId::new();
        let task = TaskState::new(
            id,
            request.customer_id,
            tariff,
            params,
            request.enable_encryption,
        );
        let detail = task.detail();
        self.tasks.insert(id, Arc::new(Mutex::new(task)));

        info!(task_id = %id, start = request.start, batches = batch.batch_cnt, "task scheduled");
        Ok(detail)
    }

    /// Deliver one raw sample from the sensor side
    pub fn accept_sample(&self, task_id: TaskId, value: i64, _timestamp: i64) -> Result<()> {
        let task = self.get(task_id)?;
        let mut task = task.lock();
        task.accept_sample(value)
    }

    /// Latest task status and billing snapshot
    pub fn detail(&self, task_id: TaskId) -> Result<TaskDetail> {
        Ok(self.get(task_id)?.lock().detail())
    }

    /// Ordered sealed batches for a task; read-only
    pub fn export_raw_samples(&self, task_id: TaskId) -> Result<Vec<Vec<i64>>> {
        Ok(self.get(task_id)?.lock().export_raw_samples())
    }

    /// Move a task to `Failed` with a diagnostic cause
    pub fn fail(&self, task_id: TaskId, reason: FailureReason) -> Result<()> {
        self.get(task_id)?.lock().fail(reason);
        Ok(())
    }

    /// Evaluate deadline-driven transitions for every task. Called by the
    /// scheduler on each tick; idempotent between deadline crossings.
    pub fn tick(&self, now: i64) {
        for entry in self.tasks.iter() {
            let mut task = entry.value().lock();
            task.begin_sampling(now);
            task.try_complete(now);
        }
    }

    /// Number of known tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn get(&self, task_id: TaskId) -> Result<Arc<Mutex<TaskState>>> {
        self.tasks
            .get(&task_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TaskError::NotFound(task_id).into())
    }
}
