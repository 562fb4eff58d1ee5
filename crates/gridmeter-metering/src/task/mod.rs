//! Task state and transitions

pub mod lifecycle;
pub mod scheduler;

use crate::buffer::{Accepted, SamplingBuffer};
use gridmeter_billing::{BillingAccumulator, Tariff};
use gridmeter_common::{
    CustomerId, FailureReason, Result, SamplingError, SamplingParams, TaskDetail, TaskId,
    TaskStatus,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Full state of one metering task.
///
/// Owned behind a per-task lock; every mutation goes through the owning
/// [`lifecycle::TaskLifecycle`].
pub struct TaskState {
    pub id: TaskId,
    pub customer_id: CustomerId,
    pub tariff: Arc<Tariff>,
    pub params: SamplingParams,
    /// Transport-security flag; carried for the delivery layer, never read
    /// by the billing algorithm
    pub encrypted: bool,

    status: TaskStatus,
    partial: bool,
    failure: Option<FailureReason>,
    out_of_range: u64,

    buffer: SamplingBuffer,
    billing: BillingAccumulator,
}

impl TaskState {
    pub(crate) fn new(
        id: TaskId,
        customer_id: CustomerId,
        tariff: Arc<Tariff>,
        params: SamplingParams,
        encrypted: bool,
    ) -> Self {
        let buffer = SamplingBuffer::new(params.batch, params.max_sample_value);
        let billing = BillingAccumulator::new(id, tariff.clone(), params.batch);
        Self {
            id,
            customer_id,
            tariff,
            params,
            encrypted,
            status: TaskStatus::Scheduled,
            partial: false,
            failure: None,
            out_of_range: 0,
            buffer,
            billing,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Deadline transition `Scheduled → Sampling`; returns true on change
    pub(crate) fn begin_sampling(&mut self, now: i64) -> bool {
        if self.status == TaskStatus::Scheduled && now >= self.params.start {
            self.status = TaskStatus::Sampling;
            info!(task_id = %self.id, "sampling started");
            return true;
        }
        false
    }

    /// Deadline transition `Sampling → Completed`: all batches sealed, or
    /// the sampling window elapsed (whichever first). Returns true on change.
    pub(crate) fn try_complete(&mut self, now: i64) -> bool {
        if self.status != TaskStatus::Sampling {
            return false;
        }
        let all_sealed = self.buffer.is_complete();
        if all_sealed || now >= self.params.end() {
            self.partial = !all_sealed;
            self.status = TaskStatus::Completed;
            info!(
                task_id = %self.id,
                partial = self.partial,
                batches = self.buffer.sealed_count(),
                "task completed"
            );
            return true;
        }
        false
    }

    /// `Completed → Reconciled`; caller (the reconciliation service) has
    /// already produced and stored the record
    pub(crate) fn mark_reconciled(&mut self) {
        if self.status == TaskStatus::Completed {
            self.status = TaskStatus::Reconciled;
        }
    }

    /// Move a non-terminal task to `Failed`, retaining the partial billing
    /// result for diagnostics
    pub(crate) fn fail(&mut self, reason: FailureReason) {
        if self.status.is_terminal() {
            return;
        }
        warn!(task_id = %self.id, ?reason, "task failed");
        self.status = TaskStatus::Failed;
        self.failure = Some(reason);
    }

    /// Accept one raw sample from the sensor side.
    ///
    /// Out-of-range samples are counted against the task and rejected
    /// without halting sampling. A batch overflow is a protocol violation:
    /// the task moves to `Failed` and the error propagates.
    pub(crate) fn accept_sample(&mut self, value: i64) -> Result<()> {
        if self.status != TaskStatus::Sampling {
            return Err(SamplingError::TaskNotActive {
                task: self.id,
                status: self.status,
            }
            .into());
        }

        match self.buffer.push(value) {
            Ok(Accepted::Buffered) => Ok(()),
            Ok(Accepted::Sealed(samples)) => match self.billing.fold_batch(&samples) {
                Ok(()) => Ok(()),
                Err(err) => {
                    self.fail(FailureReason::BatchOverflow);
                    Err(err)
                }
            },
            Err(err) => match err {
                gridmeter_common::MeterError::Sampling(SamplingError::OutOfRange { .. }) => {
                    self.out_of_range += 1;
                    Err(err)
                }
                gridmeter_common::MeterError::Sampling(
                    SamplingError::BatchIndexOverflow { .. },
                ) => {
                    self.fail(FailureReason::BatchOverflow);
                    Err(err)
                }
                other => Err(other),
            },
        }
    }

    pub(crate) fn export_raw_samples(&self) -> Vec<Vec<i64>> {
        self.buffer.export_raw_samples()
    }

    pub(crate) fn sealed_count(&self) -> u32 {
        self.buffer.sealed_count()
    }

    /// Exposed billed total (saturated at the tariff ceiling)
    pub fn total(&self) -> i64 {
        self.billing.total()
    }

    /// Status/detail snapshot for clients
    pub fn detail(&self) -> TaskDetail {
        let result = match self.status {
            TaskStatus::Scheduled => None,
            _ => Some(self.billing.snapshot()),
        };
        TaskDetail {
            id: self.id,
            status: self.status,
            partial: self.partial,
            out_of_range_count: self.out_of_range,
            failure: self.failure.clone(),
            result,
        }
    }
}
