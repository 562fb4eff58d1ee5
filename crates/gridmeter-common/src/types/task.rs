//! Task boundary payloads and status

use super::billing::BillingResult;
use super::ids::{CustomerId, TariffId, TaskId};
use serde::{Deserialize, Serialize};

/// Task lifecycle states.
///
/// `Scheduled → Sampling → Completed → Reconciled`, with a terminal
/// `Failed` reachable from any non-terminal state. Tasks are admitted
/// directly as `Scheduled`; creation-time validation leaves no observable
/// state before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Scheduled,
    Sampling,
    Completed,
    Reconciled,
    Failed,
}

impl TaskStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Reconciled | TaskStatus::Failed)
    }
}

/// Diagnostic cause retained by every failed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// Sensor produced more batches than the declared duration implies
    BatchOverflow,
    /// Unrecoverable internal error
    Internal(String),
}

/// Task creation request, as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub customer_id: CustomerId,
    /// Unix timestamp (seconds); must be strictly in the future
    pub start: i64,
    /// Seconds; must be an exact positive multiple of
    /// `samplingPeriod * batchSize` of the referenced tariff
    pub duration: i64,
    pub tariff_id: TariffId,
    /// Transport-security mode for sample delivery. Carried on the task but
    /// never alters the billing algorithm.
    pub enable_encryption: bool,
}

/// Task status/detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Completed with fewer than the declared number of sealed batches
    pub partial: bool,
    /// Samples rejected for exceeding the tariff's maximum
    pub out_of_range_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// Present once sampling has started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BillingResult>,
}
