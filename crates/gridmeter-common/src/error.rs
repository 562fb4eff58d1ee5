//! Error types for the Gridmeter system
//!
//! Provides a unified error type and domain-specific error variants

use crate::types::ids::{TariffId, TaskId};
use crate::types::task::TaskStatus;
use thiserror::Error;

/// Result type alias using MeterError
pub type Result<T> = std::result::Result<T, MeterError>;

/// Unified error type for Gridmeter operations
#[derive(Debug, Error)]
pub enum MeterError {
    // Tariff errors
    #[error("Tariff error: {0}")]
    Tariff(#[from] TariffError),

    // Schedule errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    // Sampling errors
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),

    // Task errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    // Topology errors
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    // Reconciliation errors
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tariff validation and lookup errors
#[derive(Debug, Error)]
pub enum TariffError {
    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Tariff not found: {0}")]
    NotFound(TariffId),
}

/// Task scheduling validation errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Start {start} is not in the future (now: {now})")]
    StartNotInFuture { start: i64, now: i64 },

    #[error("Duration {duration}s is not a positive multiple of samplingPeriod*batchSize ({batch_span}s)")]
    NonDivisibleDuration { duration: i64, batch_span: i64 },

    #[error("Duration {duration}s implies {batch_cnt} batches, more than the supported {max}")]
    BatchCountTooLarge {
        duration: i64,
        batch_cnt: i64,
        max: u32,
    },

    #[error("Coefficient table too short: {required} required, {actual} available")]
    CoefficientTableTooShort { required: usize, actual: usize },
}

/// Runtime sampling errors
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Sample value {value} outside [0, {max}]")]
    OutOfRange { value: i64, max: i64 },

    #[error("Task {task} is not sampling (status: {status:?})")]
    TaskNotActive { task: TaskId, status: TaskStatus },

    #[error("Batch index {index} exceeds declared batch count {batch_count}")]
    BatchIndexOverflow { index: u32, batch_count: u32 },
}

/// Task registry errors
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),
}

/// Topology bootstrap ordering errors
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Topology not ready: {0}")]
    NotReady(String),

    #[error("Conflicting bootstrap step: {0}")]
    Conflict(String),
}

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Task {task} not ready for reconciliation (status: {status:?})")]
    NotReady { task: TaskId, status: TaskStatus },
}

// Implement From for common external error types
impl From<serde_json::Error> for MeterError {
    fn from(err: serde_json::Error) -> Self {
        MeterError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MeterError {
    fn from(err: anyhow::Error) -> Self {
        MeterError::Internal(err.to_string())
    }
}
