//! # Gridmeter Common
//!
//! Shared types, errors, and configuration for the Gridmeter metering and
//! tariff billing engine.
//!
//! ## Core Types
//!
//! - [`types::ids`]: typed identifiers for tasks, tariffs, customers, groups
//! - [`types::endpoint::Endpoint`]: Server/Sensor/Authority endpoint identity
//! - [`types::sampling::SamplingParams`]: the timing contract for one task
//! - [`types::task`]: task status, creation request, and detail payloads
//! - [`types::billing`]: billing result and reconciliation record payloads
//!
//! ## Numeric domain
//!
//! Sample values, coefficients, and tariff limits are fixed-point scaled
//! integers; callers scale before the values enter the core. Totals
//! accumulate in `i128` and are exposed saturated at the tariff ceiling.
//! Server and sensor must scale identically for reconciliation equality to
//! hold.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    MeterError, ReconcileError, Result, SamplingError, ScheduleError, TariffError, TaskError,
    TopologyError,
};
pub use types::{
    billing::{BillingResult, ReconciliationRecord},
    endpoint::Endpoint,
    ids::{CustomerId, GroupId, SensorId, TariffId, TaskId},
    sampling::{BatchParams, SamplingParams},
    task::{FailureReason, TaskDetail, TaskRequest, TaskStatus},
};

/// Gridmeter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default scheduler tick interval in milliseconds
pub const DEFAULT_SCHEDULER_TICK_MS: u64 = 250;

/// Default capacity of a per-task sample delivery channel
pub const DEFAULT_SAMPLE_CHANNEL_CAPACITY: usize = 1024;
