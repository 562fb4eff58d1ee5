//! # Gridmeter Metering
//!
//! The metering task lifecycle: topology bootstrap, task scheduling,
//! real-time sample batching, billing folding, and reconciliation.
//!
//! ## Task lifecycle
//!
//! ```text
//! Scheduled → Sampling → Completed → Reconciled
//!     \           \          \
//!      └───────────┴──────────┴──→ Failed
//! ```
//!
//! `Scheduled → Sampling` and `Sampling → Completed` are deadline-driven,
//! evaluated by a dedicated scheduler loop with a bounded tick interval.
//! Everything else is caller-triggered.
//!
//! Each task's buffer, billing state, and lifecycle state live behind one
//! per-task lock; the only cross-task shared state is the read-only tariff
//! catalog.

pub mod buffer;
pub mod reconcile;
pub mod sensor;
pub mod task;
pub mod topology;

pub use reconcile::ReconciliationService;
pub use sensor::{run_feed, run_feed_with_capacity, SampleSource, SimulatedSensor};
pub use task::{lifecycle::TaskLifecycle, scheduler::Scheduler};
pub use topology::TopologyBootstrap;
