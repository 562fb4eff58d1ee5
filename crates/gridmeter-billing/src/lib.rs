//! # Gridmeter Billing
//!
//! Tariff catalog and the batched tariff billing engine.
//!
//! ## Billing Formula
//!
//! For the sealed batch at index `i` (sealing order) with samples
//! `s[0..batchSize)` and coefficient table `c`:
//!
//! ```text
//! contribution(i) = Σ_j  s[j] * c[i * batchCnt + j]
//! total           = Σ_i  contribution(i)        (saturated at maxTariffValue)
//! ```
//!
//! The `i * batchCnt + j` stride lets a task with few batches sample a
//! coarser segment of a shared seasonal coefficient curve. It is a tested
//! contract: reconciliation equality depends on both sides using the
//! identical stride.

pub mod engine;
pub mod tariff;

pub use engine::{recompute_total, BillingAccumulator};
pub use tariff::{catalog::TariffCatalog, NewTariff, Tariff};
