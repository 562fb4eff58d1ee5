//! Batched tariff billing engine
//!
//! Folds each sealed batch into a running weighted total, in sealing order,
//! exactly once per batch. Accumulation is append-only: a folded batch is
//! never recomputed, the batch counter never decreases.

use crate::tariff::Tariff;
use gridmeter_common::{BatchParams, BillingResult, Result, SamplingError, TaskId};
use std::sync::Arc;
use tracing::debug;

/// Per-task running billing state.
///
/// Owned exclusively by the task that feeds it; callers serialize folding
/// against batch sealing (single-writer-per-task discipline).
pub struct BillingAccumulator {
    task_id: TaskId,
    tariff: Arc<Tariff>,
    batch: BatchParams,
    /// Raw accumulation; kept unsaturated so folding beyond the ceiling is
    /// still recorded
    raw_total: i128,
    batches_processed: u32,
}

impl BillingAccumulator {
    pub fn new(task_id: TaskId, tariff: Arc<Tariff>, batch: BatchParams) -> Self {
        Self {
            task_id,
            tariff,
            batch,
            raw_total: 0,
            batches_processed: 0,
        }
    }

    /// Fold the next sealed batch into the running total.
    ///
    /// The batch index is implied by sealing order. Fails with
    /// `BatchIndexOverflow` once `batchCnt` batches have been folded.
    pub fn fold_batch(&mut self, samples: &[i64]) -> Result<()> {
        let index = self.batches_processed;
        if index >= self.batch.batch_cnt {
            return Err(SamplingError::BatchIndexOverflow {
                index,
                batch_count: self.batch.batch_cnt,
            }
            .into());
        }

        let contribution = batch_contribution(
            &self.tariff.coefficients_by_period,
            index,
            self.batch.batch_cnt,
            samples,
        )?;

        self.raw_total += contribution;
        self.batches_processed += 1;

        debug!(
            task_id = %self.task_id,
            batch = index,
            contribution,
            total = self.total(),
            "batch folded"
        );
        Ok(())
    }

    /// Exposed total, saturated at the tariff ceiling
    pub fn total(&self) -> i64 {
        self.raw_total.min(self.tariff.max_tariff_value as i128) as i64
    }

    pub fn batches_processed(&self) -> u32 {
        self.batches_processed
    }

    /// Snapshot for status queries
    pub fn snapshot(&self) -> BillingResult {
        BillingResult {
            task_id: self.task_id,
            total: self.total(),
            batches_processed: self.batches_processed,
        }
    }
}

/// Contribution of one batch: `Σ_j s[j] * c[i * batchCnt + j]`.
///
/// The `i * batchCnt + j` stride is the tested billing contract; see the
/// crate docs before touching it.
fn batch_contribution(
    coefficients: &[i64],
    batch_idx: u32,
    batch_cnt: u32,
    samples: &[i64],
) -> Result<i128> {
    let base = batch_idx as usize * batch_cnt as usize;
    let mut sum: i128 = 0;
    for (j, sample) in samples.iter().enumerate() {
        let coeff = coefficients.get(base + j).ok_or_else(|| {
            gridmeter_common::MeterError::Internal(format!(
                "coefficient index {} out of range ({} available)",
                base + j,
                coefficients.len()
            ))
        })?;
        sum += *sample as i128 * *coeff as i128;
    }
    Ok(sum)
}

/// Recompute a task's total from scratch over an exported batch sequence,
/// applying the identical fold as the incremental engine. Used by
/// reconciliation.
pub fn recompute_total(tariff: &Tariff, batch: &BatchParams, batches: &[Vec<i64>]) -> Result<i64> {
    let mut raw: i128 = 0;
    for (idx, samples) in batches.iter().enumerate() {
        raw += batch_contribution(
            &tariff.coefficients_by_period,
            idx as u32,
            batch.batch_cnt,
            samples,
        )?;
    }
    Ok(raw.min(tariff.max_tariff_value as i128) as i64)
}
