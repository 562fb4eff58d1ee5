//! Per-task sampling buffer
//!
//! Accumulates raw sample values into fixed-size batches. A batch that
//! reaches `batchSize` entries is sealed and returned to the caller for
//! folding, exactly once; sealed batches are never reopened and are retained
//! for the lifetime of the task for re-verification.

use gridmeter_common::{BatchParams, Result, SamplingError};

/// Outcome of accepting one sample
#[derive(Debug, PartialEq, Eq)]
pub enum Accepted {
    /// Sample stored; the current batch is still filling
    Buffered,
    /// Sample stored and it completed a batch; the sealed samples are
    /// handed back for folding
    Sealed(Vec<i64>),
}

/// Batch accumulation state for a single task.
///
/// Not synchronized; the owning task serializes access (single writer).
pub struct SamplingBuffer {
    batch: BatchParams,
    max_sample_value: i64,
    /// Sealed batches in sealing order
    sealed: Vec<Vec<i64>>,
    /// The batch currently being filled
    filling: Vec<i64>,
}

impl SamplingBuffer {
    pub fn new(batch: BatchParams, max_sample_value: i64) -> Self {
        Self {
            batch,
            max_sample_value,
            sealed: Vec::with_capacity(batch.batch_cnt as usize),
            filling: Vec::with_capacity(batch.batch_size as usize),
        }
    }

    /// Append one raw sample.
    ///
    /// `OutOfRange` rejects the sample without advancing the buffer;
    /// `BatchIndexOverflow` means the sensor produced more batches than the
    /// declared duration implies (protocol violation, fatal to the task).
    pub fn push(&mut self, value: i64) -> Result<Accepted> {
        if value < 0 || value > self.max_sample_value {
            return Err(SamplingError::OutOfRange {
                value,
                max: self.max_sample_value,
            }
            .into());
        }

        if self.sealed.len() as u32 >= self.batch.batch_cnt && self.filling.is_empty() {
            return Err(SamplingError::BatchIndexOverflow {
                index: self.sealed.len() as u32,
                batch_count: self.batch.batch_cnt,
            }
            .into());
        }

        self.filling.push(value);
        if self.filling.len() as u32 == self.batch.batch_size {
            let full = std::mem::replace(
                &mut self.filling,
                Vec::with_capacity(self.batch.batch_size as usize),
            );
            self.sealed.push(full.clone());
            return Ok(Accepted::Sealed(full));
        }
        Ok(Accepted::Buffered)
    }

    /// Number of sealed batches
    pub fn sealed_count(&self) -> u32 {
        self.sealed.len() as u32
    }

    /// True once all declared batches are sealed
    pub fn is_complete(&self) -> bool {
        self.sealed.len() as u32 == self.batch.batch_cnt
    }

    /// Ordered sealed batches, for reconciliation and raw-sample export.
    /// Read-only; does not affect buffer state.
    pub fn export_raw_samples(&self) -> Vec<Vec<i64>> {
        self.sealed.clone()
    }
}
