//! Sampling timing parameters
//!
//! The timing contract for one task: when sampling starts, how often samples
//! arrive, and how they are grouped into batches.

use serde::{Deserialize, Serialize};

/// Batch geometry for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchParams {
    /// Samples per batch
    pub batch_size: u32,
    /// Declared number of batches for the task
    pub batch_cnt: u32,
}

/// Full sampling contract for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    /// Unix timestamp (seconds) when sampling begins
    pub start: i64,
    /// Seconds between samples
    pub sampling_period: u32,
    #[serde(flatten)]
    pub batch: BatchParams,
    /// Upper bound for a single sample value (fixed-point scaled)
    pub max_sample_value: i64,
}

impl SamplingParams {
    /// Total number of samples over the task's lifetime. Widened past u32:
    /// the factors are u32 but their product need not fit one.
    pub fn sample_count(&self) -> u64 {
        self.batch.batch_size as u64 * self.batch.batch_cnt as u64
    }

    /// Task duration in seconds, saturated at `i64::MAX`
    pub fn duration(&self) -> i64 {
        let secs = self.sampling_period as i128 * self.sample_count() as i128;
        i64::try_from(secs).unwrap_or(i64::MAX)
    }

    /// Unix timestamp (seconds) when the sampling window closes
    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SamplingParams {
        SamplingParams {
            start: 1_000,
            sampling_period: 3,
            batch: BatchParams {
                batch_size: 6,
                batch_cnt: 2,
            },
            max_sample_value: 30,
        }
    }

    #[test]
    fn test_derived_counts() {
        let p = params();
        assert_eq!(p.sample_count(), 12);
        assert_eq!(p.duration(), 36);
        assert_eq!(p.end(), 1_036);
    }

    #[test]
    fn test_sample_count_exceeding_u32() {
        let mut p = params();
        p.batch.batch_size = u32::MAX;
        p.batch.batch_cnt = 2;
        assert_eq!(p.sample_count(), 2 * u32::MAX as u64);
    }

    #[test]
    fn test_wire_shape_is_flat() {
        let json = serde_json::to_value(params()).unwrap();
        // batch params flatten into the top-level object on the wire
        assert_eq!(json["batchSize"], 6);
        assert_eq!(json["batchCnt"], 2);
        assert_eq!(json["samplingPeriod"], 3);
    }
}
