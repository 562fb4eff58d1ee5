//! Tariff definitions
//!
//! A tariff is a billing rate structure: sampling cadence, batch geometry,
//! value ceilings, and the per-period coefficient table the billing engine
//! folds batches against. Immutable once created; changes require creating a
//! new tariff and repointing future tasks.

pub mod catalog;

use gridmeter_common::{BatchParams, Result, ScheduleError, TariffError, TariffId};
use serde::{Deserialize, Serialize};

/// Tariff creation payload, as submitted by a billing administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTariff {
    pub description: String,
    /// Seconds between samples
    pub sampling_period: u32,
    /// Samples per batch
    pub batch_size: u32,
    /// Upper bound for a single sample value (fixed-point scaled)
    pub max_sample_value: i64,
    /// Ceiling for a task's billed total (fixed-point scaled)
    pub max_tariff_value: i64,
    /// Per-period billing coefficients (fixed-point scaled)
    pub coefficients_by_period: Vec<i64>,
}

impl NewTariff {
    /// Validate the payload before admission to the catalog
    pub fn validate(&self) -> Result<()> {
        if self.coefficients_by_period.is_empty() {
            return Err(TariffError::InvalidTariff("coefficientsByPeriod is empty".into()).into());
        }
        if self.batch_size == 0 {
            return Err(TariffError::InvalidTariff("batchSize must be positive".into()).into());
        }
        if self.sampling_period == 0 {
            return Err(
                TariffError::InvalidTariff("samplingPeriod must be positive".into()).into(),
            );
        }
        if self.max_sample_value <= 0 {
            return Err(
                TariffError::InvalidTariff("maxSampleValue must be positive".into()).into(),
            );
        }
        if self.max_tariff_value <= 0 {
            return Err(
                TariffError::InvalidTariff("maxTariffValue must be positive".into()).into(),
            );
        }
        Ok(())
    }
}

/// An admitted, immutable tariff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    pub id: TariffId,
    pub description: String,
    pub sampling_period: u32,
    pub batch_size: u32,
    pub max_sample_value: i64,
    pub max_tariff_value: i64,
    pub coefficients_by_period: Vec<i64>,
}

impl Tariff {
    /// Build from an already-validated payload; the catalog is the normal
    /// entry point
    pub fn from_new(id: TariffId, new: NewTariff) -> Self {
        Self {
            id,
            description: new.description,
            sampling_period: new.sampling_period,
            batch_size: new.batch_size,
            max_sample_value: new.max_sample_value,
            max_tariff_value: new.max_tariff_value,
            coefficients_by_period: new.coefficients_by_period,
        }
    }

    /// Seconds covered by one batch
    pub fn batch_span(&self) -> i64 {
        self.sampling_period as i64 * self.batch_size as i64
    }

    /// Highest coefficient index a task with `batch` geometry will touch,
    /// plus one. Derived from the `i * batchCnt + j` stride: the last batch
    /// (`i = batchCnt - 1`) reads `c[(batchCnt-1)*batchCnt .. +batchSize]`.
    pub fn required_coefficients(batch: &BatchParams) -> usize {
        // widened so extreme u32 geometries cannot wrap
        let cnt = batch.batch_cnt as u128;
        let size = batch.batch_size as u128;
        let strided = cnt.saturating_sub(1) * cnt + size;
        let sample_count = cnt * size;
        usize::try_from(strided.max(sample_count)).unwrap_or(usize::MAX)
    }

    /// Check the coefficient table covers a task with `batch` geometry
    pub fn check_coverage(&self, batch: &BatchParams) -> Result<()> {
        let required = Self::required_coefficients(batch);
        let actual = self.coefficients_by_period.len();
        if actual < required {
            return Err(ScheduleError::CoefficientTableTooShort { required, actual }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tariff() -> NewTariff {
        NewTariff {
            description: "residential day tariff".into(),
            sampling_period: 3,
            batch_size: 6,
            max_sample_value: 30,
            max_tariff_value: 100_000,
            coefficients_by_period: vec![1, 2, 3, 4, 5, 6],
        }
    }

    #[test]
    fn test_valid_tariff() {
        assert!(new_tariff().validate().is_ok());
    }

    #[test]
    fn test_empty_coefficients_rejected() {
        let mut t = new_tariff();
        t.coefficients_by_period.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut t = new_tariff();
        t.batch_size = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_zero_sampling_period_rejected() {
        let mut t = new_tariff();
        t.sampling_period = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_required_coefficients_single_batch() {
        // batchCnt = 1 reduces to the sample count
        let batch = BatchParams {
            batch_size: 6,
            batch_cnt: 1,
        };
        assert_eq!(Tariff::required_coefficients(&batch), 6);
    }

    #[test]
    fn test_required_coefficients_strided() {
        // batchCnt = 3, batchSize = 2: last batch reads c[6], c[7]
        let batch = BatchParams {
            batch_size: 2,
            batch_cnt: 3,
        };
        assert_eq!(Tariff::required_coefficients(&batch), 8);
    }

    #[test]
    fn test_required_coefficients_extreme_geometry() {
        // degenerate and maximal counts must not wrap or underflow
        let empty = BatchParams {
            batch_size: 6,
            batch_cnt: 0,
        };
        assert_eq!(Tariff::required_coefficients(&empty), 6);

        let huge = BatchParams {
            batch_size: u32::MAX,
            batch_cnt: u32::MAX,
        };
        assert!(Tariff::required_coefficients(&huge) > u32::MAX as usize);
    }

    #[test]
    fn test_coverage_check() {
        let tariff = Tariff::from_new(TariffId::new(), new_tariff());
        let fits = BatchParams {
            batch_size: 6,
            batch_cnt: 1,
        };
        assert!(tariff.check_coverage(&fits).is_ok());

        let too_wide = BatchParams {
            batch_size: 6,
            batch_cnt: 2,
        };
        assert!(tariff.check_coverage(&too_wide).is_err());
    }
}
