//! Billing and reconciliation result payloads

use super::ids::TaskId;
use serde::{Deserialize, Serialize};

/// Running billing state for one task.
///
/// Mutated only by the billing engine, monotonically: `batches_processed`
/// only increases and `total` only accumulates. The exposed total saturates
/// at the tariff ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResult {
    pub task_id: TaskId,
    /// Weighted total, saturated at the tariff's `maxTariffValue`
    pub total: i64,
    pub batches_processed: u32,
}

/// Outcome of one reconciliation pass; immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    pub task_id: TaskId,
    pub server_total: i64,
    pub recomputed_total: i64,
    /// Exact integer equality of the two totals. A mismatch is a
    /// data-quality signal for operator triage, not an error.
    #[serde(rename = "match")]
    pub matches: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_wire_name() {
        let rec = ReconciliationRecord {
            task_id: TaskId::new(),
            server_total: 91,
            recomputed_total: 91,
            matches: true,
        };
        let json = serde_json::to_value(rec).unwrap();
        assert_eq!(json["match"], true);
        assert_eq!(json["serverTotal"], 91);
    }
}
