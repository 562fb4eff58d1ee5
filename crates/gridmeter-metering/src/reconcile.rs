//! Reconciliation
//!
//! Independently recomputes a completed task's total from its exported raw
//! batches, using the identical fold as the incremental engine, and compares
//! the two. A mismatch is a data-quality signal reported for operator
//! triage, never an error. Reconciling twice returns the cached record.

use crate::task::lifecycle::TaskLifecycle;
use dashmap::DashMap;
use gridmeter_common::{ReconcileError, ReconciliationRecord, Result, TaskId, TaskStatus};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Cross-checks server-computed totals against raw sensor samples
pub struct ReconciliationService {
    lifecycle: Arc<TaskLifecycle>,
    /// Immutable records by task; a present entry short-circuits recompute
    records: DashMap<TaskId, ReconciliationRecord>,
    /// Per-task guards: at most one in-flight recomputation per task
    in_flight: DashMap<TaskId, Arc<tokio::sync::Mutex<()>>>,
}

impl ReconciliationService {
    pub fn new(lifecycle: Arc<TaskLifecycle>) -> Self {
        Self {
            lifecycle,
            records: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    /// Reconcile a completed task.
    ///
    /// Requires the task in `Completed` (`NotReady` otherwise); idempotent
    /// once a record exists.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, task_id: TaskId) -> Result<ReconciliationRecord> {
        let guard = self
            .in_flight
            .entry(task_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _held = guard.lock().await;

        if let Some(record) = self.records.get(&task_id) {
            return Ok(*record.value());
        }

        let task = self.lifecycle.get(task_id)?;
        let record = {
            let task = task.lock();
            match task.status() {
                TaskStatus::Completed => {}
                status => {
                    return Err(ReconcileError::NotReady {
                        task: task_id,
                        status,
                    }
                    .into())
                }
            }

            let server_total = task.total();
            let batches = task.export_raw_samples();
            let recomputed_total =
                gridmeter_billing::recompute_total(&task.tariff, &task.params.batch, &batches)?;

            ReconciliationRecord {
                task_id,
                server_total,
                recomputed_total,
                matches: server_total == recomputed_total,
            }
        };

        if record.matches {
            info!(task_id = %task_id, total = record.server_total, "reconciliation match");
        } else {
            warn!(
                task_id = %task_id,
                server_total = record.server_total,
                recomputed_total = record.recomputed_total,
                "reconciliation mismatch"
            );
        }

        task.lock().mark_reconciled();
        self.records.insert(task_id, record);
        Ok(record)
    }

    /// Previously produced record, if any
    pub fn record(&self, task_id: TaskId) -> Option<ReconciliationRecord> {
        self.records.get(&task_id).map(|r| *r.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::bootstrapped_topology;
    use gridmeter_billing::{NewTariff, TariffCatalog};
    use gridmeter_common::{CustomerId, MeterError, TaskRequest};

    fn completed_task() -> (Arc<TaskLifecycle>, TaskId) {
        let catalog = Arc::new(TariffCatalog::new());
        let tariff_id = catalog
            .create(NewTariff {
                description: "test".into(),
                sampling_period: 1,
                batch_size: 6,
                max_sample_value: 30,
                max_tariff_value: 100_000,
                coefficients_by_period: vec![1, 2, 3, 4, 5, 6],
            })
            .unwrap();
        let lifecycle = Arc::new(TaskLifecycle::new(
            catalog,
            Arc::new(bootstrapped_topology()),
        ));

        let id = lifecycle
            .create_at(
                TaskRequest {
                    customer_id: CustomerId::new(),
                    start: 105,
                    duration: 6,
                    tariff_id,
                    enable_encryption: false,
                },
                100,
            )
            .unwrap()
            .id;
        lifecycle.tick(105);
        for v in [1, 2, 3, 4, 5, 6] {
            lifecycle.accept_sample(id, v, 105).unwrap();
        }
        lifecycle.tick(106);
        (lifecycle, id)
    }

    #[tokio::test]
    async fn test_reconcile_matches() {
        let (lifecycle, id) = completed_task();
        let service = ReconciliationService::new(lifecycle.clone());

        let record = service.reconcile(id).await.unwrap();
        assert!(record.matches);
        assert_eq!(record.server_total, 91);
        assert_eq!(record.recomputed_total, 91);
        assert_eq!(
            lifecycle.detail(id).unwrap().status,
            TaskStatus::Reconciled
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (lifecycle, id) = completed_task();
        let service = ReconciliationService::new(lifecycle);

        let first = service.reconcile(id).await.unwrap();
        let second = service.reconcile(id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reconcile_before_completion_rejected() {
        let catalog = Arc::new(TariffCatalog::new());
        let tariff_id = catalog
            .create(NewTariff {
                description: "test".into(),
                sampling_period: 1,
                batch_size: 1,
                max_sample_value: 30,
                max_tariff_value: 100,
                coefficients_by_period: vec![1],
            })
            .unwrap();
        let lifecycle = Arc::new(TaskLifecycle::new(
            catalog,
            Arc::new(bootstrapped_topology()),
        ));
        let id = lifecycle
            .create_at(
                TaskRequest {
                    customer_id: CustomerId::new(),
                    start: 105,
                    duration: 1,
                    tariff_id,
                    enable_encryption: false,
                },
                100,
            )
            .unwrap()
            .id;

        let service = ReconciliationService::new(lifecycle);
        let err = service.reconcile(id).await.unwrap_err();
        assert!(matches!(
            err,
            MeterError::Reconcile(ReconcileError::NotReady { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_task_excluded() {
        let catalog = Arc::new(TariffCatalog::new());
        let tariff_id = catalog
            .create(NewTariff {
                description: "test".into(),
                sampling_period: 1,
                batch_size: 1,
                max_sample_value: 30,
                max_tariff_value: 100,
                coefficients_by_period: vec![1],
            })
            .unwrap();
        let lifecycle = Arc::new(TaskLifecycle::new(
            catalog,
            Arc::new(bootstrapped_topology()),
        ));
        let id = lifecycle
            .create_at(
                TaskRequest {
                    customer_id: CustomerId::new(),
                    start: 105,
                    duration: 1,
                    tariff_id,
                    enable_encryption: false,
                },
                100,
            )
            .unwrap()
            .id;
        lifecycle.tick(105);
        lifecycle.accept_sample(id, 5, 105).unwrap();
        // one extra sample beyond the declared batch count fails the task
        assert!(lifecycle.accept_sample(id, 5, 105).is_err());
        assert_eq!(lifecycle.detail(id).unwrap().status, TaskStatus::Failed);

        let service = ReconciliationService::new(lifecycle);
        let err = service.reconcile(id).await.unwrap_err();
        assert!(matches!(
            err,
            MeterError::Reconcile(ReconcileError::NotReady { .. })
        ));
    }
}
