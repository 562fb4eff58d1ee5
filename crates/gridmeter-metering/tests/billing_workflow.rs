//! End-to-end billing workflow
//!
//! Drives the full observed workflow against the in-process services:
//! topology bootstrap → tariff creation → task scheduling → sampling →
//! batched billing → reconciliation. Deadline transitions are driven
//! through explicit ticks so the tests are deterministic.

use gridmeter_billing::{NewTariff, TariffCatalog};
use gridmeter_common::{
    config::MeterConfig, CustomerId, Endpoint, GroupId, TaskRequest, TaskStatus,
};
use gridmeter_metering::{
    run_feed, run_feed_with_capacity, ReconciliationService, SampleSource, TaskLifecycle,
    TopologyBootstrap,
};
use std::sync::Arc;
use tokio::sync::watch;

struct Harness {
    lifecycle: Arc<TaskLifecycle>,
    reconciliation: ReconciliationService,
    catalog: Arc<TariffCatalog>,
}

impl Harness {
    fn new() -> Self {
        let server = Endpoint::new("http", "127.0.0.1", 8080);
        let sensor = Endpoint::new("http", "127.0.0.1", 8081);
        let authority = Endpoint::new("http", "127.0.0.1", 8082);

        let topology = Arc::new(TopologyBootstrap::new());
        topology
            .register_sensor_with_server(sensor.clone(), server.clone())
            .unwrap();
        topology.assign_group(&sensor, GroupId::new()).unwrap();
        topology.register_sensor(&sensor).unwrap();
        topology.bind_authority(server, authority).unwrap();

        let catalog = Arc::new(TariffCatalog::new());
        let lifecycle = Arc::new(TaskLifecycle::new(catalog.clone(), topology));
        let reconciliation = ReconciliationService::new(lifecycle.clone());
        Self {
            lifecycle,
            reconciliation,
            catalog,
        }
    }

    fn simple_tariff(&self) -> gridmeter_common::TariffId {
        self.catalog
            .create(NewTariff {
                description: "residential".into(),
                sampling_period: 1,
                batch_size: 6,
                max_sample_value: 30,
                max_tariff_value: 100_000,
                coefficients_by_period: vec![1, 2, 3, 4, 5, 6],
            })
            .unwrap()
    }

    fn request(&self, tariff_id: gridmeter_common::TariffId, start: i64, duration: i64) -> TaskRequest {
        TaskRequest {
            customer_id: CustomerId::new(),
            start,
            duration,
            tariff_id,
            enable_encryption: false,
        }
    }
}

#[tokio::test]
async fn full_workflow_with_reconciliation() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();

    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();
    assert_eq!(task.status, TaskStatus::Scheduled);

    // sampling window opens
    h.lifecycle.tick(1_005);
    assert_eq!(
        h.lifecycle.detail(task.id).unwrap().status,
        TaskStatus::Sampling
    );

    // one full batch of readings
    for (i, v) in [1, 2, 3, 4, 5, 6].into_iter().enumerate() {
        h.lifecycle
            .accept_sample(task.id, v, 1_005 + i as i64)
            .unwrap();
    }
    h.lifecycle.tick(1_006);

    let detail = h.lifecycle.detail(task.id).unwrap();
    assert_eq!(detail.status, TaskStatus::Completed);
    assert!(!detail.partial);
    let result = detail.result.unwrap();
    assert_eq!(result.total, 91);
    assert_eq!(result.batches_processed, 1);

    // raw export matches what the sensor delivered, in sealing order
    assert_eq!(
        h.lifecycle.export_raw_samples(task.id).unwrap(),
        vec![vec![1, 2, 3, 4, 5, 6]]
    );

    // independent recomputation agrees with the incremental total
    let record = h.reconciliation.reconcile(task.id).await.unwrap();
    assert!(record.matches);
    assert_eq!(record.server_total, 91);
    assert_eq!(
        h.lifecycle.detail(task.id).unwrap().status,
        TaskStatus::Reconciled
    );

    // reconciling again returns the cached record
    let again = h.reconciliation.reconcile(task.id).await.unwrap();
    assert_eq!(record, again);
}

#[tokio::test]
async fn task_with_start_in_past_is_rejected() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();

    let err = h
        .lifecycle
        .create_at(h.request(tariff_id, 999, 6), 1_000)
        .unwrap_err();
    assert!(err.to_string().contains("not in the future"));
}

#[tokio::test]
async fn out_of_range_sample_flags_task_without_failing_it() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();
    h.lifecycle.tick(1_005);

    // 31 exceeds maxSampleValue = 30
    assert!(h.lifecycle.accept_sample(task.id, 31, 1_005).is_err());

    let detail = h.lifecycle.detail(task.id).unwrap();
    assert_eq!(detail.status, TaskStatus::Sampling);
    assert_eq!(detail.out_of_range_count, 1);

    // sampling continues normally afterwards
    for v in [1, 2, 3, 4, 5, 6] {
        h.lifecycle.accept_sample(task.id, v, 1_005).unwrap();
    }
    h.lifecycle.tick(1_006);
    assert_eq!(
        h.lifecycle.detail(task.id).unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn batch_beyond_declared_count_fails_task_and_keeps_result() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();
    h.lifecycle.tick(1_005);

    for v in [1, 2, 3, 4, 5, 6] {
        h.lifecycle.accept_sample(task.id, v, 1_005).unwrap();
    }
    // the single declared batch is sealed; one more sample before the
    // completing tick is a protocol violation
    assert!(h.lifecycle.accept_sample(task.id, 1, 1_005).is_err());

    let detail = h.lifecycle.detail(task.id).unwrap();
    assert_eq!(detail.status, TaskStatus::Failed);
    let result = detail.result.unwrap();
    assert_eq!(result.total, 91);
    assert_eq!(result.batches_processed, 1);
}

#[tokio::test]
async fn reconcile_before_completion_is_not_ready() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();

    let err = h.reconciliation.reconcile(task.id).await.unwrap_err();
    assert!(err.to_string().contains("not ready"));
}

/// Scripted readings, delivered without pacing
struct ScriptedSensor {
    readings: std::vec::IntoIter<i64>,
}

#[async_trait::async_trait]
impl SampleSource for ScriptedSensor {
    async fn next_sample(&mut self) -> Option<(i64, i64)> {
        self.readings.next().map(|v| (v, 0))
    }
}

#[tokio::test]
async fn feed_delivers_scripted_readings_to_completion() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();
    h.lifecycle.tick(1_005);

    let (_stop, stop_rx) = watch::channel(false);
    let source = ScriptedSensor {
        readings: vec![1, 2, 3, 4, 5, 6].into_iter(),
    };
    let accepted = run_feed(h.lifecycle.clone(), task.id, source, stop_rx).await;
    assert_eq!(accepted, 6);

    h.lifecycle.tick(1_006);
    assert_eq!(
        h.lifecycle.detail(task.id).unwrap().result.unwrap().total,
        91
    );
}

#[tokio::test]
async fn feed_honors_configured_channel_capacity() {
    let h = Harness::new();
    let tariff_id = h.simple_tariff();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 6), 1_000)
        .unwrap();
    h.lifecycle.tick(1_005);

    let (_stop, stop_rx) = watch::channel(false);
    let source = ScriptedSensor {
        readings: vec![1, 2, 3, 4, 5, 6].into_iter(),
    };
    // a tiny channel backpressures the reader; every reading still lands
    let mut config = MeterConfig::default();
    config.sample_channel_capacity = 2;
    let accepted = run_feed_with_capacity(
        h.lifecycle.clone(),
        task.id,
        source,
        stop_rx,
        config.sample_channel_capacity,
    )
    .await;
    assert_eq!(accepted, 6);

    h.lifecycle.tick(1_006);
    assert_eq!(
        h.lifecycle.detail(task.id).unwrap().result.unwrap().total,
        91
    );
}

#[tokio::test]
async fn partial_window_reconciles_against_partial_export() {
    let h = Harness::new();
    let tariff_id = h
        .catalog
        .create(NewTariff {
            description: "two-batch".into(),
            sampling_period: 1,
            batch_size: 2,
            max_sample_value: 30,
            max_tariff_value: 100_000,
            coefficients_by_period: vec![5, 3, 2, 7],
        })
        .unwrap();
    let task = h
        .lifecycle
        .create_at(h.request(tariff_id, 1_005, 4), 1_000)
        .unwrap();
    h.lifecycle.tick(1_005);

    // only the first of two batches arrives before the window closes
    h.lifecycle.accept_sample(task.id, 4, 1_005).unwrap();
    h.lifecycle.accept_sample(task.id, 6, 1_006).unwrap();
    h.lifecycle.tick(1_009);

    let detail = h.lifecycle.detail(task.id).unwrap();
    assert_eq!(detail.status, TaskStatus::Completed);
    assert!(detail.partial);
    // batch 0 reads c[0], c[1] with the batchCnt=2 stride: 4*5 + 6*3
    assert_eq!(detail.result.unwrap().total, 38);

    let record = h.reconciliation.reconcile(task.id).await.unwrap();
    assert!(record.matches);
    assert_eq!(record.recomputed_total, 38);
}
