//! Health aggregation and the background monitor.

use cellular_runtime::testing::{EchoCell, FailingCell, ScriptedCell};
use cellular_runtime::{
    CellularManager, FanOutOrgan, FanOutTissue, ManagerConfig, MonitorConfig, Organ, Tissue,
};
use cellular_types::{
    CellId, CellularMetrics, CellularStatus, EventKind, EventType, OrganId, OverallStatus,
    ScoringPolicy, TissueId,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monitored(interval_secs: u64) -> ManagerConfig {
    ManagerConfig {
        monitor: MonitorConfig {
            enabled: true,
            interval_secs,
        },
        ..Default::default()
    }
}

fn register_echo(manager: &CellularManager, ids: &[&str]) {
    for id in ids {
        manager
            .register_cell(*id, json!({}), Box::new(EchoCell::new()))
            .unwrap();
    }
}

/// Counts its calls, then panics.
#[derive(Debug, Default)]
struct PanickingScoring {
    calls: Arc<AtomicUsize>,
}

impl ScoringPolicy for PanickingScoring {
    fn health_score(&self, _metrics: &CellularMetrics) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("scoring backend unavailable")
    }

    fn uptime_percentage(&self, _elapsed: Duration, _error_count: u64) -> f64 {
        100.0
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overall_status_follows_healthy_fraction() {
    let manager = CellularManager::new(ManagerConfig::without_monitor());
    register_echo(&manager, &["a", "b", "c", "d"]);
    manager.initialize().await.unwrap();

    assert_eq!(manager.get_system_health().overall_status, OverallStatus::Healthy);

    manager
        .cell(&CellId::new("d"))
        .unwrap()
        .set_status(CellularStatus::Maintenance);
    let report = manager.get_system_health();
    assert_eq!(report.summary.healthy_cells, 3);
    assert_eq!(report.overall_status, OverallStatus::Warning);

    manager
        .cell(&CellId::new("c"))
        .unwrap()
        .set_status(CellularStatus::Degraded);
    assert_eq!(manager.get_system_health().overall_status, OverallStatus::Degraded);

    manager
        .cell(&CellId::new("b"))
        .unwrap()
        .set_status(CellularStatus::Error);
    assert_eq!(manager.get_system_health().overall_status, OverallStatus::Critical);

    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn report_nests_organs_tissues_and_cells() {
    let manager = CellularManager::new(ManagerConfig::without_monitor());
    register_echo(&manager, &["a", "b"]);

    let tissue = Tissue::new("t", Box::new(FanOutTissue::new("pair")));
    tissue.add_cell(manager.cell(&CellId::new("a")).unwrap());
    tissue.add_cell(manager.cell(&CellId::new("b")).unwrap());
    let tissue = manager.register_tissue(tissue).unwrap();

    let organ = Organ::new("o", Box::new(FanOutOrgan::new("single")));
    organ.add_tissue(tissue);
    manager.register_organ(organ).unwrap();

    manager.initialize().await.unwrap();
    let report = manager.get_system_health();

    assert_eq!(report.summary.total_components, 4);
    assert_eq!(report.summary.healthy_components, 4);
    assert_eq!(report.summary.health_percentage, 100.0);
    assert_eq!(report.organs[&OrganId::new("o")].tissues[&TissueId::new("t")].healthy_cells, 2);
    assert!(report.tissues[&TissueId::new("t")].is_healthy);
    assert!(report.error.is_none());

    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn unhealthy_components_do_not_fail_the_report() {
    let manager = CellularManager::new(ManagerConfig::without_monitor());
    manager
        .register_cell("f", json!({}), Box::new(FailingCell::new()))
        .unwrap();
    manager.initialize().await.unwrap();
    manager.process_data(&CellId::new("f"), json!(1)).await;

    let report = manager.get_system_health();
    assert_eq!(report.overall_status, OverallStatus::Critical);
    assert!(report.error.is_none());
    assert_eq!(report.cells[&CellId::new("f")].error_count, 1);

    manager.shutdown().await.unwrap();
}

#[test]
fn panicking_policy_yields_error_report() {
    let manager = CellularManager::with_policy(
        ManagerConfig::without_monitor(),
        Arc::new(PanickingScoring::default()),
    );
    register_echo(&manager, &["a"]);

    let report = manager.get_system_health();
    assert_eq!(report.overall_status, OverallStatus::Error);
    assert!(report.error.is_some());
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn monitor_warns_when_critical() {
    let manager = CellularManager::new(monitored(1));
    manager
        .register_cell("f", json!({}), Box::new(FailingCell::new()))
        .unwrap();

    let warnings = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&warnings);
    manager.register_event_handler(EventType::SystemHealthWarning, move |event| {
        if let EventKind::SystemHealthWarning { overall_status, .. } = &event.kind {
            assert_eq!(*overall_status, OverallStatus::Critical);
        }
        counter.fetch_add(1, Ordering::SeqCst);
    });

    manager.initialize().await.unwrap();
    manager.process_data(&CellId::new("f"), json!(1)).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(warnings.load(Ordering::SeqCst), 1);
    let report = manager.last_health_report().unwrap();
    assert_eq!(report.overall_status, OverallStatus::Critical);

    // The monitor only warns; it never changes component status
    assert_eq!(
        manager.cell(&CellId::new("f")).unwrap().status(),
        CellularStatus::Error
    );

    manager.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn healthy_system_raises_no_warning() {
    let manager = CellularManager::new(monitored(1));
    register_echo(&manager, &["a", "b"]);

    manager.initialize().await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let report = manager.last_health_report().unwrap();
    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert!(manager
        .event_stats()
        .events_by_type
        .iter()
        .all(|(t, _)| *t != EventType::SystemHealthWarning));

    manager.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn monitor_keeps_running_after_failed_iteration() {
    let policy = PanickingScoring::default();
    let calls = Arc::clone(&policy.calls);
    let manager = CellularManager::with_policy(monitored(1), Arc::new(policy));
    register_echo(&manager, &["a"]);
    manager.initialize().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let report = manager.last_health_report().unwrap();
    assert_eq!(report.overall_status, OverallStatus::Error);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    manager.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_monitor() {
    let manager = CellularManager::new(monitored(1));
    register_echo(&manager, &["a"]);
    manager.initialize().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    manager.shutdown().await.unwrap();
    let last = manager.last_health_report().unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(manager.last_health_report().unwrap().timestamp, last.timestamp);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_initialize_leaves_no_monitor() {
    let manager = CellularManager::new(monitored(1));
    manager
        .register_cell(
            "slow",
            json!({}),
            Box::new(ScriptedCell::new().slow_initialize(Duration::from_millis(500))),
        )
        .unwrap();

    let starting = manager.clone();
    let init = tokio::spawn(async move { starting.initialize().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    manager.shutdown().await.unwrap();
    init.await.unwrap().unwrap();
    assert!(!manager.is_running());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(manager.last_health_report().is_none());
}

#[tokio::test]
async fn disabled_monitor_never_reports() {
    let manager = CellularManager::new(ManagerConfig::without_monitor());
    register_echo(&manager, &["a"]);
    manager.initialize().await.unwrap();

    assert!(manager.last_health_report().is_none());
    let report = manager.check_health_now();
    assert_eq!(manager.last_health_report(), Some(report));

    manager.shutdown().await.unwrap();
}
