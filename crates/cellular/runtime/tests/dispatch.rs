//! Dispatch through the manager: single-target processing and broadcast
//! along the connection graph.

use cellular_runtime::testing::{
    EchoCell, FailingCell, OverlapCell, PanickingCell, ScriptedCell, SlowCell,
};
use cellular_runtime::{CellularManager, DispatchOptions, ManagerConfig};
use cellular_types::{CellId, CellularStatus, ConnectionType};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager() -> CellularManager {
    CellularManager::new(ManagerConfig::without_monitor())
}

fn id(s: &str) -> CellId {
    CellId::new(s)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_without_edges_is_empty() {
    let manager = manager();
    manager
        .register_cell("x", json!({}), Box::new(EchoCell::new()))
        .unwrap();

    let results = manager.broadcast_data(&id("x"), json!({"v": 1}), None).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn broadcast_from_unknown_source_is_empty() {
    let results = manager()
        .broadcast_data(&id("ghost"), json!({"v": 1}), None)
        .await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn broadcast_follows_direction() {
    let manager = manager();
    manager
        .register_cell("x", json!({}), Box::new(ScriptedCell::new()))
        .unwrap();
    manager
        .register_cell("y", json!({}), Box::new(ScriptedCell::new()))
        .unwrap();
    assert!(manager.create_connection("x", "y", ConnectionType::TissueInternal, 0.8, false));

    let from_x = manager.broadcast_data(&id("x"), json!({"v": 1}), None).await;
    assert_eq!(from_x.len(), 1);
    assert_eq!(
        from_x[&id("y")],
        Some(json!({"cell": "y", "input": {"v": 1}}))
    );

    let from_y = manager.broadcast_data(&id("y"), json!({"v": 1}), None).await;
    assert!(from_y.is_empty());
}

#[tokio::test]
async fn failing_target_is_isolated() {
    let manager = manager();
    manager
        .register_cell("x", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    let y = manager
        .register_cell("y", json!({}), Box::new(FailingCell::new()))
        .unwrap();
    let z = manager
        .register_cell("z", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager.create_connection("x", "y", ConnectionType::TissueInternal, 0.8, false);
    manager.create_connection("x", "z", ConnectionType::TissueInternal, 0.8, false);

    let results = manager.broadcast_data(&id("x"), json!({"v": 1}), None).await;

    assert_eq!(results[&id("y")], None);
    assert_eq!(results[&id("z")], Some(json!({"v": 1})));
    assert_eq!(y.metrics().error_count, 1);
    assert!(y.last_error().is_some());
    assert_eq!(y.status(), CellularStatus::Error);
    assert_eq!(z.metrics().success_count, 1);
}

#[tokio::test]
async fn panicking_target_is_isolated() {
    let manager = manager();
    manager
        .register_cell("x", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    let p = manager
        .register_cell("p", json!({}), Box::new(PanickingCell::new()))
        .unwrap();
    let z = manager
        .register_cell("z", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager.initialize().await.unwrap();
    manager.create_connection("x", "p", ConnectionType::TissueInternal, 0.8, false);
    manager.create_connection("x", "z", ConnectionType::TissueInternal, 0.8, false);

    let results = manager.broadcast_data(&id("x"), json!({"v": 1}), None).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[&id("p")], None);
    assert_eq!(results[&id("z")], Some(json!({"v": 1})));
    assert_eq!(p.status(), CellularStatus::Error);
    assert_eq!(p.metrics().error_count, 1);
    assert!(p.last_error().unwrap().contains("scripted panic"));
    assert_eq!(z.metrics().success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn broadcast_runs_targets_concurrently() {
    let delay = Duration::from_millis(100);
    let manager = manager();
    manager
        .register_cell("hub", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    for i in 0..5 {
        let name = format!("slow-{i}");
        manager
            .register_cell(name.as_str(), json!({}), Box::new(SlowCell::new(delay)))
            .unwrap();
        manager.create_connection(
            "hub",
            name.as_str(),
            ConnectionType::TissueInternal,
            0.5,
            false,
        );
    }

    let started = tokio::time::Instant::now();
    let results = manager.broadcast_data(&id("hub"), json!(1), None).await;
    let elapsed = started.elapsed();

    assert_eq!(results.len(), 5);
    assert!(results.values().all(Option::is_some));
    assert!(elapsed >= delay);
    assert!(elapsed < delay * 2, "broadcast took {elapsed:?}");
}

#[tokio::test]
async fn broadcast_filters_by_connection_type() {
    let manager = manager();
    for name in ["x", "y", "z"] {
        manager
            .register_cell(name, json!({}), Box::new(EchoCell::new()))
            .unwrap();
    }
    manager.create_connection("x", "y", ConnectionType::TissueInternal, 0.5, false);
    manager.create_connection("x", "z", ConnectionType::CrossOrgan, 0.5, false);

    let results = manager
        .broadcast_data(&id("x"), json!(1), Some(ConnectionType::CrossOrgan))
        .await;
    assert_eq!(results.keys().collect::<Vec<_>>(), vec![&id("z")]);
}

#[tokio::test]
async fn bidirectional_connection_round_trips() {
    let manager = manager();
    manager
        .register_cell("a", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager
        .register_cell("b", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    assert!(manager.create_connection("a", "b", ConnectionType::CrossTissue, 0.6, true));

    let forward = manager.connections_from(&id("a"), None);
    let reverse = manager.connections_from(&id("b"), None);
    assert_eq!(forward.len(), 1);
    assert_eq!(reverse.len(), 1);
    assert_eq!(forward[0].target_cell, id("b"));
    assert_eq!(reverse[0].target_cell, id("a"));
    assert_eq!(reverse[0].connection_type, ConnectionType::CrossTissue);

    assert_eq!(manager.broadcast_data(&id("b"), json!(2), None).await.len(), 1);
}

#[tokio::test]
async fn mirrored_edges_are_independent() {
    let manager = manager();
    let a = manager
        .register_cell("a", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    let b = manager
        .register_cell("b", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager.create_connection("a", "b", ConnectionType::CrossTissue, 0.6, true);

    manager.set_connection_strength(&id("a"), &id("b"), 0.1).unwrap();
    assert_eq!(a.connection_to(&id("b")).map(|c| c.strength), Some(0.1));
    assert_eq!(b.connection_to(&id("a")).map(|c| c.strength), Some(0.6));

    manager.remove_connection(&id("a"), &id("b")).unwrap();
    assert!(manager.connections_from(&id("a"), None).is_empty());
    assert_eq!(manager.connections_from(&id("b"), None).len(), 1);
}

#[tokio::test]
async fn unregistered_cell_yields_none() {
    assert_eq!(manager().process_data(&id("nobody"), json!(1)).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn calls_to_one_cell_are_serialised() {
    let manager = manager();
    let overlap = OverlapCell::new(Duration::from_millis(5));
    let peak = overlap.peak();
    let cell = manager
        .register_cell("overlap", json!({}), Box::new(overlap))
        .unwrap();

    let calls = (0..20).map(|i| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.process_data(&CellId::new("overlap"), json!(i)).await })
    });
    for call in futures::future::join_all(calls).await {
        assert!(call.unwrap().is_some());
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(cell.metrics().success_count, 20);
    assert_eq!(cell.stored("calls").await, Some(json!(20)));
}

#[tokio::test]
async fn timeout_is_a_processing_failure() {
    let manager = manager();
    let cell = manager
        .register_cell("slow", json!({}), Box::new(SlowCell::new(Duration::from_secs(5))))
        .unwrap();

    let out = manager
        .process_data_with(
            &id("slow"),
            json!(1),
            DispatchOptions::with_timeout(Duration::from_millis(20)),
        )
        .await;

    assert_eq!(out, None);
    assert_eq!(cell.metrics().error_count, 1);
    assert!(cell.last_error().unwrap().contains("Timed out"));
}

#[tokio::test]
async fn configured_timeout_applies_by_default() {
    let mut config = ManagerConfig::without_monitor();
    config.dispatch.timeout_ms = Some(20);
    let manager = CellularManager::new(config);
    let cell = manager
        .register_cell("slow", json!({}), Box::new(SlowCell::new(Duration::from_secs(5))))
        .unwrap();

    assert_eq!(manager.process_data(&id("slow"), json!(1)).await, None);
    assert_eq!(cell.metrics().error_count, 1);
}

#[tokio::test]
async fn maintenance_cell_is_skipped() {
    let manager = manager();
    let cell = manager
        .register_cell("m", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    cell.set_status(CellularStatus::Maintenance);

    assert_eq!(manager.process_data(&id("m"), json!(1)).await, None);
    assert_eq!(cell.metrics().operations(), 0);
    assert_eq!(cell.status(), CellularStatus::Maintenance);
}

#[tokio::test]
async fn removing_a_cell_drops_its_edges() {
    let manager = manager();
    let x = manager
        .register_cell("x", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager
        .register_cell("y", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    let z = manager
        .register_cell("z", json!({}), Box::new(EchoCell::new()))
        .unwrap();
    manager.create_connection("x", "y", ConnectionType::TissueInternal, 0.5, true);
    manager.create_connection("z", "y", ConnectionType::TissueInternal, 0.5, false);
    manager.create_connection("z", "x", ConnectionType::TissueInternal, 0.5, false);

    let removed = manager.remove_cell(&id("y")).unwrap();

    assert!(removed.connections().is_empty());
    assert!(manager.connections_from(&id("x"), None).is_empty());
    assert_eq!(x.metrics().connection_count, 0);
    assert_eq!(z.metrics().connection_count, 1);
    assert_eq!(manager.cell_ids(), vec![id("x"), id("z")]);
    assert!(manager.cell(&id("y")).is_none());

    // The id can be reused once removed
    assert!(manager
        .register_cell("y", json!({}), Box::new(EchoCell::new()))
        .is_ok());
}
