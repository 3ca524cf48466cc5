//! Cells: the leaf units of the runtime
//!
//! A [`Cell`] is the behaviour a domain module plugs in. The runtime wraps it
//! in a [`CellSlot`], which owns everything the orchestrator manages on the
//! cell's behalf: lifecycle status, metrics, outgoing connections, the data
//! store and the last recorded error.
//!
//! Calls into the behaviour (`initialize`, `process`, `shutdown`) are
//! serialised per cell by an async mutex. Status and metrics live behind a
//! separate short-lived lock so health checks never wait on an in-flight
//! `process` call.

use crate::error::{CellError, CellResult};
use crate::event_bus::EventBus;
use async_trait::async_trait;
use cellular_types::{
    CellHealth, CellId, CellularConnection, CellularEvent, CellularMetrics, CellularStatus,
    EventKind, HealthThresholds, ScoringPolicy, WeightedScoring,
};
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

/// Default broadcast capacity of a cell's own event bus
const CELL_EVENT_CAPACITY: usize = 64;

/// Per-cell key/value store handed to the behaviour on every call
pub type DataStore = HashMap<String, Value>;

/// What a cell implementation sees while it runs.
pub struct CellContext<'a> {
    pub id: &'a CellId,
    pub config: &'a Value,
    pub store: &'a mut DataStore,
}

/// Contract implemented by every domain cell.
///
/// `capabilities` and `dependencies` are descriptive only. The runtime does
/// not order initialization by dependencies or match capabilities.
#[async_trait]
pub trait Cell: Send {
    /// Free-form type label, e.g. `"inventory"`
    fn cell_type(&self) -> &str;

    fn capabilities(&self) -> Vec<String> {
        Vec::new()
    }

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn initialize(&mut self, _ctx: &mut CellContext<'_>) -> CellResult<()> {
        Ok(())
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value>;

    async fn shutdown(&mut self, _ctx: &mut CellContext<'_>) -> CellResult<()> {
        Ok(())
    }
}

struct CellCore {
    behavior: Box<dyn Cell>,
    store: DataStore,
}

struct CellState {
    status: CellularStatus,
    metrics: CellularMetrics,
    connections: HashMap<CellId, CellularConnection>,
    last_error: Option<String>,
    started_at: Instant,
}

/// Runtime-owned wrapper around a [`Cell`].
pub struct CellSlot {
    id: CellId,
    cell_type: String,
    config: Value,
    capabilities: Vec<String>,
    dependencies: Vec<String>,
    core: Mutex<CellCore>,
    state: RwLock<CellState>,
    events: Arc<EventBus>,
    policy: Arc<dyn ScoringPolicy>,
}

impl CellSlot {
    pub fn new(id: impl Into<CellId>, config: Value, behavior: Box<dyn Cell>) -> Self {
        let cell_type = behavior.cell_type().to_string();
        let capabilities = behavior.capabilities();
        let dependencies = behavior.dependencies();

        Self {
            id: id.into(),
            cell_type,
            config,
            capabilities,
            dependencies,
            core: Mutex::new(CellCore {
                behavior,
                store: DataStore::new(),
            }),
            state: RwLock::new(CellState {
                status: CellularStatus::Inactive,
                metrics: CellularMetrics::default(),
                connections: HashMap::new(),
                last_error: None,
                started_at: Instant::now(),
            }),
            events: Arc::new(EventBus::new(CELL_EVENT_CAPACITY)),
            policy: Arc::new(WeightedScoring::default()),
        }
    }

    /// Replace the scoring policy used for metrics and health.
    pub fn with_policy(mut self, policy: Arc<dyn ScoringPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn status(&self) -> CellularStatus {
        self.state.read().status
    }

    pub fn metrics(&self) -> CellularMetrics {
        let state = self.state.read();
        let mut metrics = state.metrics.clone();
        metrics.status = state.status;
        metrics
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Snapshot of outgoing connections keyed by target
    pub fn connections(&self) -> HashMap<CellId, CellularConnection> {
        self.state.read().connections.clone()
    }

    pub fn connection_to(&self, target: &CellId) -> Option<CellularConnection> {
        self.state.read().connections.get(target).cloned()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CellularEvent> {
        self.events.subscribe()
    }

    /// Set the status explicitly, e.g. `MAINTENANCE` or `DEGRADED`.
    pub fn set_status(&self, status: CellularStatus) {
        let event = {
            let mut state = self.state.write();
            let old = state.status;
            state.status = status;
            state_change(&self.id, old, status)
        };
        self.emit(event);
    }

    /// Update the resource gauges (percent).
    pub fn set_resource_usage(&self, memory_usage: f64, cpu_usage: f64) {
        let mut state = self.state.write();
        state.metrics.memory_usage = memory_usage;
        state.metrics.cpu_usage = cpu_usage;
    }

    /// Record one operation outcome into the metrics.
    pub fn update_metrics(&self, processing_time_ms: Option<f64>, success: bool) {
        let mut state = self.state.write();
        let elapsed = state.started_at.elapsed();
        state
            .metrics
            .record_operation(processing_time_ms, success, elapsed, self.policy.as_ref());
    }

    /// Composite health score under the slot's scoring policy.
    pub fn health_score(&self) -> f64 {
        self.metrics().health_score(self.policy.as_ref())
    }

    /// Health snapshot. A score that cannot be computed yields a score of 0.
    pub fn health_check(&self, thresholds: &HealthThresholds) -> CellHealth {
        let metrics = self.metrics();
        let score = metrics.health_score(self.policy.as_ref());

        if !score.is_finite() {
            warn!(cell_id = %self.id, score, "Health check produced a non-finite score");
            return CellHealth::failed(metrics.status);
        }

        CellHealth {
            health_score: score,
            is_healthy: thresholds.is_healthy_score(score)
                && metrics.status == CellularStatus::Active,
            status: metrics.status,
            last_activity: metrics.last_activity,
            error_count: metrics.error_count,
            success_count: metrics.success_count,
            connection_count: metrics.connection_count,
        }
    }

    /// Run the behaviour's `initialize`.
    pub async fn initialize(&self) -> CellResult<()> {
        let mut core = self.core.lock().await;
        let previous = self.enter(CellularStatus::Initializing);

        let CellCore { behavior, store } = &mut *core;
        let mut ctx = CellContext {
            id: &self.id,
            config: &self.config,
            store,
        };
        let result = behavior.initialize(&mut ctx).await;

        let event = {
            let mut state = self.state.write();
            match &result {
                Ok(()) => {
                    state.status = CellularStatus::Active;
                    state.started_at = Instant::now();
                }
                Err(e) => {
                    state.status = CellularStatus::Error;
                    state.last_error = Some(e.to_string());
                }
            }
            state_change(&self.id, previous, state.status)
        };
        self.emit(event);

        result
    }

    /// Run the behaviour's `process` and record the outcome.
    ///
    /// Calls on the same cell are serialised. A cell in `MAINTENANCE`
    /// refuses work without touching its metrics. A panic in the behaviour
    /// is recorded as a failure like any other error.
    pub async fn process(&self, data: Value, timeout: Option<Duration>) -> CellResult<Value> {
        let mut core = self.core.lock().await;

        let current = self.status();
        if !current.accepts_work() {
            debug!(cell_id = %self.id, status = %current, "Cell refused work");
            return Err(CellError::Unavailable(current));
        }
        let previous = self.enter(CellularStatus::Processing);

        let CellCore { behavior, store } = &mut *core;
        let mut ctx = CellContext {
            id: &self.id,
            config: &self.config,
            store,
        };

        let started = Instant::now();
        let call = AssertUnwindSafe(behavior.process(&mut ctx, data)).catch_unwind();
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Ok(Err(CellError::Timeout(limit)))),
            None => call.await,
        }
        .unwrap_or_else(|payload| Err(CellError::Panicked(panic_message(payload.as_ref()))));
        let processing_ms = started.elapsed().as_secs_f64() * 1000.0;
        drop(core);

        let success = result.is_ok();
        let events = {
            let mut state = self.state.write();
            let elapsed = state.started_at.elapsed();
            state.metrics.record_operation(
                Some(processing_ms),
                success,
                elapsed,
                self.policy.as_ref(),
            );

            let mut events = Vec::new();
            match &result {
                // Only initialize moves a cell out of INACTIVE
                Ok(_) if previous == CellularStatus::Inactive => {
                    state.status = CellularStatus::Inactive;
                }
                Ok(_) => state.status = CellularStatus::Active,
                Err(e) => {
                    state.status = CellularStatus::Error;
                    state.last_error = Some(e.to_string());
                    events.push(CellularEvent::new(
                        self.id.clone(),
                        EventKind::ProcessingFailed {
                            error: e.to_string(),
                        },
                    ));
                }
            }
            events.extend(state_change(&self.id, previous, state.status));
            events
        };
        for event in events {
            self.events.publish(event);
        }

        result
    }

    /// Run the behaviour's `shutdown`.
    pub async fn shutdown(&self) -> CellResult<()> {
        let mut core = self.core.lock().await;
        let previous = self.status();

        let CellCore { behavior, store } = &mut *core;
        let mut ctx = CellContext {
            id: &self.id,
            config: &self.config,
            store,
        };
        let result = behavior.shutdown(&mut ctx).await;

        let event = {
            let mut state = self.state.write();
            match &result {
                Ok(()) => state.status = CellularStatus::Inactive,
                Err(e) => {
                    state.status = CellularStatus::Error;
                    state.last_error = Some(e.to_string());
                }
            }
            state_change(&self.id, previous, state.status)
        };
        self.emit(event);

        result
    }

    /// Read a value from the data store.
    pub async fn stored(&self, key: &str) -> Option<Value> {
        self.core.lock().await.store.get(key).cloned()
    }

    pub(crate) fn insert_connection(&self, connection: CellularConnection) {
        let mut state = self.state.write();
        state
            .connections
            .insert(connection.target_cell.clone(), connection);
        state.metrics.connection_count = state.connections.len();
    }

    pub(crate) fn remove_connection(&self, target: &CellId) -> Option<CellularConnection> {
        let mut state = self.state.write();
        let removed = state.connections.remove(target);
        state.metrics.connection_count = state.connections.len();
        removed
    }

    pub(crate) fn clear_connections(&self) {
        let mut state = self.state.write();
        state.connections.clear();
        state.metrics.connection_count = 0;
    }

    pub(crate) fn touch_connection(&self, target: &CellId) {
        if let Some(connection) = self.state.write().connections.get_mut(target) {
            connection.touch();
        }
    }

    pub(crate) fn set_connection_strength(&self, target: &CellId, strength: f64) {
        if let Some(connection) = self.state.write().connections.get_mut(target) {
            connection.strength = strength;
        }
    }

    /// Move into a transient state, returning the settled state we left.
    fn enter(&self, transient: CellularStatus) -> CellularStatus {
        let mut state = self.state.write();
        let previous = state.status;
        state.status = transient;
        previous
    }

    fn emit(&self, event: Option<CellularEvent>) {
        if let Some(event) = event {
            self.events.publish(event);
        }
    }
}

impl std::fmt::Debug for CellSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellSlot")
            .field("id", &self.id)
            .field("cell_type", &self.cell_type)
            .field("status", &self.status())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Settled status transitions become `StatusChanged` events.
fn state_change(
    id: &CellId,
    old: CellularStatus,
    new: CellularStatus,
) -> Option<CellularEvent> {
    if old == new || new.is_transient() {
        return None;
    }
    Some(CellularEvent::new(
        id.clone(),
        EventKind::StatusChanged { old, new },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoCell, FailingCell, PanickingCell, ScriptedCell, SlowCell};
    use cellular_types::EventType;
    use serde_json::json;

    fn slot(behavior: Box<dyn Cell>) -> CellSlot {
        CellSlot::new("cell-under-test", json!({}), behavior)
    }

    #[tokio::test]
    async fn test_initialize_activates() {
        let cell = slot(Box::new(EchoCell::new()));
        assert_eq!(cell.status(), CellularStatus::Inactive);

        cell.initialize().await.unwrap();
        assert_eq!(cell.status(), CellularStatus::Active);
        assert_eq!(cell.events().event_count(EventType::StatusChanged), 1);
    }

    #[tokio::test]
    async fn test_failed_initialize_sets_error() {
        let cell = slot(Box::new(ScriptedCell::new().failing_initialize()));
        assert!(cell.initialize().await.is_err());
        assert_eq!(cell.status(), CellularStatus::Error);
        assert!(cell.last_error().is_some());
    }

    #[tokio::test]
    async fn test_process_records_success() {
        let cell = slot(Box::new(EchoCell::new()));
        cell.initialize().await.unwrap();

        let out = cell.process(json!({"v": 1}), None).await.unwrap();
        assert_eq!(out, json!({"v": 1}));

        let metrics = cell.metrics();
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.error_count, 0);
        assert_eq!(cell.status(), CellularStatus::Active);
    }

    #[tokio::test]
    async fn test_process_failure_moves_to_error_and_recovers() {
        let cell = slot(Box::new(ScriptedCell::new()));
        cell.initialize().await.unwrap();

        assert!(cell.process(json!({"fail": true}), None).await.is_err());
        assert_eq!(cell.status(), CellularStatus::Error);
        assert_eq!(cell.metrics().error_count, 1);
        assert_eq!(cell.events().event_count(EventType::ProcessingFailed), 1);

        // ERROR is left by the next successful call
        cell.process(json!({"v": 2}), None).await.unwrap();
        assert_eq!(cell.status(), CellularStatus::Active);
    }

    #[tokio::test]
    async fn test_maintenance_refuses_work() {
        let cell = slot(Box::new(EchoCell::new()));
        cell.initialize().await.unwrap();
        cell.set_status(CellularStatus::Maintenance);

        let err = cell.process(json!(1), None).await.unwrap_err();
        assert!(matches!(err, CellError::Unavailable(CellularStatus::Maintenance)));
        assert_eq!(cell.metrics().operations(), 0);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let cell = slot(Box::new(SlowCell::new(Duration::from_millis(200))));
        let err = cell
            .process(json!(1), Some(Duration::from_millis(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, CellError::Timeout(_)));
        assert_eq!(cell.metrics().error_count, 1);
        assert_eq!(cell.status(), CellularStatus::Error);
    }

    #[tokio::test]
    async fn test_panic_is_recorded_as_failure() {
        let cell = slot(Box::new(PanickingCell::new()));
        cell.initialize().await.unwrap();

        let err = cell.process(json!(1), None).await.unwrap_err();
        assert!(matches!(err, CellError::Panicked(ref msg) if msg == "scripted panic"));
        assert_eq!(cell.status(), CellularStatus::Error);
        assert_eq!(cell.metrics().error_count, 1);
        assert!(cell.last_error().unwrap().contains("scripted panic"));
        assert_eq!(cell.events().event_count(EventType::ProcessingFailed), 1);

        // The slot stays usable after a panic
        let err = cell
            .process(json!(2), Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, CellError::Panicked(_)));
        assert_eq!(cell.metrics().error_count, 2);
    }

    #[tokio::test]
    async fn test_process_does_not_activate_inactive_cell() {
        let cell = slot(Box::new(EchoCell::new()));
        cell.initialize().await.unwrap();
        cell.shutdown().await.unwrap();
        let transitions = cell.events().event_count(EventType::StatusChanged);

        cell.process(json!(1), None).await.unwrap();

        assert_eq!(cell.status(), CellularStatus::Inactive);
        assert_eq!(cell.metrics().success_count, 1);
        assert!(!cell.health_check(&HealthThresholds::default()).is_healthy);
        assert_eq!(cell.events().event_count(EventType::StatusChanged), transitions);
    }

    #[tokio::test]
    async fn test_health_check_requires_active() {
        let thresholds = HealthThresholds::default();
        let cell = slot(Box::new(EchoCell::new()));

        let inactive = cell.health_check(&thresholds);
        assert_eq!(inactive.health_score, 100.0);
        assert!(!inactive.is_healthy);

        cell.initialize().await.unwrap();
        assert!(cell.health_check(&thresholds).is_healthy);
    }

    #[derive(Debug)]
    struct BrokenScoring;

    impl ScoringPolicy for BrokenScoring {
        fn health_score(&self, _metrics: &CellularMetrics) -> f64 {
            f64::NAN
        }

        fn uptime_percentage(&self, _elapsed: Duration, _error_count: u64) -> f64 {
            100.0
        }
    }

    #[test]
    fn test_non_finite_score_fails_health_check() {
        let cell = slot(Box::new(EchoCell::new())).with_policy(Arc::new(BrokenScoring));

        let health = cell.health_check(&HealthThresholds::default());
        assert_eq!(health.health_score, 0.0);
        assert!(!health.is_healthy);
    }

    #[test]
    fn test_update_metrics_keeps_full_score() {
        let cell = slot(Box::new(EchoCell::new()));
        for _ in 0..10 {
            cell.update_metrics(None, true);
        }
        assert_eq!(cell.health_score(), 100.0);
    }

    #[tokio::test]
    async fn test_failing_cell_shutdown_still_ok() {
        let cell = slot(Box::new(FailingCell::new()));
        cell.initialize().await.unwrap();
        cell.shutdown().await.unwrap();
        assert_eq!(cell.status(), CellularStatus::Inactive);
    }

    #[tokio::test]
    async fn test_data_store_persists_between_calls() {
        let cell = slot(Box::new(EchoCell::new()));
        cell.process(json!(1), None).await.unwrap();
        cell.process(json!(2), None).await.unwrap();
        assert_eq!(cell.stored("calls").await, Some(json!(2)));
    }
}
