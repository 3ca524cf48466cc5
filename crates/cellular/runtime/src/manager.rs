//! The cellular manager
//!
//! Owns the registries of cells, tissues and organs together with the
//! authoritative connection graph, dispatches data to cells, aggregates
//! health and drives the background health monitor.
//!
//! Registries and graph share one lock. Every operation that awaits a
//! component first snapshots what it needs under the lock, releases it, and
//! only then awaits. Lock order is registry before any component state, and
//! events are published after all locks are released.

use crate::cell::{Cell, CellSlot};
use crate::config::ManagerConfig;
use crate::error::{ConnectionError, RegistrationError, RuntimeError, RuntimeResult};
use crate::event_bus::{EventBus, EventBusStats};
use crate::graph::ConnectionGraph;
use crate::monitor::{self, MonitorHandle};
use crate::organ::Organ;
use crate::tissue::Tissue;
use cellular_types::{
    CellId, CellularConnection, CellularEvent, ComponentRef, ConnectionType, EventKind,
    EventType, HealthSummary, LinkProfile, OrganId, OverallStatus, ScoringPolicy,
    SystemHealthReport, TissueId,
};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

/// A request to connect two cells.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub source: CellId,
    pub target: CellId,
    pub connection_type: ConnectionType,
    /// Edge weight in `[0, 1]`
    pub strength: f64,
    pub bidirectional: bool,
    /// Link quality; the configured default when unset
    pub link: Option<LinkProfile>,
    pub metadata: HashMap<String, Value>,
}

impl ConnectionRequest {
    pub fn new(
        source: impl Into<CellId>,
        target: impl Into<CellId>,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            connection_type,
            strength: 1.0,
            bidirectional: false,
            link: None,
            metadata: HashMap::new(),
        }
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn link(mut self, link: LinkProfile) -> Self {
        self.link = Some(link);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Per-call dispatch options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Overrides the configured default timeout
    pub timeout: Option<Duration>,
}

impl DispatchOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Outcome of [`CellularManager::initialize`].
///
/// Initialization is best-effort: a failed component does not stop its
/// siblings and nothing is rolled back.
#[derive(Debug, Clone, Default)]
pub struct InitializationReport {
    pub initialized: Vec<ComponentRef>,
    pub failed: Vec<(ComponentRef, String)>,
}

impl InitializationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record<E: std::fmt::Display>(&mut self, component: ComponentRef, result: Result<(), E>) {
        match result {
            Ok(()) => self.initialized.push(component),
            Err(e) => {
                warn!(component = %component, error = %e, "Component failed to initialize");
                self.failed.push((component, e.to_string()));
            }
        }
    }
}

#[derive(Default)]
struct Registry {
    cells: HashMap<CellId, Arc<CellSlot>>,
    tissues: HashMap<TissueId, Arc<Tissue>>,
    organs: HashMap<OrganId, Arc<Organ>>,
    graph: ConnectionGraph,
}

struct ManagerInner {
    config: ManagerConfig,
    policy: Arc<dyn ScoringPolicy>,
    registry: RwLock<Registry>,
    events: Arc<EventBus>,
    running: AtomicBool,
    monitor: Mutex<Option<MonitorHandle>>,
    last_report: RwLock<Option<SystemHealthReport>>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.get_mut().take() {
            handle.abort();
        }
    }
}

/// Orchestrator for a cell/tissue/organ hierarchy.
///
/// Cheap to clone; clones share the same registries.
#[derive(Clone)]
pub struct CellularManager {
    inner: Arc<ManagerInner>,
}

/// Non-owning handle to a [`CellularManager`].
#[derive(Clone)]
pub struct WeakCellularManager {
    inner: Weak<ManagerInner>,
}

impl WeakCellularManager {
    pub fn upgrade(&self) -> Option<CellularManager> {
        self.inner.upgrade().map(|inner| CellularManager { inner })
    }
}

impl CellularManager {
    /// Create a manager scoring health with the configured weights.
    pub fn new(config: ManagerConfig) -> Self {
        let policy = Arc::new(config.scoring.clone());
        Self::with_policy(config, policy)
    }

    /// Create a manager with a custom scoring policy.
    pub fn with_policy(config: ManagerConfig, policy: Arc<dyn ScoringPolicy>) -> Self {
        let events = Arc::new(EventBus::root(config.events.channel_capacity));
        Self {
            inner: Arc::new(ManagerInner {
                config,
                policy,
                registry: RwLock::new(Registry::default()),
                events,
                running: AtomicBool::new(false),
                monitor: Mutex::new(None),
                last_report: RwLock::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakCellularManager {
        WeakCellularManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Wrap `behavior` in a slot scored by the manager's policy and register it.
    pub fn register_cell(
        &self,
        id: impl Into<CellId>,
        config: Value,
        behavior: Box<dyn Cell>,
    ) -> Result<Arc<CellSlot>, RegistrationError> {
        let slot = CellSlot::new(id, config, behavior).with_policy(Arc::clone(&self.inner.policy));
        self.register_cell_slot(slot)
    }

    /// Register a pre-built slot.
    pub fn register_cell_slot(&self, slot: CellSlot) -> Result<Arc<CellSlot>, RegistrationError> {
        let slot = Arc::new(slot);
        {
            let mut registry = self.inner.registry.write();
            if registry.cells.contains_key(slot.id()) {
                return Err(RegistrationError::CellAlreadyRegistered(slot.id().clone()));
            }
            registry.cells.insert(slot.id().clone(), Arc::clone(&slot));
        }
        slot.events().set_root(Some(Arc::clone(&self.inner.events)));

        info!(cell_id = %slot.id(), cell_type = slot.cell_type(), "Registered cell");
        self.publish(CellularEvent::new(slot.id().clone(), EventKind::CellRegistered));
        Ok(slot)
    }

    pub fn register_tissue(&self, tissue: Tissue) -> Result<Arc<Tissue>, RegistrationError> {
        let tissue = Arc::new(tissue);
        {
            let mut registry = self.inner.registry.write();
            if registry.tissues.contains_key(tissue.id()) {
                return Err(RegistrationError::TissueAlreadyRegistered(tissue.id().clone()));
            }
            registry.tissues.insert(tissue.id().clone(), Arc::clone(&tissue));
        }
        tissue.events().set_root(Some(Arc::clone(&self.inner.events)));

        info!(tissue_id = %tissue.id(), tissue_type = tissue.tissue_type(), "Registered tissue");
        self.publish(CellularEvent::new(tissue.id().clone(), EventKind::TissueRegistered));
        Ok(tissue)
    }

    pub fn register_organ(&self, organ: Organ) -> Result<Arc<Organ>, RegistrationError> {
        let organ = Arc::new(organ);
        {
            let mut registry = self.inner.registry.write();
            if registry.organs.contains_key(organ.id()) {
                return Err(RegistrationError::OrganAlreadyRegistered(organ.id().clone()));
            }
            registry.organs.insert(organ.id().clone(), Arc::clone(&organ));
        }
        organ.events().set_root(Some(Arc::clone(&self.inner.events)));

        info!(organ_id = %organ.id(), organ_type = organ.organ_type(), "Registered organ");
        self.publish(CellularEvent::new(organ.id().clone(), EventKind::OrganRegistered));
        Ok(organ)
    }

    /// Unregister a cell, dropping every edge that touches it and detaching
    /// it from registered tissues.
    pub fn remove_cell(&self, id: &CellId) -> Option<Arc<CellSlot>> {
        let (slot, tissues) = {
            let mut registry = self.inner.registry.write();
            let slot = registry.cells.remove(id)?;

            for source in registry.graph.remove_cell(id) {
                if let Some(peer) = registry.cells.get(&source) {
                    peer.remove_connection(id);
                }
            }
            slot.clear_connections();

            let tissues: Vec<_> = registry.tissues.values().cloned().collect();
            (slot, tissues)
        };

        for tissue in tissues {
            tissue.remove_cell(id);
        }
        slot.events().set_root(None);

        info!(cell_id = %id, "Removed cell");
        self.publish(CellularEvent::new(id.clone(), EventKind::CellRemoved));
        Some(slot)
    }

    pub fn remove_tissue(&self, id: &TissueId) -> Option<Arc<Tissue>> {
        let (tissue, organs) = {
            let mut registry = self.inner.registry.write();
            let tissue = registry.tissues.remove(id)?;
            let organs: Vec<_> = registry.organs.values().cloned().collect();
            (tissue, organs)
        };

        for organ in organs {
            organ.remove_tissue(id);
        }
        tissue.events().set_root(None);

        info!(tissue_id = %id, "Removed tissue");
        self.publish(CellularEvent::new(id.clone(), EventKind::TissueRemoved));
        Some(tissue)
    }

    pub fn remove_organ(&self, id: &OrganId) -> Option<Arc<Organ>> {
        let organ = self.inner.registry.write().organs.remove(id)?;
        organ.events().set_root(None);

        info!(organ_id = %id, "Removed organ");
        self.publish(CellularEvent::new(id.clone(), EventKind::OrganRemoved));
        Some(organ)
    }

    pub fn cell(&self, id: &CellId) -> Option<Arc<CellSlot>> {
        self.inner.registry.read().cells.get(id).cloned()
    }

    pub fn tissue(&self, id: &TissueId) -> Option<Arc<Tissue>> {
        self.inner.registry.read().tissues.get(id).cloned()
    }

    pub fn organ(&self, id: &OrganId) -> Option<Arc<Organ>> {
        self.inner.registry.read().organs.get(id).cloned()
    }

    /// Registered cell ids, sorted
    pub fn cell_ids(&self) -> Vec<CellId> {
        let mut ids: Vec<_> = self.inner.registry.read().cells.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Connect two registered cells with the configured link defaults.
    ///
    /// Returns `false` and logs when the request is rejected.
    pub fn create_connection(
        &self,
        source: impl Into<CellId>,
        target: impl Into<CellId>,
        connection_type: ConnectionType,
        strength: f64,
        bidirectional: bool,
    ) -> bool {
        let request = ConnectionRequest::new(source, target, connection_type)
            .strength(strength)
            .bidirectional(bidirectional);

        match self.try_create_connection(request) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Connection rejected");
                false
            }
        }
    }

    /// Connect two registered cells.
    ///
    /// The edge is stored in the graph and in the source cell's own map.
    /// A bidirectional request also stores an independent reverse edge.
    pub fn try_create_connection(&self, request: ConnectionRequest) -> Result<(), ConnectionError> {
        let ConnectionRequest {
            source,
            target,
            connection_type,
            strength,
            bidirectional,
            link,
            metadata,
        } = request;

        if source == target {
            return Err(ConnectionError::SelfLoop(source));
        }
        if !(0.0..=1.0).contains(&strength) {
            return Err(ConnectionError::InvalidStrength(strength));
        }

        let link = link.unwrap_or(self.inner.config.links);
        let forward = CellularConnection::new(
            source.clone(),
            target.clone(),
            connection_type,
            strength,
            link,
        )
        .with_bidirectional(bidirectional)
        .with_metadata(metadata);

        {
            let mut registry = self.inner.registry.write();
            let source_slot = registry
                .cells
                .get(&source)
                .cloned()
                .ok_or_else(|| ConnectionError::UnknownSource(source.clone()))?;
            let target_slot = registry
                .cells
                .get(&target)
                .cloned()
                .ok_or_else(|| ConnectionError::UnknownTarget(target.clone()))?;

            if bidirectional {
                let reverse = forward.mirrored();
                registry.graph.upsert(reverse.clone());
                target_slot.insert_connection(reverse);
            }
            registry.graph.upsert(forward.clone());
            source_slot.insert_connection(forward);
        }

        debug!(
            source = %source,
            target = %target,
            connection_type = %connection_type,
            strength,
            bidirectional,
            "Created connection"
        );
        self.publish(CellularEvent::new(
            source.clone(),
            EventKind::ConnectionCreated {
                source,
                target,
                connection_type,
                bidirectional,
            },
        ));
        Ok(())
    }

    /// Remove one direction of a connection. The mirror, if any, is kept.
    pub fn remove_connection(&self, source: &CellId, target: &CellId) -> Result<(), ConnectionError> {
        {
            let mut registry = self.inner.registry.write();
            registry
                .graph
                .remove(source, target)
                .ok_or_else(|| ConnectionError::NotFound {
                    from: source.clone(),
                    to: target.clone(),
                })?;
            if let Some(slot) = registry.cells.get(source) {
                slot.remove_connection(target);
            }
        }

        self.publish(CellularEvent::new(
            source.clone(),
            EventKind::ConnectionRemoved {
                source: source.clone(),
                target: target.clone(),
            },
        ));
        Ok(())
    }

    /// Re-weight one direction of a connection. The mirror is left alone.
    pub fn set_connection_strength(
        &self,
        source: &CellId,
        target: &CellId,
        strength: f64,
    ) -> Result<(), ConnectionError> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(ConnectionError::InvalidStrength(strength));
        }

        let mut registry = self.inner.registry.write();
        if !registry.graph.set_strength(source, target, strength) {
            return Err(ConnectionError::NotFound {
                from: source.clone(),
                to: target.clone(),
            });
        }
        if let Some(slot) = registry.cells.get(source) {
            slot.set_connection_strength(target, strength);
        }
        Ok(())
    }

    /// Outgoing edges of `source`, optionally filtered by type
    pub fn connections_from(
        &self,
        source: &CellId,
        filter: Option<ConnectionType>,
    ) -> Vec<CellularConnection> {
        self.inner.registry.read().graph.outgoing(source, filter)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Process `data` on one cell with the configured default timeout.
    ///
    /// Failures are recorded on the cell and reported as `None`.
    pub async fn process_data(&self, id: &CellId, data: Value) -> Option<Value> {
        self.process_data_with(id, data, DispatchOptions::default())
            .await
    }

    pub async fn process_data_with(
        &self,
        id: &CellId,
        data: Value,
        options: DispatchOptions,
    ) -> Option<Value> {
        let Some(slot) = self.cell(id) else {
            warn!(cell_id = %id, "Process requested for unregistered cell");
            return None;
        };

        let timeout = options.timeout.or_else(|| self.inner.config.dispatch.timeout());
        match slot.process(data, timeout).await {
            Ok(out) => Some(out),
            Err(e) => {
                warn!(cell_id = %id, error = %e, "Cell processing failed");
                None
            }
        }
    }

    /// Send `data` concurrently along every outgoing edge of `source`.
    ///
    /// The result holds one entry per traversed edge; a failed target maps
    /// to `None`. An unknown source or a source without edges yields an
    /// empty map.
    #[instrument(skip(self, source, data), fields(source = %source))]
    pub async fn broadcast_data(
        &self,
        source: &CellId,
        data: Value,
        filter: Option<ConnectionType>,
    ) -> HashMap<CellId, Option<Value>> {
        let targets: Vec<CellId> = {
            let mut registry = self.inner.registry.write();
            let edges = registry.graph.outgoing(source, filter);
            let source_slot = registry.cells.get(source).cloned();

            for edge in &edges {
                registry.graph.touch(source, &edge.target_cell);
                if let Some(slot) = &source_slot {
                    slot.touch_connection(&edge.target_cell);
                }
            }
            edges.into_iter().map(|e| e.target_cell).collect()
        };

        if targets.is_empty() {
            return HashMap::new();
        }
        debug!(targets = targets.len(), "Broadcasting");

        let results = join_all(targets.into_iter().map(|target| {
            let data = data.clone();
            async move {
                let out = self.process_data(&target, data).await;
                (target, out)
            }
        }))
        .await;

        results.into_iter().collect()
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Best-effort health snapshot of every registered component.
    ///
    /// Unhealthy components are reflected in the counts. Only a panic in
    /// the aggregation itself, e.g. from a scoring policy, produces an
    /// `error` report.
    pub fn get_system_health(&self) -> SystemHealthReport {
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.aggregate_health())) {
            Ok(report) => report,
            Err(_) => {
                error!("Health aggregation panicked");
                SystemHealthReport::failed("health aggregation panicked")
            }
        }
    }

    /// Compute, cache and act on a fresh health report.
    ///
    /// Publishes `SystemHealthWarning` when the system is critical or
    /// degraded. Component statuses are never changed here.
    pub fn check_health_now(&self) -> SystemHealthReport {
        let report = self.get_system_health();

        if report.overall_status.is_alarming() {
            warn!(
                overall_status = %report.overall_status,
                healthy = report.summary.healthy_components,
                total = report.summary.total_components,
                "System health degraded"
            );
            self.publish(CellularEvent::system(EventKind::SystemHealthWarning {
                overall_status: report.overall_status,
                summary: report.summary.clone(),
            }));
        }

        *self.inner.last_report.write() = Some(report.clone());
        report
    }

    /// Most recent report computed by the monitor or `check_health_now`
    pub fn last_health_report(&self) -> Option<SystemHealthReport> {
        self.inner.last_report.read().clone()
    }

    fn aggregate_health(&self) -> SystemHealthReport {
        let thresholds = &self.inner.config.thresholds;
        let (cells, tissues, organs) = {
            let registry = self.inner.registry.read();
            (
                registry.cells.values().cloned().collect::<Vec<_>>(),
                registry.tissues.values().cloned().collect::<Vec<_>>(),
                registry.organs.values().cloned().collect::<Vec<_>>(),
            )
        };

        let organs: BTreeMap<_, _> = organs
            .iter()
            .map(|o| (o.id().clone(), o.health_check(thresholds)))
            .collect();
        let tissues: BTreeMap<_, _> = tissues
            .iter()
            .map(|t| (t.id().clone(), t.health_check(thresholds)))
            .collect();
        let cells: BTreeMap<_, _> = cells
            .iter()
            .map(|c| (c.id().clone(), c.health_check(thresholds)))
            .collect();

        let summary = HealthSummary::new(
            (cells.values().filter(|c| c.is_healthy).count(), cells.len()),
            (tissues.values().filter(|t| t.is_healthy).count(), tissues.len()),
            (organs.values().filter(|o| o.is_healthy).count(), organs.len()),
        );

        SystemHealthReport {
            timestamp: chrono::Utc::now(),
            overall_status: OverallStatus::from_percentage(summary.health_percentage, thresholds),
            organs,
            tissues,
            cells,
            summary,
            error: None,
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Run `handler` for every event of `event_type` reaching the manager.
    pub fn register_event_handler<F>(&self, event_type: EventType, handler: F)
    where
        F: Fn(&CellularEvent) + Send + Sync + 'static,
    {
        self.inner.events.register_handler(event_type, handler);
    }

    pub fn register_event_handler_for_all<F>(&self, handler: F)
    where
        F: Fn(&CellularEvent) + Send + Sync + 'static,
    {
        self.inner.events.register_handler_for_all(handler);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CellularEvent> {
        self.inner.events.subscribe()
    }

    pub fn event_stats(&self) -> EventBusStats {
        self.inner.events.stats()
    }

    fn publish(&self, event: CellularEvent) {
        self.inner.events.publish(event);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Initialize organs, then tissues, then cells, and start the monitor.
    ///
    /// Each component is initialized independently; failures are collected
    /// in the report and never abort the rest.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> RuntimeResult<InitializationReport> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }

        let (organs, tissues, cells) = self.snapshot();
        let mut report = InitializationReport::default();

        let results = join_all(organs.iter().map(|o| o.initialize())).await;
        for (organ, result) in organs.iter().zip(results) {
            report.record(organ.id().clone().into(), result);
        }

        let results = join_all(tissues.iter().map(|t| t.initialize())).await;
        for (tissue, result) in tissues.iter().zip(results) {
            report.record(tissue.id().clone().into(), result);
        }

        let results = join_all(cells.iter().map(|c| c.initialize())).await;
        for (cell, result) in cells.iter().zip(results) {
            report.record(cell.id().clone().into(), result);
        }

        {
            // A concurrent shutdown clears `running` before it takes the monitor
            let mut guard = self.inner.monitor.lock();
            if !self.is_running() {
                warn!("Shutdown ran during initialization, monitor not started");
                return Ok(report);
            }
            if self.inner.config.monitor.enabled {
                let handle =
                    monitor::spawn(self.downgrade(), self.inner.config.monitor.interval());
                if let Some(previous) = guard.replace(handle) {
                    previous.abort();
                }
            }
        }

        info!(
            initialized = report.initialized.len(),
            failed = report.failed.len(),
            "Cellular system started"
        );
        self.publish(CellularEvent::system(EventKind::SystemStarted));
        Ok(report)
    }

    /// Stop the monitor, then shut down cells, tissues and organs.
    ///
    /// Calling this on a manager that is not running does nothing.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> RuntimeResult<()> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            debug!("Shutdown requested while not running");
            return Ok(());
        }

        let handle = self.inner.monitor.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        let (organs, tissues, cells) = self.snapshot();

        let results = join_all(cells.iter().map(|c| c.shutdown())).await;
        for (cell, result) in cells.iter().zip(results) {
            if let Err(e) = result {
                warn!(cell_id = %cell.id(), error = %e, "Cell shutdown failed");
            }
        }

        // Tissue and organ failures are logged by the components themselves
        join_all(tissues.iter().map(|t| t.shutdown())).await;
        join_all(organs.iter().map(|o| o.shutdown())).await;

        info!("Cellular system stopped");
        self.publish(CellularEvent::system(EventKind::SystemStopped));
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn snapshot(&self) -> (Vec<Arc<Organ>>, Vec<Arc<Tissue>>, Vec<Arc<CellSlot>>) {
        let registry = self.inner.registry.read();
        let mut organs: Vec<_> = registry.organs.values().cloned().collect();
        let mut tissues: Vec<_> = registry.tissues.values().cloned().collect();
        let mut cells: Vec<_> = registry.cells.values().cloned().collect();
        organs.sort_by(|a, b| a.id().cmp(b.id()));
        tissues.sort_by(|a, b| a.id().cmp(b.id()));
        cells.sort_by(|a, b| a.id().cmp(b.id()));
        (organs, tissues, cells)
    }
}

impl Default for CellularManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl std::fmt::Debug for CellularManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("CellularManager")
            .field("cells", &registry.cells.len())
            .field("tissues", &registry.tissues.len())
            .field("organs", &registry.organs.len())
            .field("connections", &registry.graph.edge_count())
            .field("running", &self.is_running())
            .finish()
    }
}
