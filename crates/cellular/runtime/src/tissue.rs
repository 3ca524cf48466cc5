//! Tissues: groups of cells with a coordination hook

use crate::cell::CellSlot;
use crate::error::{CellError, CellResult};
use crate::event_bus::EventBus;
use async_trait::async_trait;
use cellular_types::{
    CellId, CellularEvent, CellularStatus, EventKind, HealthThresholds, TissueHealth, TissueId,
};
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const TISSUE_EVENT_CAPACITY: usize = 128;

/// Multi-cell choreography supplied by a tissue implementation.
#[async_trait]
pub trait TissueBehavior: Send {
    fn tissue_type(&self) -> &str;

    async fn initialize(&mut self, _cells: &[Arc<CellSlot>]) -> CellResult<()> {
        Ok(())
    }

    /// Run `operation` across the tissue's cells.
    async fn coordinate_cells(
        &mut self,
        operation: &str,
        data: Value,
        cells: &[Arc<CellSlot>],
    ) -> CellResult<Value>;

    async fn shutdown(&mut self, _cells: &[Arc<CellSlot>]) -> CellResult<()> {
        Ok(())
    }
}

/// A named group of cells.
///
/// Cells keep their own lifecycle; the tissue only relays their events and
/// hands them to its behaviour.
pub struct Tissue {
    id: TissueId,
    tissue_type: String,
    behavior: Mutex<Box<dyn TissueBehavior>>,
    status: RwLock<CellularStatus>,
    cells: DashMap<CellId, Arc<CellSlot>>,
    events: Arc<EventBus>,
}

impl Tissue {
    pub fn new(id: impl Into<TissueId>, behavior: Box<dyn TissueBehavior>) -> Self {
        Self {
            id: id.into(),
            tissue_type: behavior.tissue_type().to_string(),
            behavior: Mutex::new(behavior),
            status: RwLock::new(CellularStatus::Inactive),
            cells: DashMap::new(),
            events: Arc::new(EventBus::new(TISSUE_EVENT_CAPACITY)),
        }
    }

    pub fn id(&self) -> &TissueId {
        &self.id
    }

    pub fn tissue_type(&self) -> &str {
        &self.tissue_type
    }

    pub fn status(&self) -> CellularStatus {
        *self.status.read()
    }

    pub fn set_status(&self, status: CellularStatus) {
        let old = std::mem::replace(&mut *self.status.write(), status);
        if old != status && !status.is_transient() {
            self.events.publish(CellularEvent::new(
                self.id.clone(),
                EventKind::StatusChanged { old, new: status },
            ));
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Add a cell and start relaying its events through this tissue.
    pub fn add_cell(&self, cell: Arc<CellSlot>) {
        cell.events().set_parent(Some(Arc::clone(&self.events)));
        self.cells.insert(cell.id().clone(), cell);
    }

    pub fn remove_cell(&self, id: &CellId) -> Option<Arc<CellSlot>> {
        let (_, cell) = self.cells.remove(id)?;
        cell.events().clear_parent_if(&self.events);
        Some(cell)
    }

    pub fn contains_cell(&self, id: &CellId) -> bool {
        self.cells.contains_key(id)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Snapshot of member cells, ordered by id
    pub fn cells(&self) -> Vec<Arc<CellSlot>> {
        let mut cells: Vec<_> = self.cells.iter().map(|r| Arc::clone(r.value())).collect();
        cells.sort_by(|a, b| a.id().cmp(b.id()));
        cells
    }

    #[instrument(skip(self), fields(tissue_id = %self.id))]
    pub async fn initialize(&self) -> CellResult<()> {
        let cells = self.cells();
        let result = self.behavior.lock().await.initialize(&cells).await;
        self.settle(&result);
        result
    }

    pub async fn coordinate_cells(&self, operation: &str, data: Value) -> CellResult<Value> {
        let cells = self.cells();
        debug!(tissue_id = %self.id, operation, cells = cells.len(), "Coordinating cells");
        self.behavior
            .lock()
            .await
            .coordinate_cells(operation, data, &cells)
            .await
    }

    #[instrument(skip(self), fields(tissue_id = %self.id))]
    pub async fn shutdown(&self) -> CellResult<()> {
        let cells = self.cells();
        let result = self.behavior.lock().await.shutdown(&cells).await;
        match &result {
            Ok(()) => self.set_status(CellularStatus::Inactive),
            Err(e) => {
                warn!(tissue_id = %self.id, error = %e, "Tissue shutdown failed");
                self.set_status(CellularStatus::Error);
            }
        }
        result
    }

    /// Share of healthy cells, in percent.
    pub fn health_check(&self, thresholds: &HealthThresholds) -> TissueHealth {
        let cells: BTreeMap<_, _> = self
            .cells()
            .into_iter()
            .map(|cell| (cell.id().clone(), cell.health_check(thresholds)))
            .collect();
        TissueHealth::from_cells(self.status(), cells, thresholds)
    }

    fn settle(&self, result: &CellResult<()>) {
        match result {
            Ok(()) => self.set_status(CellularStatus::Active),
            Err(e) => {
                warn!(tissue_id = %self.id, error = %e, "Tissue initialization failed");
                self.set_status(CellularStatus::Error);
            }
        }
    }
}

impl std::fmt::Debug for Tissue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tissue")
            .field("id", &self.id)
            .field("tissue_type", &self.tissue_type)
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// Sends the same payload to every cell concurrently.
///
/// The result is an object keyed by cell id; a failed cell maps to `null`.
/// Fails only when every cell failed.
#[derive(Debug, Clone)]
pub struct FanOutTissue {
    tissue_type: String,
}

impl FanOutTissue {
    pub fn new(tissue_type: impl Into<String>) -> Self {
        Self {
            tissue_type: tissue_type.into(),
        }
    }
}

#[async_trait]
impl TissueBehavior for FanOutTissue {
    fn tissue_type(&self) -> &str {
        &self.tissue_type
    }

    async fn coordinate_cells(
        &mut self,
        operation: &str,
        data: Value,
        cells: &[Arc<CellSlot>],
    ) -> CellResult<Value> {
        let payload = serde_json::json!({ "operation": operation, "data": data });
        let results = join_all(cells.iter().map(|cell| {
            let payload = payload.clone();
            async move { (cell.id().clone(), cell.process(payload, None).await) }
        }))
        .await;

        let failures = results.iter().filter(|(_, r)| r.is_err()).count();
        if !cells.is_empty() && failures == cells.len() {
            return Err(CellError::Coordination(format!(
                "all {failures} cells failed {operation}"
            )));
        }

        let out: Map<String, Value> = results
            .into_iter()
            .map(|(id, r)| (id.to_string(), r.unwrap_or(Value::Null)))
            .collect();
        Ok(Value::Object(out))
    }
}
