//! Organs: groups of tissues with an orchestration hook

use crate::error::{CellError, CellResult};
use crate::event_bus::EventBus;
use crate::tissue::Tissue;
use async_trait::async_trait;
use cellular_types::{
    CellularEvent, CellularStatus, EventKind, HealthThresholds, OrganHealth, OrganId, TissueId,
};
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const ORGAN_EVENT_CAPACITY: usize = 128;

/// Multi-tissue choreography supplied by an organ implementation.
#[async_trait]
pub trait OrganBehavior: Send {
    fn organ_type(&self) -> &str;

    async fn initialize(&mut self, _tissues: &[Arc<Tissue>]) -> CellResult<()> {
        Ok(())
    }

    async fn orchestrate_tissues(
        &mut self,
        operation: &str,
        data: Value,
        tissues: &[Arc<Tissue>],
    ) -> CellResult<Value>;

    async fn shutdown(&mut self, _tissues: &[Arc<Tissue>]) -> CellResult<()> {
        Ok(())
    }
}

/// A named group of tissues.
pub struct Organ {
    id: OrganId,
    organ_type: String,
    behavior: Mutex<Box<dyn OrganBehavior>>,
    status: RwLock<CellularStatus>,
    tissues: DashMap<TissueId, Arc<Tissue>>,
    events: Arc<EventBus>,
}

impl Organ {
    pub fn new(id: impl Into<OrganId>, behavior: Box<dyn OrganBehavior>) -> Self {
        Self {
            id: id.into(),
            organ_type: behavior.organ_type().to_string(),
            behavior: Mutex::new(behavior),
            status: RwLock::new(CellularStatus::Inactive),
            tissues: DashMap::new(),
            events: Arc::new(EventBus::new(ORGAN_EVENT_CAPACITY)),
        }
    }

    pub fn id(&self) -> &OrganId {
        &self.id
    }

    pub fn organ_type(&self) -> &str {
        &self.organ_type
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

    /// Add a tissue and start relaying its events through this organ.
    pub fn add_tissue(&self, tissue: Arc<Tissue>) {
        tissue.events().set_parent(Some(Arc::clone(&self.events)));
        self.tissues.insert(tissue.id().clone(), tissue);
    }

    pub fn remove_tissue(&self, id: &TissueId) -> Option<Arc<Tissue>> {
        let (_, tissue) = self.tissues.remove(id)?;
        tissue.events().clear_parent_if(&self.events);
        Some(tissue)
    }

    pub fn contains_tissue(&self, id: &TissueId) -> bool {
        self.tissues.contains_key(id)
    }

    pub fn tissue_count(&self) -> usize {
        self.tissues.len()
    }

    /// Snapshot of member tissues, ordered by id
    pub fn tissues(&self) -> Vec<Arc<Tissue>> {
        let mut tissues: Vec<_> = self.tissues.iter().map(|r| Arc::clone(r.value())).collect();
        tissues.sort_by(|a, b| a.id().cmp(b.id()));
        tissues
    }

    #[instrument(skip(self), fields(organ_id = %self.id))]
    pub async fn initialize(&self) -> CellResult<()> {
        let tissues = self.tissues();
        let result = self.behavior.lock().await.initialize(&tissues).await;
        match &result {
            Ok(()) => self.set_status(CellularStatus::Active),
            Err(e) => {
                warn!(organ_id = %self.id, error = %e, "Organ initialization failed");
                self.set_status(CellularStatus::Error);
            }
        }
        result
    }

    pub async fn orchestrate_tissues(&self, operation: &str, data: Value) -> CellResult<Value> {
        let tissues = self.tissues();
        debug!(organ_id = %self.id, operation, tissues = tissues.len(), "Orchestrating tissues");
        self.behavior
            .lock()
            .await
            .orchestrate_tissues(operation, data, &tissues)
            .await
    }

    #[instrument(skip(self), fields(organ_id = %self.id))]
    pub async fn shutdown(&self) -> CellResult<()> {
        let tissues = self.tissues();
        let result = self.behavior.lock().await.shutdown(&tissues).await;
        match &result {
            Ok(()) => self.set_status(CellularStatus::Inactive),
            Err(e) => {
                warn!(organ_id = %self.id, error = %e, "Organ shutdown failed");
                self.set_status(CellularStatus::Error);
            }
        }
        result
    }

    /// Share of healthy tissues, in percent.
    pub fn health_check(&self, thresholds: &HealthThresholds) -> OrganHealth {
        let tissues: BTreeMap<_, _> = self
            .tissues()
            .into_iter()
            .map(|tissue| (tissue.id().clone(), tissue.health_check(thresholds)))
            .collect();
        OrganHealth::from_tissues(self.status(), tissues, thresholds)
    }
}

impl std::fmt::Debug for Organ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Organ")
            .field("id", &self.id)
            .field("organ_type", &self.organ_type)
            .field("tissues", &self.tissues.len())
            .finish()
    }
}

/// Forwards each operation to every tissue's coordination hook concurrently.
#[derive(Debug, Clone)]
pub struct FanOutOrgan {
    organ_type: String,
}

impl FanOutOrgan {
    pub fn new(organ_type: impl Into<String>) -> Self {
        Self {
            organ_type: organ_type.into(),
        }
    }
}

#[async_trait]
impl OrganBehavior for FanOutOrgan {
    fn organ_type(&self) -> &str {
        &self.organ_type
    }

    async fn orchestrate_tissues(
        &mut self,
        operation: &str,
        data: Value,
        tissues: &[Arc<Tissue>],
    ) -> CellResult<Value> {
        let results = join_all(tissues.iter().map(|tissue| {
            let data = data.clone();
            async move {
                (
                    tissue.id().clone(),
                    tissue.coordinate_cells(operation, data).await,
                )
            }
        }))
        .await;

        let failures = results.iter().filter(|(_, r)| r.is_err()).count();
        if !tissues.is_empty() && failures == tissues.len() {
            return Err(CellError::Coordination(format!(
                "all {failures} tissues failed {operation}"
            )));
        }

        let out: Map<String, Value> = results
            .into_iter()
            .map(|(id, r)| (id.to_string(), r.unwrap_or(Value::Null)))
            .collect();
        Ok(Value::Object(out))
    }
}
