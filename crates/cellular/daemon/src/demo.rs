//! Demo topology hosted by the daemon

use async_trait::async_trait;
use cellular_runtime::{
    Cell, CellContext, CellResult, CellularManager, FanOutOrgan, FanOutTissue, Organ, Tissue,
};
use cellular_types::{CellId, ConnectionType, OrganId};
use serde_json::{json, Value};
use std::sync::Arc;

const TISSUE_ID: &str = "ring";
const ORGAN_ID: &str = "core";

/// Counts hops and remembers the last payload it saw.
#[derive(Debug, Default)]
pub struct RelayCell;

#[async_trait]
impl Cell for RelayCell {
    fn cell_type(&self) -> &str {
        "relay"
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["relay".into()]
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value> {
        let hops = data.get("hops").and_then(Value::as_u64).unwrap_or(0);
        ctx.store.insert("last_input".into(), data);

        Ok(json!({
            "cell": ctx.id.as_str(),
            "hops": hops + 1,
            "processed_at": chrono::Utc::now(),
        }))
    }
}

fn cell_id(index: usize) -> CellId {
    CellId::new(format!("cell-{index}"))
}

/// Register `count` relay cells connected in a ring, grouped into one tissue
/// inside one organ.
pub fn build(manager: &CellularManager, count: usize) -> anyhow::Result<()> {
    let tissue = Tissue::new(TISSUE_ID, Box::new(FanOutTissue::new("ring")));

    for index in 0..count {
        let cell = manager.register_cell(
            cell_id(index),
            json!({ "position": index }),
            Box::new(RelayCell),
        )?;
        tissue.add_cell(cell);
    }

    if count > 1 {
        for index in 0..count {
            let next = (index + 1) % count;
            manager.create_connection(
                cell_id(index),
                cell_id(next),
                ConnectionType::TissueInternal,
                1.0,
                false,
            );
        }
    }

    let tissue = manager.register_tissue(tissue)?;
    let organ = Organ::new(ORGAN_ID, Box::new(FanOutOrgan::new("core")));
    organ.add_tissue(Arc::clone(&tissue));
    manager.register_organ(organ)?;

    Ok(())
}

/// Push a little traffic through the topology; returns the number of
/// successful responses.
pub async fn exercise(manager: &CellularManager) -> usize {
    let mut responses = 0;

    let broadcast = manager
        .broadcast_data(&cell_id(0), json!({ "hops": 0 }), None)
        .await;
    responses += broadcast.values().filter(|r| r.is_some()).count();

    if let Some(organ) = manager.organ(&OrganId::new(ORGAN_ID)) {
        match organ.orchestrate_tissues("ping", json!({ "hops": 0 })).await {
            Ok(_) => responses += 1,
            Err(e) => tracing::warn!(error = %e, "Orchestration failed"),
        }
    }

    responses
}
