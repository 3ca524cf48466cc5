//! Cellular Runtime - lifecycle and orchestration for cells, tissues and organs
//!
//! The runtime hosts domain modules that implement the [`Cell`] contract and
//! groups them into [`Tissue`]s and [`Organ`]s. A [`CellularManager`] owns the
//! registries and the weighted connection graph, and provides:
//!
//! - single-target dispatch (`process_data`) with per-cell serialisation
//! - concurrent fan-out along outgoing connections (`broadcast_data`)
//! - bottom-up health aggregation and a background health monitor
//! - an event bus relaying component events Cell → Tissue → Organ → Manager
//!
//! ```no_run
//! use cellular_runtime::{CellularManager, ManagerConfig};
//! use cellular_types::ConnectionType;
//! # async fn demo(a: Box<dyn cellular_runtime::Cell>, b: Box<dyn cellular_runtime::Cell>) {
//! let manager = CellularManager::new(ManagerConfig::default());
//! manager.register_cell("a", serde_json::json!({}), a).unwrap();
//! manager.register_cell("b", serde_json::json!({}), b).unwrap();
//! manager.create_connection("a", "b", ConnectionType::TissueInternal, 0.8, false);
//!
//! manager.initialize().await.unwrap();
//! let results = manager.broadcast_data(&"a".into(), serde_json::json!({"v": 1}), None).await;
//! manager.shutdown().await.unwrap();
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cell;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod graph;
pub mod manager;
pub mod monitor;
pub mod organ;
pub mod tissue;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export main types
pub use cell::{Cell, CellContext, CellSlot, DataStore};
pub use config::{DispatchConfig, EventConfig, ManagerConfig, MonitorConfig};
pub use error::{
    CellError, CellResult, ConnectionError, RegistrationError, RuntimeError, RuntimeResult,
};
pub use event_bus::{EventBus, EventBusStats, EventHandler};
pub use graph::ConnectionGraph;
pub use manager::{
    CellularManager, ConnectionRequest, DispatchOptions, InitializationReport,
    WeakCellularManager,
};
pub use monitor::MonitorHandle;
pub use organ::{FanOutOrgan, Organ, OrganBehavior};
pub use tissue::{FanOutTissue, Tissue, TissueBehavior};
