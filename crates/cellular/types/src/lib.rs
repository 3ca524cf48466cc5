//! Cellular Types - Core types for the hierarchical component runtime
//!
//! The cellular runtime manages a three-level hierarchy of lifecycle-managed
//! components:
//!
//! - **Cell**: smallest unit implementing the processing contract
//! - **Tissue**: a named group of Cells with its own coordination hook
//! - **Organ**: a named group of Tissues with its own orchestration hook
//!
//! This crate holds the plain data model shared by the runtime and its hosts.
//! It has no async runtime dependency.
//!
//! ## Key Concepts
//!
//! - **CellularConnection**: a directed, typed, weighted edge between two Cells
//! - **CellularMetrics**: running per-cell performance counters
//! - **ScoringPolicy**: turns metrics into a 0-100 health score
//! - **SystemHealthReport**: bottom-up aggregation of component health
//! - **CellularEvent**: lifecycle and health notifications

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod connection;
pub mod events;
pub mod health;
pub mod ids;
pub mod metrics;
pub mod scoring;
pub mod status;

// Re-export main types
pub use connection::{CellularConnection, ConnectionType, LinkProfile};
pub use events::{CellularEvent, EventKind, EventType};
pub use health::{
    CellHealth, HealthSummary, OrganHealth, OverallStatus, SystemHealthReport, TissueHealth,
};
pub use ids::{CellId, ComponentRef, OrganId, TissueId};
pub use metrics::CellularMetrics;
pub use scoring::{HealthThresholds, ScoringPolicy, WeightedScoring};
pub use status::CellularStatus;
