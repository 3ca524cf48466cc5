//! Health reports for cells, groups and the whole system
//!
//! Reports are computed bottom-up: cells score themselves from their metrics,
//! tissues score the fraction of healthy cells, organs the fraction of
//! healthy tissues, and the system classifies the fraction of healthy
//! components across every level.

use crate::ids::{CellId, OrganId, TissueId};
use crate::scoring::HealthThresholds;
use crate::status::CellularStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Health check result for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellHealth {
    pub health_score: f64,
    pub is_healthy: bool,
    pub status: CellularStatus,
    pub last_activity: DateTime<Utc>,
    pub error_count: u64,
    pub success_count: u64,
    pub connection_count: usize,
}

impl CellHealth {
    /// Result used when the health check itself could not be computed.
    pub fn failed(status: CellularStatus) -> Self {
        Self {
            health_score: 0.0,
            is_healthy: false,
            status,
            last_activity: Utc::now(),
            error_count: 0,
            success_count: 0,
            connection_count: 0,
        }
    }
}

/// Score of a group: percentage of healthy children, 0 for an empty group.
pub fn group_score(healthy: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    healthy as f64 / total as f64 * 100.0
}

/// Health check result for a tissue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TissueHealth {
    pub health_score: f64,
    pub is_healthy: bool,
    pub status: CellularStatus,
    pub healthy_cells: usize,
    pub total_cells: usize,
    pub cells: BTreeMap<CellId, CellHealth>,
}

impl TissueHealth {
    pub fn from_cells(
        status: CellularStatus,
        cells: BTreeMap<CellId, CellHealth>,
        thresholds: &HealthThresholds,
    ) -> Self {
        let total_cells = cells.len();
        let healthy_cells = cells.values().filter(|c| c.is_healthy).count();
        let health_score = group_score(healthy_cells, total_cells);

        Self {
            health_score,
            is_healthy: thresholds.is_healthy_score(health_score) && status == CellularStatus::Active,
            status,
            healthy_cells,
            total_cells,
            cells,
        }
    }
}

/// Health check result for an organ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganHealth {
    pub health_score: f64,
    pub is_healthy: bool,
    pub status: CellularStatus,
    pub healthy_tissues: usize,
    pub total_tissues: usize,
    pub tissues: BTreeMap<TissueId, TissueHealth>,
}

impl OrganHealth {
    pub fn from_tissues(
        status: CellularStatus,
        tissues: BTreeMap<TissueId, TissueHealth>,
        thresholds: &HealthThresholds,
    ) -> Self {
        let total_tissues = tissues.len();
        let healthy_tissues = tissues.values().filter(|t| t.is_healthy).count();
        let health_score = group_score(healthy_tissues, total_tissues);

        Self {
            health_score,
            is_healthy: thresholds.is_healthy_score(health_score) && status == CellularStatus::Active,
            status,
            healthy_tissues,
            total_tissues,
            tissues,
        }
    }
}

/// Classification of the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Degraded,
    Critical,
    /// The aggregation itself failed
    Error,
}

impl OverallStatus {
    /// Classify a healthy-component percentage.
    pub fn from_percentage(percentage: f64, thresholds: &HealthThresholds) -> Self {
        if percentage < thresholds.critical_below {
            OverallStatus::Critical
        } else if percentage < thresholds.degraded_below {
            OverallStatus::Degraded
        } else if percentage < thresholds.warning_below {
            OverallStatus::Warning
        } else {
            OverallStatus::Healthy
        }
    }

    /// Statuses that raise a system health warning.
    pub fn is_alarming(&self) -> bool {
        matches!(self, OverallStatus::Critical | OverallStatus::Degraded)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Warning => "warning",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Critical => "critical",
            OverallStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Healthy/total counts per level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_cells: usize,
    pub healthy_cells: usize,
    pub total_tissues: usize,
    pub healthy_tissues: usize,
    pub total_organs: usize,
    pub healthy_organs: usize,
    pub total_components: usize,
    pub healthy_components: usize,

    /// Healthy components as a percentage of all components
    pub health_percentage: f64,
}

impl HealthSummary {
    /// Build a summary from per-level counts.
    ///
    /// A system with no components at all counts as fully healthy.
    pub fn new(
        (healthy_cells, total_cells): (usize, usize),
        (healthy_tissues, total_tissues): (usize, usize),
        (healthy_organs, total_organs): (usize, usize),
    ) -> Self {
        let total_components = total_cells + total_tissues + total_organs;
        let healthy_components = healthy_cells + healthy_tissues + healthy_organs;
        let health_percentage = if total_components == 0 {
            100.0
        } else {
            healthy_components as f64 / total_components as f64 * 100.0
        };

        Self {
            total_cells,
            healthy_cells,
            total_tissues,
            healthy_tissues,
            total_organs,
            healthy_organs,
            total_components,
            healthy_components,
            health_percentage,
        }
    }
}

/// Best-effort snapshot of the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthReport {
    pub timestamp: DateTime<Utc>,
    pub overall_status: OverallStatus,
    pub organs: BTreeMap<OrganId, OrganHealth>,
    pub tissues: BTreeMap<TissueId, TissueHealth>,
    pub cells: BTreeMap<CellId, CellHealth>,
    pub summary: HealthSummary,

    /// Set when `overall_status` is `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SystemHealthReport {
    /// Report produced when the aggregation machinery fails.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            overall_status: OverallStatus::Error,
            organs: BTreeMap::new(),
            tissues: BTreeMap::new(),
            cells: BTreeMap::new(),
            summary: HealthSummary::default(),
            error: Some(error.into()),
        }
    }
}
