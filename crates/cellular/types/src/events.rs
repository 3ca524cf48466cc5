//! Lifecycle and health events
//!
//! Events are emitted by cells, tissues, organs and the manager, and relayed
//! upward unchanged through the component hierarchy.

use crate::connection::ConnectionType;
use crate::health::{HealthSummary, OverallStatus};
use crate::ids::{CellId, ComponentRef};
use crate::status::CellularStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Envelope for every event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellularEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Component that originated the event
    pub source: ComponentRef,

    /// The actual event
    pub kind: EventKind,
}

impl CellularEvent {
    pub fn new(source: impl Into<ComponentRef>, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            kind,
        }
    }

    /// Event from the manager itself
    pub fn system(kind: EventKind) -> Self {
        Self::new(ComponentRef::System, kind)
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════════════════════════════
    // REGISTRY
    // ═══════════════════════════════════════════════════════════════════
    CellRegistered,
    TissueRegistered,
    OrganRegistered,
    CellRemoved,
    TissueRemoved,
    OrganRemoved,

    // ═══════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════
    StatusChanged {
        old: CellularStatus,
        new: CellularStatus,
    },
    ProcessingFailed {
        error: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // GRAPH
    // ═══════════════════════════════════════════════════════════════════
    ConnectionCreated {
        source: CellId,
        target: CellId,
        connection_type: ConnectionType,
        bidirectional: bool,
    },
    ConnectionRemoved {
        source: CellId,
        target: CellId,
    },

    // ═══════════════════════════════════════════════════════════════════
    // SYSTEM
    // ═══════════════════════════════════════════════════════════════════
    SystemStarted,
    SystemStopped,
    SystemHealthWarning {
        overall_status: OverallStatus,
        summary: HealthSummary,
    },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::CellRegistered => EventType::CellRegistered,
            EventKind::TissueRegistered => EventType::TissueRegistered,
            EventKind::OrganRegistered => EventType::OrganRegistered,
            EventKind::CellRemoved => EventType::CellRemoved,
            EventKind::TissueRemoved => EventType::TissueRemoved,
            EventKind::OrganRemoved => EventType::OrganRemoved,
            EventKind::StatusChanged { .. } => EventType::StatusChanged,
            EventKind::ProcessingFailed { .. } => EventType::ProcessingFailed,
            EventKind::ConnectionCreated { .. } => EventType::ConnectionCreated,
            EventKind::ConnectionRemoved { .. } => EventType::ConnectionRemoved,
            EventKind::SystemStarted => EventType::SystemStarted,
            EventKind::SystemStopped => EventType::SystemStopped,
            EventKind::SystemHealthWarning { .. } => EventType::SystemHealthWarning,
        }
    }

    /// Wire name of the event, e.g. `cell_registered`
    pub fn name(&self) -> &'static str {
        self.event_type().as_str()
    }
}

/// Payload-free discriminant used to register handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CellRegistered,
    TissueRegistered,
    OrganRegistered,
    CellRemoved,
    TissueRemoved,
    OrganRemoved,
    StatusChanged,
    ProcessingFailed,
    ConnectionCreated,
    ConnectionRemoved,
    SystemStarted,
    SystemStopped,
    SystemHealthWarning,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CellRegistered => "cell_registered",
            EventType::TissueRegistered => "tissue_registered",
            EventType::OrganRegistered => "organ_registered",
            EventType::CellRemoved => "cell_removed",
            EventType::TissueRemoved => "tissue_removed",
            EventType::OrganRemoved => "organ_removed",
            EventType::StatusChanged => "status_changed",
            EventType::ProcessingFailed => "processing_failed",
            EventType::ConnectionCreated => "connection_created",
            EventType::ConnectionRemoved => "connection_removed",
            EventType::SystemStarted => "system_started",
            EventType::SystemStopped => "system_stopped",
            EventType::SystemHealthWarning => "system_health_warning",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
