//! Directed, typed, weighted edges between cells

use crate::ids::CellId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Topological scope of a connection.
///
/// Purely descriptive; the runtime only uses it to filter broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    TissueInternal,
    CrossTissue,
    OrganInternal,
    CrossOrgan,
    SystemExternal,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionType::TissueInternal => "tissue_internal",
            ConnectionType::CrossTissue => "cross_tissue",
            ConnectionType::OrganInternal => "organ_internal",
            ConnectionType::CrossOrgan => "cross_organ",
            ConnectionType::SystemExternal => "system_external",
        };
        f.write_str(s)
    }
}

/// Link quality attached to a connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkProfile {
    /// Nominal bandwidth (messages per second)
    pub bandwidth: f64,

    /// Nominal latency in milliseconds
    pub latency_ms: f64,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            bandwidth: 1000.0,
            latency_ms: 1.0,
        }
    }
}

/// A directed edge from `source_cell` to `target_cell`.
///
/// A bidirectional request produces two of these, one per direction. They are
/// independent values: changing one never changes its mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellularConnection {
    pub source_cell: CellId,
    pub target_cell: CellId,
    pub connection_type: ConnectionType,

    /// Edge weight in `[0, 1]`
    pub strength: f64,

    pub bandwidth: f64,
    pub latency_ms: f64,

    /// Whether this edge was created as half of a bidirectional pair
    pub bidirectional: bool,

    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl CellularConnection {
    pub fn new(
        source_cell: CellId,
        target_cell: CellId,
        connection_type: ConnectionType,
        strength: f64,
        link: LinkProfile,
    ) -> Self {
        let now = Utc::now();
        Self {
            source_cell,
            target_cell,
            connection_type,
            strength,
            bandwidth: link.bandwidth,
            latency_ms: link.latency_ms,
            bidirectional: false,
            metadata: HashMap::new(),
            created_at: now,
            last_used: now,
        }
    }

    /// Mark this edge as one half of a bidirectional pair.
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Attach metadata to the edge.
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build the reverse edge as a fresh, unlinked value.
    pub fn mirrored(&self) -> Self {
        let now = Utc::now();
        Self {
            source_cell: self.target_cell.clone(),
            target_cell: self.source_cell.clone(),
            connection_type: self.connection_type,
            strength: self.strength,
            bandwidth: self.bandwidth,
            latency_ms: self.latency_ms,
            bidirectional: self.bidirectional,
            metadata: self.metadata.clone(),
            created_at: now,
            last_used: now,
        }
    }

    /// Stamp the edge as used now.
    pub fn touch(&mut self) {
        self.last_used = Utc::now();
    }

    /// Whether the edge passes an optional type filter.
    pub fn matches(&self, filter: Option<ConnectionType>) -> bool {
        filter.map_or(true, |t| t == self.connection_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> CellularConnection {
        CellularConnection::new(
            CellId::new("a"),
            CellId::new("b"),
            ConnectionType::CrossTissue,
            0.6,
            LinkProfile::default(),
        )
    }

    #[test]
    fn test_mirror_swaps_endpoints() {
        let forward = edge().with_bidirectional(true);
        let reverse = forward.mirrored();

        assert_eq!(reverse.source_cell, CellId::new("b"));
        assert_eq!(reverse.target_cell, CellId::new("a"));
        assert_eq!(reverse.connection_type, ConnectionType::CrossTissue);
        assert!(reverse.bidirectional);
    }

    #[test]
    fn test_mirror_is_independent() {
        let forward = edge();
        let mut reverse = forward.mirrored();
        reverse.strength = 0.1;
        assert_eq!(forward.strength, 0.6);
    }

    #[test]
    fn test_type_filter() {
        let e = edge();
        assert!(e.matches(None));
        assert!(e.matches(Some(ConnectionType::CrossTissue)));
        assert!(!e.matches(Some(ConnectionType::CrossOrgan)));
    }
}
