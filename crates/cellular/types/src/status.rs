//! Lifecycle status shared by cells, tissues and organs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a component
///
/// ```text
/// INACTIVE --initialize ok--> ACTIVE --process--> PROCESSING --ok--> ACTIVE
///                                                            \--err--> ERROR
/// ```
///
/// `ERROR` is left only by a later successful call. `MAINTENANCE` and
/// `DEGRADED` are only ever set by an operator, never by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellularStatus {
    #[default]
    Inactive,
    Initializing,
    Active,
    Processing,
    Error,
    Maintenance,
    Degraded,
}

impl CellularStatus {
    /// Transient states are not broadcast as status changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, CellularStatus::Initializing | CellularStatus::Processing)
    }

    /// Whether the component accepts work in this state.
    pub fn accepts_work(&self) -> bool {
        !matches!(self, CellularStatus::Maintenance)
    }
}

impl fmt::Display for CellularStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellularStatus::Inactive => "inactive",
            CellularStatus::Initializing => "initializing",
            CellularStatus::Active => "active",
            CellularStatus::Processing => "processing",
            CellularStatus::Error => "error",
            CellularStatus::Maintenance => "maintenance",
            CellularStatus::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&CellularStatus::Maintenance).unwrap();
        assert_eq!(json, "\"MAINTENANCE\"");
        let parsed: CellularStatus = serde_json::from_str("\"DEGRADED\"").unwrap();
        assert_eq!(parsed, CellularStatus::Degraded);
    }

    #[test]
    fn test_maintenance_refuses_work() {
        assert!(!CellularStatus::Maintenance.accepts_work());
        assert!(CellularStatus::Error.accepts_work());
        assert!(CellularStatus::Processing.is_transient());
    }
}
