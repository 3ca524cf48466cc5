//! Strongly-typed identifiers for cellular components
//!
//! Component ids are caller-chosen names wrapped in newtype structs so a
//! `TissueId` can never be passed where a `CellId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! component_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

component_id!(
    /// Unique identifier for a cell within a manager
    CellId
);

component_id!(
    /// Unique identifier for a tissue within a manager
    TissueId
);

component_id!(
    /// Unique identifier for an organ within a manager
    OrganId
);

/// Reference to any component that can emit events or report health
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ComponentRef {
    Cell(CellId),
    Tissue(TissueId),
    Organ(OrganId),
    /// The manager itself
    System,
}

impl ComponentRef {
    /// Short name of the component level
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentRef::Cell(_) => "cell",
            ComponentRef::Tissue(_) => "tissue",
            ComponentRef::Organ(_) => "organ",
            ComponentRef::System => "system",
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentRef::Cell(id) => write!(f, "cell:{}", id),
            ComponentRef::Tissue(id) => write!(f, "tissue:{}", id),
            ComponentRef::Organ(id) => write!(f, "organ:{}", id),
            ComponentRef::System => write!(f, "system"),
        }
    }
}

impl From<CellId> for ComponentRef {
    fn from(id: CellId) -> Self {
        ComponentRef::Cell(id)
    }
}

impl From<TissueId> for ComponentRef {
    fn from(id: TissueId) -> Self {
        ComponentRef::Tissue(id)
    }
}

impl From<OrganId> for ComponentRef {
    fn from(id: OrganId) -> Self {
        ComponentRef::Organ(id)
    }
}
