//! Error types for the cellular runtime
//!
//! Errors are split by concern. Most of them never reach the caller of the
//! manager's dispatch API: processing failures are recorded into the failing
//! cell's metrics, and a failed health aggregation is folded into the report.

use cellular_types::{CellId, CellularStatus, OrganId, TissueId};
use std::time::Duration;
use thiserror::Error;

/// Failures raised by a cell, tissue or organ implementation.
#[derive(Debug, Clone, Error)]
pub enum CellError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shutdown failed: {0}")]
    Shutdown(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Component is not accepting work (status: {0})")]
    Unavailable(CellularStatus),

    #[error("Coordination failed: {0}")]
    Coordination(String),

    #[error("Component panicked: {0}")]
    Panicked(String),
}

impl CellError {
    pub fn processing(msg: impl Into<String>) -> Self {
        CellError::Processing(msg.into())
    }
}

/// Result type for component implementations
pub type CellResult<T> = std::result::Result<T, CellError>;

/// Failures when editing the connection graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("Source cell not registered: {0}")]
    UnknownSource(CellId),

    #[error("Target cell not registered: {0}")]
    UnknownTarget(CellId),

    #[error("Connection not found: {from} -> {to}")]
    NotFound { from: CellId, to: CellId },

    #[error("Strength must lie in [0, 1], got {0}")]
    InvalidStrength(f64),

    #[error("Self connections are not allowed: {0}")]
    SelfLoop(CellId),
}

/// Failures when registering components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    #[error("Cell already registered: {0}")]
    CellAlreadyRegistered(CellId),

    #[error("Tissue already registered: {0}")]
    TissueAlreadyRegistered(TissueId),

    #[error("Organ already registered: {0}")]
    OrganAlreadyRegistered(OrganId),
}

/// Manager-level errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Runtime is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for manager operations
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
