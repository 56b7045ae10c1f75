//! Error types for the broadcast core's edges.
//!
//! Publishing, subscribing and fan-out never fail; errors only arise when
//! parsing producer input or encoding/decoding wire messages.

use thiserror::Error;

/// Main error type for fleetcast operations.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Unknown driver status: {0}")]
    UnknownStatus(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for FleetError {
    fn from(e: serde_json::Error) -> Self {
        FleetError::Serialization(e.to_string())
    }
}

/// Result type for fleetcast operations.
pub type Result<T> = std::result::Result<T, FleetError>;
