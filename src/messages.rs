//! Wire messages pushed to subscribers.

use crate::error::{FleetError, Result};
use crate::types::LocationRecord;
use serde::{Deserialize, Serialize};

/// Messages a subscriber receives.
///
/// A subscriber gets exactly one `Init` first, then an `Update` per publish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FleetMessage {
    /// Full cache contents at registration time, ordered by id.
    Init { records: Vec<LocationRecord> },

    /// One changed record.
    Update { record: LocationRecord },
}

impl FleetMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            FleetMessage::Init { .. } => "init",
            FleetMessage::Update { .. } => "update",
        }
    }

    /// Encode as a JSON text frame.
    ///
    /// Fails if any record carries a NaN or infinite number: serde_json would
    /// write `null`, which `from_json` cannot read back.
    pub fn to_json(&self) -> Result<String> {
        let bad = match self {
            FleetMessage::Init { records } => records.iter().find(|r| !r.is_finite()),
            FleetMessage::Update { record } => Some(record).filter(|r| !r.is_finite()),
        };
        if let Some(record) = bad {
            return Err(FleetError::Serialization(format!(
                "non-finite number in record for driver {}",
                record.id
            )));
        }

        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| FleetError::Deserialization(e.to_string()))
    }
}
