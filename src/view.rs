//! Subscriber-side mirror of the fleet.
//!
//! A dashboard keeps one of these per connection: `init` replaces the whole
//! view, `update` upserts a single driver. After a reconnect the fresh `init`
//! wipes whatever the previous connection left behind.

use crate::messages::FleetMessage;
use crate::types::{DriverId, LocationRecord};
use std::collections::BTreeMap;

/// Locally materialized fleet state built from received messages.
#[derive(Clone, Debug, Default)]
pub struct LiveView {
    drivers: BTreeMap<DriverId, LocationRecord>,
    /// Whether an `init` has been applied yet.
    initialized: bool,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, message: &FleetMessage) {
        match message {
            FleetMessage::Init { records } => {
                self.drivers = records.iter().map(|r| (r.id, r.clone())).collect();
                self.initialized = true;
            }
            FleetMessage::Update { record } => {
                self.drivers.insert(record.id, record.clone());
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn get(&self, id: DriverId) -> Option<&LocationRecord> {
        self.drivers.get(&id)
    }

    /// Records ordered by id.
    pub fn records(&self) -> Vec<LocationRecord> {
        self.drivers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
