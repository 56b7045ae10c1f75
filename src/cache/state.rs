//! Keyed map from driver id to its latest record.

use crate::types::{DriverId, LocationRecord};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Concurrency-safe latest-state cache.
///
/// Every record is inserted and read as a whole value under the lock, so a
/// reader never observes a partially written record. Snapshots are
/// point-in-time copies.
pub struct StateCache {
    records: RwLock<HashMap<DriverId, LocationRecord>>,
}

impl StateCache {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the latest record for a driver.
    pub fn get(&self, id: DriverId) -> Option<LocationRecord> {
        self.records.read().get(&id).cloned()
    }

    /// Insert or replace. No timestamp comparison: the last write wins.
    ///
    /// Returns the record that was replaced, if any.
    pub fn put(&self, record: LocationRecord) -> Option<LocationRecord> {
        self.records.write().insert(record.id, record)
    }

    /// Read-modify-write an existing record under a single write lock.
    ///
    /// Returns the updated record, or `None` (without calling `f`) if the id
    /// is unknown.
    pub fn modify<F>(&self, id: DriverId, f: F) -> Option<LocationRecord>
    where
        F: FnOnce(&mut LocationRecord),
    {
        let mut records = self.records.write();
        let record = records.get_mut(&id)?;
        f(record);
        Some(record.clone())
    }

    /// Copy of all current records, ordered by id.
    pub fn snapshot(&self) -> Vec<LocationRecord> {
        let mut records: Vec<LocationRecord> = self.records.read().values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn contains(&self, id: DriverId) -> bool {
        self.records.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}
