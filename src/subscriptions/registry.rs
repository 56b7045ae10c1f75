//! Registry of live subscribers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{SubscriberId, Subscriber};

/// Set of registered outbound channels.
///
/// Membership changes are individually atomic. The registry never looks at
/// message contents.
pub struct SubscriberRegistry {
    /// Active subscribers by ID.
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    /// Counter for generating subscriber IDs.
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber and return its id.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().insert(id, subscriber);
        id
    }

    /// Unregister. Returns false if the id was not registered, which is not
    /// an error: an explicit close and a failed send may race to remove.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    /// Apply `f` to every subscriber registered at the time of the call.
    ///
    /// Iterates over a copy taken under the read lock, so `f` may add or
    /// remove subscribers without deadlocking or skipping entries.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(SubscriberId, &Arc<dyn Subscriber>),
    {
        let current: Vec<(SubscriberId, Arc<dyn Subscriber>)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, sub)| (*id, Arc::clone(sub)))
            .collect();

        for (id, sub) in &current {
            f(*id, sub);
        }
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
