//! Broadcast coordinator tying the cache and the registry together.

use crate::cache::StateCache;
use crate::messages::FleetMessage;
use crate::subscriptions::{
    SendFailure, Subscriber, SubscriberId, SubscriberRegistry, SubscriptionConfig,
    SubscriptionHandle,
};
use crate::types::{DriverId, DriverStatus, LocationRecord, LocationUpdate};
use chrono::Utc;
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinator configuration.
#[derive(Clone, Debug)]
pub struct BroadcastConfig {
    /// Per-subscriber buffer for channel-backed subscriptions. A subscriber
    /// that falls this far behind is dropped.
    pub buffer_size: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            buffer_size: SubscriptionConfig::default().buffer_size,
        }
    }
}

impl BroadcastConfig {
    fn subscription(&self) -> SubscriptionConfig {
        SubscriptionConfig {
            buffer_size: self.buffer_size,
        }
    }
}

/// The broadcast core.
///
/// Construct once and share behind an `Arc` with every producer and
/// transport task. Provides:
/// - Publishing location and status updates (cache write + fan-out)
/// - Subscribing with an initial snapshot
/// - Read access to the current state
///
/// `write_lock` spans the cache write and fan-out of a publish, and the
/// snapshot and registration of a subscribe. Every publish is therefore
/// either contained in a new subscriber's snapshot or delivered to it.
pub struct BroadcastCoordinator {
    config: BroadcastConfig,

    cache: StateCache,

    registry: SubscriberRegistry,

    write_lock: Mutex<()>,
}

impl BroadcastCoordinator {
    pub fn new() -> Self {
        Self::with_config(BroadcastConfig::default())
    }

    pub fn with_config(config: BroadcastConfig) -> Self {
        Self {
            config,
            cache: StateCache::new(),
            registry: SubscriberRegistry::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    // --- Producers ---

    /// Store a location update and push it to every subscriber.
    ///
    /// The producer's timestamp is kept when present; otherwise the record is
    /// stamped with the current time. Returns the record as stored.
    pub fn publish(&self, update: LocationUpdate) -> LocationRecord {
        let record = update.into_record(Utc::now());

        let _lock = self.write_lock.lock();
        self.cache.put(record.clone());
        self.fan_out(FleetMessage::Update {
            record: record.clone(),
        });

        record
    }

    /// Change the status of a known driver and push the result.
    ///
    /// Unknown ids are ignored: no cache change, no message. A status can
    /// legitimately arrive before the driver's first location.
    pub fn update_status(&self, id: DriverId, status: DriverStatus) -> Option<LocationRecord> {
        let _lock = self.write_lock.lock();

        let Some(record) = self.cache.modify(id, |record| {
            record.status = status;
            record.updated_at = Utc::now();
        }) else {
            debug!(driver_id = %id, %status, "ignoring status update for unknown driver");
            return None;
        };

        self.fan_out(FleetMessage::Update {
            record: record.clone(),
        });

        Some(record)
    }

    // --- Subscribers ---

    /// Register a channel-backed subscriber.
    ///
    /// Returns the `init` message to send first, and a handle whose receiver
    /// yields every later `update`.
    pub fn subscribe(&self) -> (FleetMessage, SubscriptionHandle) {
        let (sender, receiver) =
            bounded::<Arc<FleetMessage>>(self.config.subscription().buffer_size);
        let (init, id) = self.attach(Arc::new(sender));

        (init, SubscriptionHandle { id, receiver })
    }

    /// Register a caller-supplied push primitive.
    ///
    /// The subscriber's `deliver` is called with `write_lock` held, so it must
    /// not re-enter `publish`, `update_status`, `subscribe` or `attach`.
    /// `unsubscribe` only touches the registry and is safe to call from it.
    pub fn attach(&self, subscriber: Arc<dyn Subscriber>) -> (FleetMessage, SubscriberId) {
        let _lock = self.write_lock.lock();

        let records = self.cache.snapshot();
        let id = self.registry.add(subscriber);

        info!(
            subscriber = %id,
            records = records.len(),
            subscribers = self.registry.len(),
            "subscriber registered"
        );

        (FleetMessage::Init { records }, id)
    }

    /// Unregister. Unknown or already-removed ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.registry.remove(id) {
            info!(
                subscriber = %id,
                subscribers = self.registry.len(),
                "subscriber unregistered"
            );
        }
    }

    // --- Reads ---

    pub fn get(&self, id: DriverId) -> Option<LocationRecord> {
        self.cache.get(id)
    }

    /// All current records, ordered by id.
    pub fn locations(&self) -> Vec<LocationRecord> {
        self.cache.snapshot()
    }

    pub fn driver_count(&self) -> usize {
        self.cache.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Internal fan-out. Drops subscribers that fail to receive.
    ///
    /// Callers hold `write_lock`.
    fn fan_out(&self, message: FleetMessage) {
        let message = Arc::new(message);
        let mut failed: Vec<(SubscriberId, SendFailure)> = Vec::new();
        let mut delivered = 0usize;

        self.registry.for_each(|id, subscriber| match subscriber.deliver(&message) {
            Ok(()) => delivered += 1,
            Err(failure) => failed.push((id, failure)),
        });

        if let FleetMessage::Update { record } = message.as_ref() {
            debug!(
                driver_id = %record.id,
                status = %record.status,
                delivered,
                failed = failed.len(),
                "broadcast location update"
            );
        }

        for (id, failure) in failed {
            if self.registry.remove(id) {
                warn!(
                    subscriber = %id,
                    reason = %failure,
                    subscribers = self.registry.len(),
                    "dropping subscriber after failed send"
                );
            }
        }
    }
}

impl Default for BroadcastCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Push primitive that always fails.
    struct BrokenSubscriber {
        attempts: AtomicUsize,
    }

    impl Subscriber for BrokenSubscriber {
        fn deliver(&self, _message: &Arc<FleetMessage>) -> Result<(), SendFailure> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SendFailure::Disconnected)
        }
    }

    /// Push primitive that unregisters itself on the first message.
    struct OneShotSubscriber {
        coordinator: Arc<BroadcastCoordinator>,
        id: Mutex<Option<SubscriberId>>,
        received: AtomicUsize,
    }

    impl Subscriber for OneShotSubscriber {
        fn deliver(&self, _message: &Arc<FleetMessage>) -> Result<(), SendFailure> {
            self.received.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *self.id.lock() {
                self.coordinator.unsubscribe(id);
            }
            Ok(())
        }
    }

    fn make_update(id: u64) -> LocationUpdate {
        LocationUpdate::new(DriverId(id), -6.2, 106.8).name(format!("Driver {}", id))
    }

    fn expect_update(handle: &SubscriptionHandle) -> LocationRecord {
        let message = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        match message.as_ref() {
            FleetMessage::Update { record } => record.clone(),
            other => panic!("Expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_publish_stores_record() {
        let coordinator = BroadcastCoordinator::new();

        let stored = coordinator.publish(make_update(1).speed(12.0));

        assert_eq!(coordinator.get(DriverId(1)), Some(stored));
        assert_eq!(coordinator.driver_count(), 1);
    }

    #[test]
    fn test_publish_stamps_missing_timestamp() {
        let coordinator = BroadcastCoordinator::new();
        let before = Utc::now();

        let stored = coordinator.publish(make_update(1));

        assert!(stored.updated_at >= before);
        assert!(stored.updated_at <= Utc::now());
    }

    #[test]
    fn test_subscribe_gets_snapshot() {
        let coordinator = BroadcastCoordinator::new();
        coordinator.publish(make_update(2));
        coordinator.publish(make_update(1));

        let (init, handle) = coordinator.subscribe();

        match init {
            FleetMessage::Init { records } => {
                let ids: Vec<u64> = records.iter().map(|r| r.id.0).collect();
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("Expected init, got {:?}", other),
        }
        // The snapshot is not replayed through the channel.
        assert!(handle.try_recv().is_err());
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let coordinator = BroadcastCoordinator::new();
        let handles: Vec<SubscriptionHandle> =
            (0..3).map(|_| coordinator.subscribe().1).collect();

        coordinator.publish(make_update(1).status(DriverStatus::Busy));

        for handle in &handles {
            let record = expect_update(handle);
            assert_eq!(record.status, DriverStatus::Busy);
            assert!(handle.try_recv().is_err());
        }
    }

    #[test]
    fn test_failed_subscriber_removed_others_served() {
        let coordinator = BroadcastCoordinator::new();
        let (_, healthy_a) = coordinator.subscribe();
        let broken = Arc::new(BrokenSubscriber {
            attempts: AtomicUsize::new(0),
        });
        let (_, broken_id) = coordinator.attach(broken.clone());
        let (_, healthy_b) = coordinator.subscribe();
        assert_eq!(coordinator.subscriber_count(), 3);

        coordinator.publish(make_update(1));

        expect_update(&healthy_a);
        expect_update(&healthy_b);
        assert_eq!(coordinator.subscriber_count(), 2);
        assert!(!coordinator.registry.contains(broken_id));

        // Not retried.
        coordinator.publish(make_update(1));
        assert_eq!(broken.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_handle_self_unregisters() {
        let coordinator = BroadcastCoordinator::new();
        let (_, handle) = coordinator.subscribe();
        drop(handle);

        coordinator.publish(make_update(1));

        assert_eq!(coordinator.subscriber_count(), 0);
    }

    #[test]
    fn test_slow_subscriber_dropped() {
        let coordinator = BroadcastCoordinator::with_config(BroadcastConfig { buffer_size: 2 });
        let (_, slow) = coordinator.subscribe();
        let (_, fast) = coordinator.subscribe();

        for i in 0..5 {
            coordinator.publish(make_update(i));
            fast.drain();
        }

        assert_eq!(coordinator.subscriber_count(), 1);
        assert_eq!(slow.drain().len(), 2);
    }

    #[test]
    fn test_update_status_known_driver() {
        let coordinator = BroadcastCoordinator::new();
        let original = coordinator.publish(make_update(1).speed(30.0));
        let (_, handle) = coordinator.subscribe();

        let updated = coordinator
            .update_status(DriverId(1), DriverStatus::Offline)
            .unwrap();

        assert_eq!(updated.status, DriverStatus::Offline);
        assert_eq!(updated.speed, 30.0);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(expect_update(&handle), updated);
        assert_eq!(coordinator.get(DriverId(1)), Some(updated));
    }

    #[test]
    fn test_update_status_unknown_driver_is_noop() {
        let coordinator = BroadcastCoordinator::new();
        coordinator.publish(make_update(1));
        let (_, handle) = coordinator.subscribe();
        let before = coordinator.locations();

        let result = coordinator.update_status(DriverId(99), DriverStatus::Busy);

        assert!(result.is_none());
        assert_eq!(coordinator.locations(), before);
        assert!(handle.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_idempotent() {
        let coordinator = BroadcastCoordinator::new();
        let (_, a) = coordinator.subscribe();
        let (_, b) = coordinator.subscribe();

        coordinator.unsubscribe(a.id);
        coordinator.unsubscribe(a.id);
        assert_eq!(coordinator.subscriber_count(), 1);

        coordinator.publish(make_update(1));
        expect_update(&b);
    }

    #[test]
    fn test_unsubscribed_handle_disconnects() {
        let coordinator = BroadcastCoordinator::new();
        let (_, handle) = coordinator.subscribe();

        coordinator.unsubscribe(handle.id);
        coordinator.publish(make_update(1));

        // Sender dropped with the registry entry.
        assert!(matches!(
            handle.try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_unsubscribe_from_inside_deliver() {
        let coordinator = Arc::new(BroadcastCoordinator::new());
        let one_shot = Arc::new(OneShotSubscriber {
            coordinator: Arc::clone(&coordinator),
            id: Mutex::new(None),
            received: AtomicUsize::new(0),
        });
        let (_, id) = coordinator.attach(one_shot.clone());
        *one_shot.id.lock() = Some(id);
        let (_, other) = coordinator.subscribe();

        let (done_tx, done_rx) = bounded(1);
        let publisher = {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || {
                coordinator.publish(make_update(1));
                coordinator.publish(make_update(2));
                done_tx.send(()).unwrap();
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        publisher.join().unwrap();

        assert_eq!(one_shot.received.load(Ordering::SeqCst), 1);
        assert!(!coordinator.registry.contains(id));
        assert_eq!(coordinator.subscriber_count(), 1);
        assert_eq!(other.drain().len(), 2);
    }
}
