//! Subscription types for live location feeds.

use crate::messages::FleetMessage;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a channel-backed subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered messages before the subscriber is dropped.
    /// Default: 256
    pub buffer_size: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self { buffer_size: 256 }
    }
}

/// Unique identifier for a registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberId({})", self.0)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a push to a subscriber failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendFailure {
    /// Send buffer overflowed (slow consumer).
    Full,
    /// The receiving side is gone.
    Disconnected,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendFailure::Full => f.write_str("buffer full"),
            SendFailure::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Outbound channel to one subscriber.
///
/// `deliver` must not block: enqueue the message or fail immediately. Any
/// failure unregisters the subscriber.
///
/// `deliver` runs while the coordinator holds its write lock. It may call
/// `BroadcastCoordinator::unsubscribe` and the read-only accessors, but
/// calling `publish`, `update_status`, `subscribe` or `attach` from inside
/// it deadlocks.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, message: &Arc<FleetMessage>) -> Result<(), SendFailure>;
}

impl Subscriber for Sender<Arc<FleetMessage>> {
    fn deliver(&self, message: &Arc<FleetMessage>) -> Result<(), SendFailure> {
        match self.try_send(Arc::clone(message)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SendFailure::Full),
            Err(TrySendError::Disconnected(_)) => Err(SendFailure::Disconnected),
        }
    }
}

/// Handle to a channel-backed subscription.
///
/// Dropping the handle disconnects the channel; the next fan-out notices
/// and unregisters the subscriber.
pub struct SubscriptionHandle {
    pub id: SubscriberId,
    /// Channel to receive update messages.
    pub receiver: Receiver<Arc<FleetMessage>>,
}

impl SubscriptionHandle {
    /// Receive the next message (blocking).
    pub fn recv(&self) -> Result<Arc<FleetMessage>, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message (non-blocking).
    pub fn try_recv(&self) -> Result<Arc<FleetMessage>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Arc<FleetMessage>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered, without waiting.
    pub fn drain(&self) -> Vec<Arc<FleetMessage>> {
        self.receiver.try_iter().collect()
    }
}
