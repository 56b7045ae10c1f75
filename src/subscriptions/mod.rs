//! Subscriber registration for live location feeds.
//!
//! This module provides the membership side of fan-out:
//! - The `Subscriber` push primitive, implemented for bounded crossbeam senders
//! - A registry with stable-view iteration
//! - Channel-backed handles for in-process consumers
//!
//! # Example
//!
//! ```ignore
//! let coordinator = BroadcastCoordinator::new();
//! let (init, handle) = coordinator.subscribe();
//!
//! send_to_client(init.to_json()?);
//! while let Ok(message) = handle.recv() {
//!     send_to_client(message.to_json()?);
//! }
//! coordinator.unsubscribe(handle.id);
//! ```

mod registry;
mod types;

pub use registry::SubscriberRegistry;
pub use types::{SendFailure, Subscriber, SubscriberId, SubscriptionConfig, SubscriptionHandle};
