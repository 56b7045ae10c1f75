//! # Fleetcast
//!
//! In-memory broadcast core for live vehicle tracking: producers publish
//! driver locations, subscribers receive a snapshot on join and every update
//! after it.
//!
//! ## Core Concepts
//!
//! - **State cache**: latest record per driver, last write wins
//! - **Subscriber registry**: live outbound channels, dropped on failed send
//! - **Coordinator**: publish/subscribe protocol over both
//! - **Live view**: the consumer-side mirror built from received messages
//!
//! ## Example
//!
//! ```ignore
//! use fleetcast::{BroadcastCoordinator, DriverId, DriverStatus, LocationUpdate};
//! use std::sync::Arc;
//!
//! let coordinator = Arc::new(BroadcastCoordinator::new());
//!
//! // Producer side
//! coordinator.publish(
//!     LocationUpdate::new(DriverId(1), -6.2088, 106.8456)
//!         .name("Ahmad Kurniawan")
//!         .status(DriverStatus::Busy)
//!         .speed(30.0),
//! );
//!
//! // Transport side, per connection
//! let (init, handle) = coordinator.subscribe();
//! socket.send(init.to_json()?)?;
//! while let Ok(message) = handle.recv() {
//!     socket.send(message.to_json()?)?;
//! }
//! coordinator.unsubscribe(handle.id);
//! ```

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod messages;
pub mod subscriptions;
pub mod types;
pub mod view;

// Re-exports
pub use cache::StateCache;
pub use coordinator::{BroadcastConfig, BroadcastCoordinator};
pub use error::{FleetError, Result};
pub use messages::FleetMessage;
pub use subscriptions::{
    SendFailure, Subscriber, SubscriberId, SubscriberRegistry, SubscriptionConfig,
    SubscriptionHandle,
};
pub use types::*;
pub use view::LiveView;
