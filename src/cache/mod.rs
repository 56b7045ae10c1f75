//! Latest-known-state cache.
//!
//! Holds one record per driver so late-joining subscribers can be
//! initialized with a snapshot. Records are replaced wholesale on every
//! write and never evicted.

mod state;

pub use state::StateCache;
