//! Event Store module
//!
//! Persistence layer for Event Sourcing.
//! Holds events and snapshots in memory behind a single readers-writer lock.

mod error;
mod store;

pub use error::EventStoreError;
pub use store::{Event, EventStore, NewEvent, Snapshot, DEFAULT_SNAPSHOT_INTERVAL};
