//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod account;

pub use account::{AccountStatus, BankAccount};

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainEvent;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Serialize + DeserializeOwned {
    /// The type of events this aggregate handles
    type Event: DomainEvent;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Create an empty aggregate (version 0) for the given id
    fn with_id(id: &str) -> Self;

    /// Get the aggregate ID
    fn id(&self) -> &str;

    /// Get the current version (number of events applied, pending included)
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state.
    ///
    /// Must be a pure fold: the same sequence of events always yields the
    /// same state.
    fn apply(&mut self, event: &Self::Event);

    /// Events recorded in memory but not yet persisted
    fn uncommitted_changes(&self) -> &[Self::Event];

    /// Forget pending events once they are persisted
    fn mark_changes_committed(&mut self);

    /// Version the event store is expected to hold for this aggregate
    fn committed_version(&self) -> u64 {
        self.version() - self.uncommitted_changes().len() as u64
    }

    /// Check if a snapshot should be created
    fn should_snapshot(&self, interval: u64) -> bool {
        interval > 0 && self.version() > 0 && self.version() % interval == 0
    }
}
