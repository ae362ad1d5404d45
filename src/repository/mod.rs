//! Repository module
//!
//! Translates between aggregates and the event store. This is the only
//! write path for aggregate events.

mod aggregate_repository;

pub use aggregate_repository::Repository;
