//! Projection module
//!
//! Read models derived from the event log.
//! Projections are optimized for queries and never write events.

mod balance;

pub use balance::{AccountBalance, BalanceProjection, ProjectionError};
