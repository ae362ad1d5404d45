//! event_ledger Library
//!
//! In-memory event-sourced bank account ledger: an append-only event store
//! with optimistic concurrency and snapshots, a `BankAccount` aggregate,
//! a repository, and a balance projection.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod event_store;
pub mod handlers;
pub mod projection;
pub mod repository;

mod error;

pub use aggregate::{Aggregate, BankAccount};
pub use config::Config;
pub use domain::{AccountEvent, Amount, AmountError, Balance, DomainError, OperationContext};
pub use error::{LedgerError, LedgerResult};
pub use event_store::{Event, EventStore, EventStoreError};
pub use projection::BalanceProjection;
pub use repository::Repository;
