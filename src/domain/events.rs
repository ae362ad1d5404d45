//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Payload carried by a stored event.
///
/// Each implementor is a sum type with one variant per event type, so replay
/// can match on the variant instead of inspecting untyped data.
pub trait DomainEvent: Clone + Debug + Send + Sync + 'static {
    /// Get the event type as a string
    fn event_type(&self) -> &'static str;
}

/// Account-related events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountEvent {
    /// Account was opened with a starting balance
    AccountCreated { initial_balance: i64 },

    /// Money was deposited (balance increased)
    MoneyDeposited { amount: i64 },

    /// Money was withdrawn (balance decreased)
    MoneyWithdrawn { amount: i64 },

    /// Account was closed; no further movements are accepted
    AccountClosed,
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated { .. } => "AccountCreated",
            AccountEvent::MoneyDeposited { .. } => "MoneyDeposited",
            AccountEvent::MoneyWithdrawn { .. } => "MoneyWithdrawn",
            AccountEvent::AccountClosed => "AccountClosed",
        }
    }
}
