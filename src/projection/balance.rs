//! Balance Projection
//!
//! Read model of account balances folded directly from stored events.
//! It keeps its own transition logic, independent of the aggregate, so any
//! number of projections can be derived from the same log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::domain::{AccountEvent, Amount, Balance};
use crate::event_store::{Event, EventStore};

/// Denormalized balance record for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub balance: i64,
    pub closed: bool,
    /// Event type of the last projected event
    pub last_event: String,
    /// Global version of the last projected event
    pub last_version: u64,
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    fn empty(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            balance: 0,
            closed: false,
            last_event: String::new(),
            last_version: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Projection errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

/// Balance projection over `AccountEvent`s
#[derive(Debug, Default)]
pub struct BalanceProjection {
    balances: RwLock<HashMap<String, AccountBalance>>,
}

impl BalanceProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the read model.
    ///
    /// Events at or below the record's last projected version are skipped, so
    /// feeding the same event twice has no effect. Returns whether the event
    /// was applied.
    pub fn project(&self, event: &Event<AccountEvent>) -> bool {
        let mut balances = self.balances.write();
        let record = balances
            .entry(event.aggregate_id.clone())
            .or_insert_with(|| AccountBalance::empty(&event.aggregate_id));

        if event.version <= record.last_version {
            tracing::debug!(
                "Skipping already projected event {} (version {}) for {}",
                event.event_type,
                event.version,
                event.aggregate_id
            );
            return false;
        }

        let next_balance = match &event.data {
            AccountEvent::AccountCreated { initial_balance } => {
                record.closed = false;
                Balance::new(*initial_balance)
            }
            AccountEvent::MoneyDeposited { amount } => Balance::new(record.balance)
                .and_then(|balance| balance.credit(&Amount::new(*amount)?)),
            AccountEvent::MoneyWithdrawn { amount } => Balance::new(record.balance)
                .and_then(|balance| balance.debit(&Amount::new(*amount)?)),
            AccountEvent::AccountClosed => {
                record.closed = true;
                Balance::new(record.balance)
            }
        };

        match next_balance {
            Ok(balance) => record.balance = balance.value(),
            Err(e) => {
                tracing::error!(
                    "Invalid {} event (version {}) for {}: {}",
                    event.event_type,
                    event.version,
                    event.aggregate_id,
                    e
                );
            }
        }

        record.last_event = event.event_type.clone();
        record.last_version = event.version;
        record.updated_at = Utc::now();
        true
    }

    /// Fold a sequence of events; returns how many were applied
    pub fn project_all<'a>(
        &self,
        events: impl IntoIterator<Item = &'a Event<AccountEvent>>,
    ) -> usize {
        events
            .into_iter()
            .filter(|event| self.project(event))
            .count()
    }

    /// Project every stored event of one account newer than the last one
    /// projected for it. Concurrent callers may overlap; the version check in
    /// `project` drops the duplicates.
    pub fn catch_up(&self, store: &EventStore<AccountEvent>, account_id: &str) -> usize {
        let last_version = self
            .balances
            .read()
            .get(account_id)
            .map_or(0, |record| record.last_version);

        self.project_all(&store.get_events_since(account_id, last_version))
    }

    /// Discard the read model and rebuild it from every stored event
    pub fn rebuild(&self, store: &EventStore<AccountEvent>) -> usize {
        self.balances.write().clear();
        let applied = self.project_all(&store.get_all_events());

        tracing::info!("Balance projection rebuilt from {} event(s)", applied);
        applied
    }

    /// Get the projected balance for an account
    pub fn get_balance(&self, account_id: &str) -> Result<AccountBalance, ProjectionError> {
        self.balances
            .read()
            .get(account_id)
            .cloned()
            .ok_or_else(|| ProjectionError::AccountNotFound(account_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.balances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.read().is_empty()
    }
}
