//! Error handling module
//!
//! Centralized error type for ledger operations.

use crate::domain::DomainError;
use crate::event_store::EventStoreError;
use crate::projection::ProjectionError;

/// Ledger-wide Result type
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger error types
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Maximum retries exceeded for account {0}")]
    MaxRetriesExceeded(String),

    // Validation errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Storage errors
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl LedgerError {
    /// Stable machine-readable code for the error
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::MaxRetriesExceeded(_) => "max_retries_exceeded",
            LedgerError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientBalance { .. } => "insufficient_balance",
                DomainError::AccountNotActive { .. } => "account_not_active",
                DomainError::AccountAlreadyExists(_) => "account_already_exists",
                DomainError::InvalidAmount(_) => "invalid_amount",
            },
            LedgerError::EventStore(store_err) => match store_err {
                EventStoreError::ConcurrencyConflict { .. } => "version_conflict",
                EventStoreError::AggregateNotFound(_) => "account_not_found",
                EventStoreError::InvalidEventData(_) => "invalid_event_data",
                EventStoreError::InvalidSnapshot { .. } => "invalid_snapshot",
                EventStoreError::Serialization(_) => "serialization_error",
            },
            LedgerError::Projection(ProjectionError::AccountNotFound(_)) => "account_not_found",
        }
    }

    /// Whether reloading and retrying the operation may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::EventStore(e) if e.is_concurrency_conflict())
    }
}
