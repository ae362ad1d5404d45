//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::AmountError;

/// Business rule violations raised by aggregate commands.
///
/// A command that fails with one of these records no event; the aggregate
/// is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Insufficient balance for a withdrawal
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// Account is not in the active state
    #[error("Account {account_id} is not active (status: {status})")]
    AccountNotActive { account_id: String, status: String },

    /// Account was already created
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// Invalid amount (zero or negative)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Create an account not active error
    pub fn account_not_active(account_id: impl Into<String>, status: impl ToString) -> Self {
        Self::AccountNotActive {
            account_id: account_id.into(),
            status: status.to_string(),
        }
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
