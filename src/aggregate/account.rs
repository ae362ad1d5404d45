//! BankAccount Aggregate
//!
//! BankAccount is the core aggregate for managing balances.
//! Commands validate business rules and record events; state only ever
//! changes by applying those events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{AccountEvent, Amount, Balance, DomainError};

use super::Aggregate;

/// Account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// No event applied yet
    #[default]
    Uninitialized,
    Active,
    Closed,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Uninitialized => write!(f, "uninitialized"),
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Closed => write!(f, "closed"),
        }
    }
}

/// BankAccount Aggregate
///
/// Not internally synchronized: one instance must not be mutated from
/// several threads at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique account ID
    id: String,

    /// Current balance (derived from events)
    balance: Balance,

    /// Account status
    status: AccountStatus,

    /// Current version (number of events applied)
    version: u64,

    /// Recorded events not yet persisted
    #[serde(skip)]
    changes: Vec<AccountEvent>,
}

impl BankAccount {
    /// Create an empty, uninitialized account
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Open the account with a starting balance
    pub fn create_account(&mut self, initial_balance: i64) -> Result<(), DomainError> {
        if self.version != 0 {
            return Err(DomainError::AccountAlreadyExists(self.id.clone()));
        }

        let initial = Balance::new(initial_balance)?;

        self.record_change(AccountEvent::AccountCreated {
            initial_balance: initial.value(),
        });
        Ok(())
    }

    /// Deposit money into the account
    pub fn deposit(&mut self, amount: i64) -> Result<(), DomainError> {
        let amount = Amount::new(amount)?;
        self.ensure_active()?;
        self.balance.credit(&amount)?;

        self.record_change(AccountEvent::MoneyDeposited {
            amount: amount.value(),
        });
        Ok(())
    }

    /// Withdraw money from the account
    pub fn withdraw(&mut self, amount: i64) -> Result<(), DomainError> {
        let amount = Amount::new(amount)?;
        self.ensure_active()?;

        if !self.balance.is_sufficient_for(&amount) {
            return Err(DomainError::insufficient_balance(
                amount.value(),
                self.balance.value(),
            ));
        }

        self.record_change(AccountEvent::MoneyWithdrawn {
            amount: amount.value(),
        });
        Ok(())
    }

    /// Close the account
    pub fn close(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.record_change(AccountEvent::AccountClosed);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != AccountStatus::Active {
            return Err(DomainError::account_not_active(&self.id, self.status));
        }
        Ok(())
    }

    /// Apply the event locally, then keep it for persistence
    fn record_change(&mut self, event: AccountEvent) {
        self.apply(&event);
        self.changes.push(event);
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn balance(&self) -> i64 {
        self.balance.value()
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }
}

impl Aggregate for BankAccount {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "BankAccount"
    }

    fn with_id(id: &str) -> Self {
        Self::new(id)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &AccountEvent) {
        match event {
            AccountEvent::AccountCreated { initial_balance } => {
                match Balance::new(*initial_balance) {
                    Ok(balance) => self.balance = balance,
                    Err(e) => {
                        tracing::error!(
                            "Invalid initial balance in AccountCreated event for account {}: {}",
                            self.id,
                            e
                        );
                    }
                }
                self.status = AccountStatus::Active;
            }

            AccountEvent::MoneyDeposited { amount } => {
                match Amount::new(*amount).and_then(|amt| self.balance.credit(&amt)) {
                    Ok(new_balance) => self.balance = new_balance,
                    Err(e) => {
                        tracing::error!(
                            "Invalid MoneyDeposited event for account {}: {}",
                            self.id,
                            e
                        );
                    }
                }
            }

            AccountEvent::MoneyWithdrawn { amount } => {
                match Amount::new(*amount).and_then(|amt| self.balance.debit(&amt)) {
                    Ok(new_balance) => self.balance = new_balance,
                    Err(e) => {
                        tracing::error!(
                            "Invalid MoneyWithdrawn event for account {}: {}",
                            self.id,
                            e
                        );
                    }
                }
            }

            AccountEvent::AccountClosed => {
                self.status = AccountStatus::Closed;
            }
        }

        self.version += 1;
    }

    fn uncommitted_changes(&self) -> &[AccountEvent] {
        &self.changes
    }

    fn mark_changes_committed(&mut self) {
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(initial_balance: i64) -> BankAccount {
        let mut account = BankAccount::new("acc-1");
        account.create_account(initial_balance).unwrap();
        account
    }

    #[test]
    fn test_account_create() {
        let account = opened(1000);

        assert_eq!(account.balance(), 1000);
        assert_eq!(account.status(), AccountStatus::Active);
        assert_eq!(account.version(), 1);
        assert_eq!(
            account.uncommitted_changes(),
            &[AccountEvent::AccountCreated { initial_balance: 1000 }]
        );
    }

    #[test]
    fn test_create_twice_rejected() {
        let mut account = opened(10);

        let result = account.create_account(20);

        assert_eq!(result, Err(DomainError::AccountAlreadyExists("acc-1".to_string())));
        assert_eq!(account.balance(), 10);
        assert_eq!(account.uncommitted_changes().len(), 1);
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let mut account = BankAccount::new("acc-1");
        assert!(matches!(
            account.create_account(-1),
            Err(DomainError::InvalidAmount(_))
        ));
        assert_eq!(account.version(), 0);
    }

    #[test]
    fn test_uninitialized_account_rejects_deposit() {
        let mut account = BankAccount::new("acc-1");
        assert!(matches!(
            account.deposit(10),
            Err(DomainError::AccountNotActive { .. })
        ));
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut account = opened(1000);

        account.deposit(500).unwrap();
        account.deposit(200).unwrap();
        account.withdraw(300).unwrap();

        assert_eq!(account.balance(), 1400);
        assert_eq!(account.version(), 4);
        assert_eq!(account.committed_version(), 0);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut account = opened(100);

        assert!(matches!(account.deposit(0), Err(DomainError::InvalidAmount(_))));
        assert!(matches!(account.withdraw(-5), Err(DomainError::InvalidAmount(_))));
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let mut account = opened(1);

        let result = account.deposit(i64::MAX);

        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        assert_eq!(account.balance(), 1);
        assert_eq!(account.version(), 1);
        assert_eq!(account.uncommitted_changes().len(), 1);

        // Filling the account up to the limit is still allowed
        account.deposit(i64::MAX - 1).unwrap();
        assert_eq!(account.balance(), i64::MAX);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut account = opened(100);

        let result = account.withdraw(101);

        assert_eq!(result, Err(DomainError::insufficient_balance(101, 100)));
        assert_eq!(account.balance(), 100);

        // Exact balance is allowed and leaves zero
        account.withdraw(100).unwrap();
        assert_eq!(account.balance(), 0);
    }

    #[test]
    fn test_closed_account_is_frozen() {
        let mut account = opened(250);
        account.close().unwrap();

        assert!(matches!(account.deposit(1), Err(DomainError::AccountNotActive { .. })));
        assert!(matches!(account.withdraw(1), Err(DomainError::AccountNotActive { .. })));
        assert!(matches!(account.close(), Err(DomainError::AccountNotActive { .. })));
        assert_eq!(account.balance(), 250);
        assert_eq!(account.version(), 2);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut original = opened(1000);
        original.deposit(500).unwrap();
        original.withdraw(300).unwrap();
        let events = original.uncommitted_changes().to_vec();

        let mut replayed = BankAccount::new("acc-1");
        for event in &events {
            replayed.apply(event);
        }
        original.mark_changes_committed();

        assert_eq!(replayed, original);
    }

    #[test]
    fn test_apply_ignores_overdraft_event() {
        let mut account = opened(10);
        account.apply(&AccountEvent::MoneyWithdrawn { amount: 50 });

        assert_eq!(account.balance(), 10);
        assert_eq!(account.version(), 2);
    }

    #[test]
    fn test_snapshot_state_skips_pending_changes() {
        let account = opened(42);

        let state = serde_json::to_value(&account).unwrap();
        assert_eq!(
            state,
            serde_json::json!({ "id": "acc-1", "balance": 42, "status": "active", "version": 1 })
        );

        let restored: BankAccount = serde_json::from_value(state).unwrap();
        assert!(restored.uncommitted_changes().is_empty());
        assert_eq!(restored.balance(), 42);
    }

    #[test]
    fn test_should_snapshot() {
        let mut account = opened(0);

        assert!(!account.should_snapshot(10));
        assert!(account.should_snapshot(1));
        assert!(!account.should_snapshot(0));

        account.version = 20;
        assert!(account.should_snapshot(10));
        account.version = 19;
        assert!(!account.should_snapshot(10));
    }
}
