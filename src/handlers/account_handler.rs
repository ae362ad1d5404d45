//! Account Command Handler
//!
//! Orchestrates load → command → save → projection for bank accounts,
//! retrying when another writer advanced the account first.

use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::{Aggregate, BankAccount};
use crate::config::Config;
use crate::domain::{AccountEvent, OperationContext};
use crate::error::{LedgerError, LedgerResult};
use crate::event_store::{EventStore, EventStoreError};
use crate::projection::BalanceProjection;
use crate::repository::Repository;

use super::{AccountCommand, CommandResult};

/// Handler for account commands
#[derive(Debug, Clone)]
pub struct AccountCommandHandler {
    repository: Repository<BankAccount>,
    projection: Arc<BalanceProjection>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl AccountCommandHandler {
    pub fn new(
        store: Arc<EventStore<AccountEvent>>,
        projection: Arc<BalanceProjection>,
        config: &Config,
    ) -> Self {
        Self {
            repository: Repository::new(store),
            projection,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn repository(&self) -> &Repository<BankAccount> {
        &self.repository
    }

    /// Execute a command, retrying on concurrency conflicts.
    ///
    /// Every attempt shares one correlation id, generated here when the
    /// caller's context has none.
    pub fn execute(
        &self,
        account_id: &str,
        command: AccountCommand,
        context: &OperationContext,
    ) -> LedgerResult<CommandResult> {
        let mut context = context.clone();
        context.ensure_correlation_id();

        for attempt in 0..self.max_retries {
            match self.try_execute(account_id, &command, &context) {
                Ok(result) => return Ok(result),
                Err(e) if e.is_conflict() && attempt + 1 < self.max_retries => {
                    tracing::warn!(
                        "Concurrency conflict on {} for {}, retrying (attempt {}/{})",
                        command.name(),
                        account_id,
                        attempt + 1,
                        self.max_retries
                    );
                    std::thread::sleep(self.retry_backoff * (attempt + 1));
                }
                Err(e) if e.is_conflict() => {
                    return Err(LedgerError::MaxRetriesExceeded(account_id.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        Err(LedgerError::MaxRetriesExceeded(account_id.to_string()))
    }

    /// Single attempt: load, run the command, save, project
    fn try_execute(
        &self,
        account_id: &str,
        command: &AccountCommand,
        context: &OperationContext,
    ) -> LedgerResult<CommandResult> {
        let mut account = match self.repository.get_by_id(account_id) {
            Ok(account) => account,
            Err(EventStoreError::AggregateNotFound(_))
                if matches!(command, AccountCommand::Open { .. }) =>
            {
                BankAccount::new(account_id)
            }
            Err(EventStoreError::AggregateNotFound(id)) => {
                return Err(LedgerError::AccountNotFound(id));
            }
            Err(e) => return Err(e.into()),
        };

        match command {
            AccountCommand::Open { initial_balance } => account.create_account(*initial_balance)?,
            AccountCommand::Deposit { amount } => account.deposit(*amount)?,
            AccountCommand::Withdraw { amount } => account.withdraw(*amount)?,
            AccountCommand::Close => account.close()?,
        }

        let events = self.repository.save_with_context(&mut account, context)?;
        self.projection.catch_up(self.repository.store(), account_id);

        Ok(CommandResult {
            account_id: account_id.to_string(),
            balance: account.balance(),
            version: account.version(),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    fn handler() -> AccountCommandHandler {
        let config = Config {
            snapshot_interval: 2,
            retry_backoff_ms: 0,
            ..Config::default()
        };
        AccountCommandHandler::new(
            Arc::new(EventStore::new(config.snapshot_interval)),
            Arc::new(BalanceProjection::new()),
            &config,
        )
    }

    #[test]
    fn test_open_then_deposit_updates_projection() {
        let handler = handler();
        let ctx = OperationContext::new();

        handler
            .execute("acc-1", AccountCommand::Open { initial_balance: 100 }, &ctx)
            .unwrap();
        let result = handler
            .execute("acc-1", AccountCommand::Deposit { amount: 50 }, &ctx)
            .unwrap();

        assert_eq!(result.balance, 150);
        assert_eq!(result.version, 2);
        assert_eq!(result.events.len(), 1);
        assert_eq!(handler.projection.get_balance("acc-1").unwrap().balance, 150);
    }

    #[test]
    fn test_events_get_a_correlation_id() {
        let handler = handler();

        let result = handler
            .execute(
                "acc-1",
                AccountCommand::Open { initial_balance: 5 },
                &OperationContext::new().with_actor("teller-1"),
            )
            .unwrap();

        let context = &result.events[0].context;
        assert!(context.correlation_id.is_some());
        assert_eq!(context.actor.as_deref(), Some("teller-1"));

        // A caller-supplied id is kept as is
        let correlation_id = uuid::Uuid::new_v4();
        let result = handler
            .execute(
                "acc-1",
                AccountCommand::Deposit { amount: 1 },
                &OperationContext::new().with_correlation_id(correlation_id),
            )
            .unwrap();
        assert_eq!(result.events[0].context.correlation_id, Some(correlation_id));
    }

    #[test]
    fn test_command_on_missing_account() {
        let handler = handler();
        let result = handler.execute(
            "ghost",
            AccountCommand::Deposit { amount: 1 },
            &OperationContext::new(),
        );
        assert!(matches!(result, Err(LedgerError::AccountNotFound(id)) if id == "ghost"));
    }

    #[test]
    fn test_domain_error_is_not_retried() {
        let handler = handler();
        let ctx = OperationContext::new();
        handler
            .execute("acc-1", AccountCommand::Open { initial_balance: 10 }, &ctx)
            .unwrap();

        let result = handler.execute("acc-1", AccountCommand::Withdraw { amount: 11 }, &ctx);

        assert!(matches!(
            result,
            Err(LedgerError::Domain(DomainError::InsufficientBalance { .. }))
        ));
        assert_eq!(handler.repository().store().current_version("acc-1"), 1);
    }

    #[test]
    fn test_open_twice_rejected() {
        let handler = handler();
        let ctx = OperationContext::new();
        handler
            .execute("acc-1", AccountCommand::Open { initial_balance: 10 }, &ctx)
            .unwrap();

        let result = handler.execute("acc-1", AccountCommand::Open { initial_balance: 10 }, &ctx);

        assert!(matches!(
            result,
            Err(LedgerError::Domain(DomainError::AccountAlreadyExists(_)))
        ));
    }
}
