//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use event_ledger::{AccountEvent, BankAccount, EventStore, Repository};

/// Create a fresh store and a repository over it
pub fn setup_ledger(snapshot_interval: u64) -> (Arc<EventStore<AccountEvent>>, Repository<BankAccount>) {
    let store = Arc::new(EventStore::new(snapshot_interval));
    let repository = Repository::new(Arc::clone(&store));
    (store, repository)
}

/// Open and persist an account with the given starting balance
pub fn open_account(repository: &Repository<BankAccount>, id: &str, initial_balance: i64) -> BankAccount {
    let mut account = BankAccount::new(id);
    account
        .create_account(initial_balance)
        .expect("Failed to create account");
    repository.save(&mut account).expect("Failed to save account");
    account
}

/// Fold events from scratch, bypassing repository and snapshots
pub fn replay(id: &str, events: &[event_ledger::Event<AccountEvent>]) -> BankAccount {
    use event_ledger::Aggregate;

    let mut account = BankAccount::new(id);
    for event in events {
        account.apply(&event.data);
    }
    account
}
