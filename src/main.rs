//! event_ledger - demo runner
//!
//! Replays a small account scenario against an in-memory ledger, then hammers
//! one account with concurrent deposits to exercise optimistic concurrency.

use std::sync::Arc;

use event_ledger::handlers::{AccountCommand, AccountCommandHandler};
use event_ledger::{
    AccountEvent, BalanceProjection, Config, EventStore, LedgerError, OperationContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const CONCURRENT_DEPOSITS: usize = 8;

/// Initialize tracing/logging
fn init_tracing(config: &Config) {
    let default_filter = if config.is_production() {
        "event_ledger=info"
    } else {
        "event_ledger=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config);

    tracing::info!(
        "Starting event_ledger demo in {} (snapshot interval {}, max retries {})",
        config.environment,
        config.snapshot_interval,
        config.max_retries
    );

    let store = Arc::new(EventStore::<AccountEvent>::new(config.snapshot_interval));
    let projection = Arc::new(BalanceProjection::new());
    let handler = AccountCommandHandler::new(store.clone(), projection.clone(), &config);

    let context = OperationContext::new()
        .with_correlation_id(Uuid::new_v4())
        .with_actor("demo");

    let account_id = "acc-demo";
    let scenario = [
        AccountCommand::Open { initial_balance: 1000 },
        AccountCommand::Deposit { amount: 500 },
        AccountCommand::Deposit { amount: 200 },
        AccountCommand::Withdraw { amount: 300 },
        AccountCommand::Withdraw { amount: 5000 },
    ];

    for command in scenario {
        let name = command.name();
        match handler.execute(account_id, command, &context) {
            Ok(result) => tracing::info!(
                "{} ok: balance {} at version {}",
                name,
                result.balance,
                result.version
            ),
            Err(LedgerError::Domain(e)) => tracing::warn!("{} rejected: {}", name, e),
            Err(e) => return Err(e.into()),
        }
    }

    // Concurrent writers on the same account
    let mut tasks = Vec::with_capacity(CONCURRENT_DEPOSITS);
    for n in 0..CONCURRENT_DEPOSITS {
        let handler = handler.clone();
        let context = context.clone().with_causation_id(Uuid::new_v4());
        tasks.push(tokio::task::spawn_blocking(move || {
            handler
                .execute(account_id, AccountCommand::Deposit { amount: 10 }, &context)
                .map(|result| (n, result.version))
        }));
    }

    for task in tasks {
        match task.await? {
            Ok((n, version)) => tracing::debug!("Writer {} committed version {}", n, version),
            Err(e) => tracing::warn!("Writer failed: {} ({})", e, e.error_code()),
        }
    }

    let account = handler.repository().get_by_id(account_id)?;
    let from_history = handler.repository().load_from_history(account_id)?;
    let projected = projection.get_balance(account_id)?;

    tracing::info!(
        "Final state: aggregate balance {}, replayed balance {}, projected balance {}, {} event(s) in store",
        account.balance(),
        from_history.balance(),
        projected.balance,
        store.last_version()
    );

    if account != from_history || account.balance() != projected.balance {
        anyhow::bail!("read models disagree for {}", account_id);
    }

    Ok(())
}
