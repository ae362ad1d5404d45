//! Command definitions
//!
//! Commands represent intentions to change an account.

use serde::{Deserialize, Serialize};

use crate::domain::AccountEvent;
use crate::event_store::Event;

/// Command against a single bank account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AccountCommand {
    Open { initial_balance: i64 },
    Deposit { amount: i64 },
    Withdraw { amount: i64 },
    Close,
}

impl AccountCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AccountCommand::Open { .. } => "open",
            AccountCommand::Deposit { .. } => "deposit",
            AccountCommand::Withdraw { .. } => "withdraw",
            AccountCommand::Close => "close",
        }
    }
}

/// Result of a successfully executed command
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub account_id: String,
    pub balance: i64,
    pub version: u64,
    /// Events persisted by this command
    pub events: Vec<Event<AccountEvent>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_deserialization() {
        let cmd: AccountCommand =
            serde_json::from_str(r#"{"command":"withdraw","amount":300}"#).unwrap();
        assert_eq!(cmd, AccountCommand::Withdraw { amount: 300 });
        assert_eq!(cmd.name(), "withdraw");

        let close: AccountCommand = serde_json::from_str(r#"{"command":"close"}"#).unwrap();
        assert_eq!(close, AccountCommand::Close);
    }
}
