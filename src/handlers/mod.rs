//! Command Handlers module
//!
//! Command handlers that orchestrate business operations.
//! Each handler coordinates aggregates, the repository and projections.

mod account_handler;
mod commands;

pub use account_handler::AccountCommandHandler;
pub use commands::*;
