//! User withdrawals
//!
//! Validates funds against a fresh balance read, records the attempt before
//! moving anything, executes through the transfer executor and reconciles
//! the ledger afterwards.

pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod types;


pub use error::WithdrawalError;
pub use lock::PositionLocks;
pub use orchestrator::WithdrawalOrchestrator;
pub use types::{WithdrawCommand, WithdrawalReceipt};
