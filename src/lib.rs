//! Liquidity Settlement Service
//!
//! Custodial liquidity positions funded on Base and Solana, synchronous
//! user withdrawals and asynchronous business settlements.
//!
//! # Modules
//!
//! - [`core_types`] - Ids, networks and per-network balances
//! - [`position`] - Liquidity positions and the position service
//! - [`transaction`] - Withdrawal/deposit records and their state machine
//! - [`withdrawal`] - Withdrawal orchestrator with per-position locking
//! - [`settlement`] - Business payouts, status polling and webhooks
//! - [`ledger`] - Balance refresh from the wallet provider
//! - [`executor`] - Transfer executor boundary (relay service)
//! - [`wallet`] - Custodial wallet provider boundary
//! - [`banking`] - Bank list and account verification
//! - [`reconcile`] - Background worker for records left in flight
//! - [`gateway`] - HTTP API

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod db;
pub mod logging;

// Collaborator boundaries
pub mod banking;
pub mod executor;
pub mod ledger;
pub mod wallet;

// Domain
pub mod position;
pub mod reconcile;
pub mod settlement;
pub mod transaction;
pub mod withdrawal;

pub mod gateway;

#[cfg(test)]
pub(crate) mod testing;

// Convenient re-exports at crate root
pub use core_types::{Network, NetworkBalances, PositionId, TransactionId, UserId};
pub use position::PositionService;
pub use settlement::SettlementOrchestrator;
pub use withdrawal::WithdrawalOrchestrator;
