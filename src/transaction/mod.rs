//! Withdrawal transaction records
//!
//! A record is written `pending` before any external transfer call and
//! moves to exactly one terminal status afterwards.

pub mod pg;
pub mod state;
pub mod store;
pub mod types;

pub use pg::PgTransactionStore;
pub use state::{TransactionStatus, TransactionType};
pub use store::{MemoryTransactionStore, TransactionStore};
pub use types::{TransactionPage, TransactionQuery, TransactionRecord, Transition};
