//! Liquidity positions
//!
//! One active position per user, holding the per-network balance snapshot
//! and the payout bank account.

pub mod error;
pub mod models;
pub mod pg;
pub mod service;
pub mod store;

pub use error::PositionError;
pub use models::{BankAccount, LiquidityPosition, LiquidityType, NewPosition, PositionView};
pub use pg::PgPositionStore;
pub use service::{CreatePosition, PositionService, UpdateBankAccount, WalletsView};
pub use store::{MemoryPositionStore, PositionStore};
