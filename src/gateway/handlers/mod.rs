//! HTTP handlers
//!
//! Handlers stay thin: extract, convert the DTO, call one service method,
//! wrap the result. Errors convert into `ApiError` via `?`.

pub mod banking;
pub mod health;
pub mod position;
pub mod settlement;
pub mod withdraw;

pub use banking::{list_banks, verify_account};
pub use health::{HealthResponse, health_check};
pub use position::{
    create_position, get_position, get_wallets, list_transactions, refresh_balances,
    update_bank_account,
};
pub use settlement::{request_settlement, settlement_status, settlement_webhook};
pub use withdraw::withdraw;
