//! Withdrawal error taxonomy

use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::TransactionId;
use crate::db::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WithdrawalError {
    // === Rejected before any side effect ===
    #[error("{0}")]
    Validation(String),

    #[error("Liquidity position not found")]
    NotFound,

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Transfer executor is not configured")]
    ExecutorMisconfigured,

    #[error("Cannot confirm sufficiency: {0}")]
    UpstreamUnavailable(String),

    // === After the record exists ===
    #[error("Transfer failed: {reason}")]
    TransferFailed {
        transaction_id: TransactionId,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WithdrawalError {
    pub fn code(&self) -> &'static str {
        match self {
            WithdrawalError::Validation(_) => "VALIDATION_ERROR",
            WithdrawalError::NotFound => "POSITION_NOT_FOUND",
            WithdrawalError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WithdrawalError::ExecutorMisconfigured => "EXECUTOR_MISCONFIGURED",
            WithdrawalError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            WithdrawalError::TransferFailed { .. } => "TRANSFER_FAILED",
            WithdrawalError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            WithdrawalError::Validation(_) | WithdrawalError::InsufficientFunds { .. } => 400,
            WithdrawalError::NotFound => 404,
            WithdrawalError::ExecutorMisconfigured
            | WithdrawalError::UpstreamUnavailable(_)
            | WithdrawalError::TransferFailed { .. }
            | WithdrawalError::Store(_) => 500,
        }
    }
}
