use thiserror::Error;

use crate::db::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("{0}")]
    Validation(String),

    #[error("Settlement not found: {0}")]
    NotFound(String),

    #[error("Transfer executor is not configured")]
    ExecutorMisconfigured,

    #[error("Invalid webhook secret")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SettlementError {
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::Validation(_) => "VALIDATION_ERROR",
            SettlementError::NotFound(_) => "SETTLEMENT_NOT_FOUND",
            SettlementError::ExecutorMisconfigured => "EXECUTOR_MISCONFIGURED",
            SettlementError::Unauthorized => "UNAUTHORIZED",
            SettlementError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            SettlementError::Validation(_) => 400,
            SettlementError::Unauthorized => 401,
            SettlementError::NotFound(_) => 404,
            SettlementError::ExecutorMisconfigured | SettlementError::Store(_) => 500,
        }
    }
}
