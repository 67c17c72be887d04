use thiserror::Error;

use crate::banking::BankError;
use crate::db::StoreError;
use crate::ledger::LedgerError;
use crate::wallet::WalletError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositionError {
    #[error("Liquidity position already exists")]
    AlreadyExists,

    #[error("Liquidity position not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    /// Wallet service, bank provider or balance source failed
    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Store(StoreError),
}

impl PositionError {
    pub fn code(&self) -> &'static str {
        match self {
            PositionError::AlreadyExists => "ALREADY_EXISTS",
            PositionError::NotFound => "POSITION_NOT_FOUND",
            PositionError::Validation(_) => "VALIDATION_ERROR",
            PositionError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            PositionError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            PositionError::AlreadyExists | PositionError::Validation(_) => 400,
            PositionError::NotFound => 404,
            PositionError::UpstreamUnavailable(_) | PositionError::Store(_) => 500,
        }
    }
}

impl From<StoreError> for PositionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => PositionError::AlreadyExists,
            other => PositionError::Store(other),
        }
    }
}

impl From<LedgerError> for PositionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::PositionNotFound(_) => PositionError::NotFound,
            LedgerError::Store(store) => PositionError::Store(store),
            other => PositionError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<WalletError> for PositionError {
    fn from(e: WalletError) -> Self {
        PositionError::UpstreamUnavailable(e.to_string())
    }
}

impl From<BankError> for PositionError {
    fn from(e: BankError) -> Self {
        match e {
            BankError::Unavailable(msg) => PositionError::UpstreamUnavailable(msg),
            other => PositionError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_already_exists() {
        let err: PositionError = StoreError::Conflict("uq_positions_active_user".into()).into();
        assert_eq!(err, PositionError::AlreadyExists);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_ledger_mapping() {
        let err: PositionError = LedgerError::PositionNotFound(1).into();
        assert_eq!(err.http_status(), 404);

        let err: PositionError = LedgerError::Unavailable("timeout".into()).into();
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_bank_mapping() {
        let err: PositionError = BankError::InvalidAccountNumber.into();
        assert_eq!(err.http_status(), 400);
        let err: PositionError = BankError::Unavailable("502".into()).into();
        assert_eq!(err, PositionError::UpstreamUnavailable("502".into()));
    }
}
