//! Bank-account verification boundary

pub mod directory;
pub mod paystack;

pub use directory::BankDirectory;
pub use paystack::HttpBankVerifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// NUBAN account numbers are exactly 10 digits
pub const ACCOUNT_NUMBER_LEN: usize = 10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BankError {
    #[error("Account number must be {ACCOUNT_NUMBER_LEN} digits")]
    InvalidAccountNumber,

    #[error("Unknown bank code: {0}")]
    UnknownBankCode(String),

    /// The provider answered but could not match the account
    #[error("Could not resolve account: {0}")]
    ResolutionFailed(String),

    #[error("Bank provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

/// Shape check shared by every verifier
pub fn is_nuban(account_number: &str) -> bool {
    account_number.len() == ACCOUNT_NUMBER_LEN && account_number.bytes().all(|b| b.is_ascii_digit())
}

#[async_trait]
pub trait BankVerifier: Send + Sync {
    fn is_valid_account_number(&self, account_number: &str) -> bool {
        is_nuban(account_number)
    }

    async fn is_valid_bank_code(&self, bank_code: &str) -> Result<bool, BankError> {
        Ok(self.list_banks().await?.iter().any(|b| b.code == bank_code))
    }

    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, BankError>;

    async fn list_banks(&self) -> Result<Vec<Bank>, BankError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nuban_shape() {
        assert!(is_nuban("0123456789"));
        assert!(!is_nuban("012345678"));
        assert!(!is_nuban("01234567890"));
        assert!(!is_nuban("01234x6789"));
        assert!(!is_nuban(""));
    }
}
