use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::WithdrawalError;
use crate::config::WithdrawalConfig;
use crate::core_types::{Network, NetworkBalances, TransactionId, UserId};
use crate::executor::TransferReceipt;
use crate::transaction::TransactionStatus;

/// Typed withdrawal request
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawCommand {
    pub user_id: UserId,
    pub network: Network,
    pub amount: Decimal,
    pub destination_address: String,
}

impl WithdrawCommand {
    pub fn validate(&self, config: &WithdrawalConfig) -> Result<(), WithdrawalError> {
        if self.amount <= Decimal::ZERO {
            return Err(WithdrawalError::Validation(
                "Amount must be greater than zero".into(),
            ));
        }
        if self.amount < config.min_amount {
            return Err(WithdrawalError::Validation(format!(
                "Minimum withdrawal amount is {}",
                config.min_amount
            )));
        }

        let destination = self.destination_address.trim();
        if destination.is_empty() {
            return Err(WithdrawalError::Validation(
                "Destination address is required".into(),
            ));
        }
        if destination.chars().count() < config.min_address_length {
            return Err(WithdrawalError::Validation(format!(
                "Destination address must be at least {} characters",
                config.min_address_length
            )));
        }
        Ok(())
    }
}

/// Result of a withdrawal that got as far as the executor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    pub transaction_id: TransactionId,
    /// `confirmed`, or `pending` when the outcome is not yet known
    pub status: TransactionStatus,
    pub network: Network,
    pub amount: Decimal,
    pub destination_address: String,
    #[serde(flatten)]
    pub receipt: Option<TransferReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Post-transfer balances, absent when the refresh failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balances: Option<NetworkBalances>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_balance: Option<Decimal>,
}
