//! Transfer executor boundary
//!
//! The executor moves value on-chain (gasless relay). Callers persist their
//! record before calling [`TransferExecutor::execute`] and use the record id as
//! the idempotency `reference`, so a retried or reconciled reference never
//! moves funds twice.

pub mod relay;

pub use relay::RelayExecutor;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::Network;

/// One value movement request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInstruction {
    /// Idempotency key: transaction id or settlement id
    pub reference: String,
    /// Who the funds are moved on behalf of (user id or business id)
    pub owner: String,
    pub network: Network,
    pub destination: String,
    pub amount: Decimal,
    pub token: String,
}

/// Proof of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    pub gas_fee_paid_by: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Transfer executor is not configured")]
    NotConfigured,

    /// The executor refused the transfer; nothing moved
    #[error("Transfer rejected: {0}")]
    Rejected(String),

    /// The request never reached the executor
    #[error("Transfer executor unreachable: {0}")]
    Unreachable(String),

    /// The outcome is unknown; the transfer may or may not have happened
    #[error("Transfer outcome unknown: {0}")]
    Indeterminate(String),
}

impl ExecutorError {
    /// Whether the record must stay open for reconciliation
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ExecutorError::Indeterminate(_))
    }

    /// Human-readable reason stored on a failed record; never empty
    pub fn failure_reason(&self) -> String {
        let reason = match self {
            ExecutorError::Rejected(msg)
            | ExecutorError::Unreachable(msg)
            | ExecutorError::Indeterminate(msg) => msg.trim().to_string(),
            ExecutorError::NotConfigured => String::new(),
        };
        if reason.is_empty() {
            self.to_string()
        } else {
            reason
        }
    }
}

/// Executor-side view of a previously submitted reference
#[derive(Debug, Clone, PartialEq)]
pub enum TransferLookup {
    Confirmed(TransferReceipt),
    Failed(String),
    Pending,
    /// The executor has no record of the reference
    Unknown,
}

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Whether credentials and endpoint are present
    fn is_configured(&self) -> bool;

    /// Submit a transfer.
    ///
    /// Must be idempotent on `instruction.reference`.
    async fn execute(&self, instruction: &TransferInstruction)
    -> Result<TransferReceipt, ExecutorError>;

    /// Query the outcome of a previously submitted reference
    async fn lookup(&self, reference: &str) -> Result<TransferLookup, ExecutorError>;
}

/// Block explorer link for a transaction hash
pub fn explorer_url(network: Network, tx_hash: &str) -> String {
    match network {
        Network::Base => format!("https://basescan.org/tx/{}", tx_hash),
        Network::Solana => format!("https://solscan.io/tx/{}", tx_hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_indeterminate_keeps_record_open() {
        assert!(ExecutorError::Indeterminate("timeout".into()).is_indeterminate());
        assert!(!ExecutorError::Rejected("insufficient relayer funds".into()).is_indeterminate());
        assert!(!ExecutorError::Unreachable("connection refused".into()).is_indeterminate());
        assert!(!ExecutorError::NotConfigured.is_indeterminate());
    }

    #[test]
    fn test_failure_reason_is_never_empty() {
        assert_eq!(
            ExecutorError::Rejected("nonce too low".into()).failure_reason(),
            "nonce too low"
        );
        assert_eq!(
            ExecutorError::Rejected("  ".into()).failure_reason(),
            "Transfer rejected:   "
        );
        assert_eq!(
            ExecutorError::NotConfigured.failure_reason(),
            "Transfer executor is not configured"
        );
    }

    #[test]
    fn test_receipt_wire_format() {
        let receipt: TransferReceipt =
            serde_json::from_str(r#"{"txHash":"0xabc","gasFeePaidBy":"platform"}"#).unwrap();
        assert_eq!(receipt.tx_hash, "0xabc");
        assert!(receipt.explorer_url.is_none());

        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("explorerUrl").is_none());
        assert_eq!(json["gasFeePaidBy"], "platform");
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_url(Network::Base, "0xabc"),
            "https://basescan.org/tx/0xabc"
        );
        assert!(explorer_url(Network::Solana, "5x").starts_with("https://solscan.io/"));
    }
}
