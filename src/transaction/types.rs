//! Transaction record and its terminal transitions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::state::{TransactionStatus, TransactionType};
use crate::core_types::{Network, PositionId, TransactionId, UserId};
use crate::executor::TransferReceipt;

/// One withdrawal (or deposit) attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub position_id: PositionId,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub network: Network,
    pub amount: Decimal,
    pub destination_address: String,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TransferReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// New `pending` withdrawal, stamped now
    pub fn pending_withdrawal(
        user_id: UserId,
        position_id: PositionId,
        network: Network,
        amount: Decimal,
        destination_address: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id: TransactionId::new(),
            user_id,
            position_id,
            tx_type: TransactionType::Withdrawal,
            network,
            amount,
            destination_address: destination_address.into(),
            status: TransactionStatus::Pending,
            failure_reason: None,
            receipt: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Apply a terminal transition in place.
    ///
    /// Returns `false` and leaves the record untouched when the record is
    /// already terminal.
    pub fn apply(&mut self, transition: &Transition, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(transition.target()) {
            return false;
        }
        self.status = transition.target();
        match transition {
            Transition::Confirm(receipt) => self.receipt = Some(receipt.clone()),
            Transition::Fail(reason) | Transition::Cancel(reason) => {
                self.failure_reason = Some(reason.clone())
            }
        }
        self.updated_at = at;
        self.completed_at = Some(at);
        true
    }
}

/// The ways a `pending` record can end
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Confirm(TransferReceipt),
    Fail(String),
    Cancel(String),
}

impl Transition {
    pub fn target(&self) -> TransactionStatus {
        match self {
            Transition::Confirm(_) => TransactionStatus::Confirmed,
            Transition::Fail(_) => TransactionStatus::Failed,
            Transition::Cancel(_) => TransactionStatus::Cancelled,
        }
    }
}

/// History query (page is 1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub page: u32,
    pub limit: u32,
    pub tx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl TransactionQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.tx_type.is_none_or(|t| t == record.tx_type)
            && self.status.is_none_or(|s| s == record.status)
    }
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            tx_type: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<TransactionRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}
