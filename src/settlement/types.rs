use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::state::SettlementStatus;
use crate::core_types::Network;

/// Typed business payout request
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRequest {
    pub order_id: String,
    pub customer_wallet: String,
    pub amount: Decimal,
    pub token: String,
    pub network: Network,
    pub business_id: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub settlement_id: String,
    pub order_id: String,
    pub customer_wallet: String,
    pub amount: Decimal,
    pub token: String,
    pub network: Network,
    pub business_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: SettlementStatus,
    pub transaction_hash: Option<String>,
    pub confirmations: u64,
    pub block_number: Option<u64>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub estimated_completion_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A status report from the execution result or a webhook delivery
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementUpdate {
    pub status: SettlementStatus,
    pub transaction_hash: Option<String>,
    pub confirmations: Option<u64>,
    pub block_number: Option<u64>,
    pub failure_reason: Option<String>,
}

impl SettlementUpdate {
    pub fn status(status: SettlementStatus) -> Self {
        Self {
            status,
            transaction_hash: None,
            confirmations: None,
            block_number: None,
            failure_reason: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Same status, nothing new
    Duplicate,
    /// Older than the stored status
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced,
    /// Same status; confirmations, block number or hash filled in
    Enriched,
    Ignored(IgnoreReason),
}

impl AdvanceOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, AdvanceOutcome::Ignored(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceOutcome::Advanced => "advanced",
            AdvanceOutcome::Enriched => "enriched",
            AdvanceOutcome::Ignored(IgnoreReason::Duplicate) => "duplicate",
            AdvanceOutcome::Ignored(IgnoreReason::Stale) => "stale",
        }
    }
}

impl SettlementRecord {
    pub fn new(settlement_id: String, request: SettlementRequest, estimated_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            settlement_id,
            order_id: request.order_id,
            customer_wallet: request.customer_wallet,
            amount: request.amount,
            token: request.token,
            network: request.network,
            business_id: request.business_id,
            customer_id: request.customer_id,
            status: SettlementStatus::Initiated,
            transaction_hash: None,
            confirmations: 0,
            block_number: None,
            failure_reason: None,
            created_at: now,
            estimated_completion_at: now
                + chrono::TimeDelta::seconds(i64::try_from(estimated_seconds).unwrap_or(i64::MAX / 1000)),
            completed_at: None,
            updated_at: now,
        }
    }

    /// Apply an update under the forward-only rule.
    ///
    /// Same-status deliveries may only raise confirmations or fill missing
    /// fields; anything older than the stored status is ignored.
    pub fn apply(&mut self, update: &SettlementUpdate, at: DateTime<Utc>) -> AdvanceOutcome {
        if update.status == self.status {
            let mut enriched = false;
            if let Some(c) = update.confirmations
                && c > self.confirmations
            {
                self.confirmations = c;
                enriched = true;
            }
            if self.block_number.is_none() && update.block_number.is_some() {
                self.block_number = update.block_number;
                enriched = true;
            }
            if self.transaction_hash.is_none() && update.transaction_hash.is_some() {
                self.transaction_hash = update.transaction_hash.clone();
                enriched = true;
            }
            if !enriched {
                return AdvanceOutcome::Ignored(IgnoreReason::Duplicate);
            }
            self.updated_at = at;
            return AdvanceOutcome::Enriched;
        }

        if !self.status.can_advance_to(update.status) {
            return AdvanceOutcome::Ignored(IgnoreReason::Stale);
        }

        self.status = update.status;
        if update.transaction_hash.is_some() {
            self.transaction_hash = update.transaction_hash.clone();
        }
        if let Some(c) = update.confirmations {
            self.confirmations = self.confirmations.max(c);
        }
        if update.block_number.is_some() {
            self.block_number = update.block_number;
        }
        if update.status == SettlementStatus::Failed {
            self.failure_reason = Some(
                update
                    .failure_reason
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| "settlement failed".to_string()),
            );
        }
        if update.status.is_terminal() {
            self.completed_at = Some(at);
        }
        self.updated_at = at;
        AdvanceOutcome::Advanced
    }
}

/// Response to a settlement request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTicket {
    pub settlement_id: String,
    pub status: SettlementStatus,
    pub transaction_hash: Option<String>,
    /// Seconds until expected completion
    pub estimated_time: u64,
    pub estimated_completion_at: DateTime<Utc>,
}

/// Poll response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementStatusView {
    pub settlement_id: String,
    pub order_id: String,
    pub status: SettlementStatus,
    pub transaction_hash: Option<String>,
    pub confirmations: u64,
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&SettlementRecord> for SettlementStatusView {
    fn from(record: &SettlementRecord) -> Self {
        Self {
            settlement_id: record.settlement_id.clone(),
            order_id: record.order_id.clone(),
            status: record.status,
            transaction_hash: record.transaction_hash.clone(),
            confirmations: record.confirmations,
            block_number: record.block_number,
            failure_reason: record.failure_reason.clone(),
            completed_at: record.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub settlement_id: String,
    /// Stored status after the delivery
    pub status: SettlementStatus,
    pub applied: bool,
    pub outcome: &'static str,
}
