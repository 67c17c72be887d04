//! Business settlement orchestrator
//!
//! ```text
//! request ─▶ validate ─▶ persist INITIATED ─▶ respond
//!                              │
//!                      background dispatch
//!              ┌───────────────┼─────────────────┐
//!           receipt        definitive       timeout/indeterminate
//!              ▼               ▼                   ▼
//!         PROCESSING        FAILED          stays INITIATED
//!              │                            (reconciliation)
//!          webhooks ─▶ COMPLETED | FAILED
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;

use super::error::SettlementError;
use super::id;
use super::state::SettlementStatus;
use super::store::SettlementStore;
use super::types::{
    SettlementRecord, SettlementRequest, SettlementStatusView, SettlementTicket,
    SettlementUpdate, WebhookAck,
};
use crate::config::SettlementConfig;
use crate::executor::{TransferExecutor, TransferInstruction};

pub struct SettlementOrchestrator {
    store: Arc<dyn SettlementStore>,
    executor: Arc<dyn TransferExecutor>,
    config: SettlementConfig,
}

impl SettlementOrchestrator {
    pub fn new(
        store: Arc<dyn SettlementStore>,
        executor: Arc<dyn TransferExecutor>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            store,
            executor,
            config,
        }
    }

    /// Open a settlement and dispatch its transfer in the background
    pub async fn request_settlement(
        self: &Arc<Self>,
        request: SettlementRequest,
    ) -> Result<SettlementTicket, SettlementError> {
        let record = self.open(request).await?;
        let ticket = SettlementTicket {
            settlement_id: record.settlement_id.clone(),
            status: record.status,
            transaction_hash: record.transaction_hash.clone(),
            estimated_time: self.config.estimated_seconds(record.network),
            estimated_completion_at: record.estimated_completion_at,
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.dispatch(&record).await;
        });

        Ok(ticket)
    }

    /// Validate and persist an `initiated` settlement. No transfer happens here.
    pub async fn open(&self, request: SettlementRequest) -> Result<SettlementRecord, SettlementError> {
        validate(&request)?;

        if !self.executor.is_configured() {
            tracing::error!(order_id = %request.order_id, "Settlement refused: executor not configured");
            return Err(SettlementError::ExecutorMisconfigured);
        }

        let estimated = self.config.estimated_seconds(request.network);
        let record = SettlementRecord::new(id::generate(), normalize(request), estimated);
        self.store.create(&record).await?;

        tracing::info!(
            settlement_id = %record.settlement_id,
            order_id = %record.order_id,
            network = %record.network,
            amount = %record.amount,
            "Settlement initiated"
        );
        Ok(record)
    }

    /// Execute the transfer for an initiated settlement and record the result
    pub async fn dispatch(&self, record: &SettlementRecord) {
        let instruction = TransferInstruction {
            reference: record.settlement_id.clone(),
            owner: record
                .business_id
                .clone()
                .unwrap_or_else(|| record.order_id.clone()),
            network: record.network,
            destination: record.customer_wallet.clone(),
            amount: record.amount,
            token: record.token.clone(),
        };

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(self.config.transfer_timeout_ms),
            self.executor.execute(&instruction),
        )
        .await;

        let update = match outcome {
            Ok(Ok(receipt)) => SettlementUpdate {
                transaction_hash: Some(receipt.tx_hash),
                ..SettlementUpdate::status(SettlementStatus::Processing)
            },
            Ok(Err(e)) if e.is_indeterminate() => {
                tracing::warn!(
                    settlement_id = %record.settlement_id,
                    error = %e,
                    "Settlement transfer outcome unknown, left initiated"
                );
                return;
            }
            Ok(Err(e)) => SettlementUpdate {
                failure_reason: Some(e.failure_reason()),
                ..SettlementUpdate::status(SettlementStatus::Failed)
            },
            Err(_) => {
                tracing::warn!(
                    settlement_id = %record.settlement_id,
                    timeout_ms = self.config.transfer_timeout_ms,
                    "Settlement transfer timed out, left initiated"
                );
                return;
            }
        };

        match self.store.apply_update(&record.settlement_id, &update).await {
            Ok(Some((outcome, stored))) => tracing::info!(
                settlement_id = %record.settlement_id,
                status = %stored.status,
                outcome = outcome.as_str(),
                "Settlement dispatch recorded"
            ),
            Ok(None) => tracing::error!(
                settlement_id = %record.settlement_id,
                "Settlement vanished before dispatch result was stored"
            ),
            Err(e) => tracing::error!(
                settlement_id = %record.settlement_id,
                status = %update.status,
                error = %e,
                "Settlement dispatch result could not be stored"
            ),
        }
    }

    pub async fn get_status(
        &self,
        settlement_id: &str,
    ) -> Result<SettlementStatusView, SettlementError> {
        let settlement_id = settlement_id.trim();
        if settlement_id.is_empty() {
            return Err(SettlementError::Validation("settlementId is required".into()));
        }
        if !id::is_well_formed(settlement_id) {
            return Err(SettlementError::NotFound(settlement_id.to_string()));
        }

        self.store
            .get(settlement_id)
            .await?
            .map(|record| SettlementStatusView::from(&record))
            .ok_or_else(|| SettlementError::NotFound(settlement_id.to_string()))
    }

    /// Apply an asynchronous status delivery.
    ///
    /// Stale and duplicate deliveries are acknowledged without change.
    pub async fn handle_webhook(
        &self,
        settlement_id: &str,
        update: SettlementUpdate,
    ) -> Result<WebhookAck, SettlementError> {
        let settlement_id = settlement_id.trim();
        if settlement_id.is_empty() {
            return Err(SettlementError::Validation("settlementId is required".into()));
        }
        if !id::is_well_formed(settlement_id) {
            return Err(SettlementError::NotFound(settlement_id.to_string()));
        }

        let (outcome, record) = self
            .store
            .apply_update(settlement_id, &update)
            .await?
            .ok_or_else(|| SettlementError::NotFound(settlement_id.to_string()))?;

        if outcome.changed() {
            tracing::info!(
                settlement_id,
                status = %record.status,
                confirmations = record.confirmations,
                outcome = outcome.as_str(),
                "Settlement webhook applied"
            );
        } else {
            tracing::info!(
                settlement_id,
                stored = %record.status,
                delivered = %update.status,
                outcome = outcome.as_str(),
                "Settlement webhook ignored"
            );
        }

        Ok(WebhookAck {
            settlement_id: record.settlement_id,
            status: record.status,
            applied: outcome.changed(),
            outcome: outcome.as_str(),
        })
    }

    /// Check `X-Webhook-Secret` when a secret is configured
    pub fn verify_webhook_secret(&self, provided: Option<&str>) -> Result<(), SettlementError> {
        match self.config.webhook_secret.as_deref() {
            None => Ok(()),
            Some(expected) if provided.is_some_and(|p| constant_time_eq(p, expected)) => Ok(()),
            Some(_) => Err(SettlementError::Unauthorized),
        }
    }
}

/// Compares every byte regardless of where the first mismatch is
fn constant_time_eq(left: &str, right: &str) -> bool {
    let (left, right) = (left.as_bytes(), right.as_bytes());
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right).fold(0u8, |diff, (a, b)| diff | (a ^ b)) == 0
}

fn validate(request: &SettlementRequest) -> Result<(), SettlementError> {
    for (field, value) in [
        ("orderId", &request.order_id),
        ("customerWallet", &request.customer_wallet),
        ("token", &request.token),
    ] {
        if value.trim().is_empty() {
            return Err(SettlementError::Validation(format!("{} is required", field)));
        }
    }
    if request.amount <= Decimal::ZERO {
        return Err(SettlementError::Validation(
            "amount must be greater than 0".into(),
        ));
    }
    Ok(())
}

fn normalize(request: SettlementRequest) -> SettlementRequest {
    SettlementRequest {
        order_id: request.order_id.trim().to_string(),
        customer_wallet: request.customer_wallet.trim().to_string(),
        token: request.token.trim().to_uppercase(),
        ..request
    }
}
