//! Withdrawal orchestrator
//!
//! ```text
//! validate ─▶ lock(position) ─▶ refresh ─▶ available = balance - pending
//!                                              │
//!                         insufficient ◀───────┤
//!                                              ▼
//!                                   persist PENDING ─▶ unlock
//!                                              │
//!                                   executor (bounded by timeout)
//!                       ┌──────────────┬───────┴────────┐
//!                    receipt       definitive      timeout/indeterminate
//!                       ▼              ▼                 ▼
//!                  CONFIRMED        FAILED           stays PENDING
//!                  + refresh                       (reconciliation)
//! ```
//!
//! One executor call per invocation, never retried here.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use super::error::WithdrawalError;
use super::lock::PositionLocks;
use super::types::{WithdrawCommand, WithdrawalReceipt};
use crate::config::WithdrawalConfig;
use crate::core_types::UserId;
use crate::db::StoreError;
use crate::executor::{ExecutorError, TransferExecutor, TransferInstruction, TransferReceipt};
use crate::ledger::{LedgerAdapter, LedgerError};
use crate::position::PositionStore;
use crate::transaction::{TransactionRecord, TransactionStatus, TransactionStore, Transition};

pub struct WithdrawalOrchestrator {
    positions: Arc<dyn PositionStore>,
    transactions: Arc<dyn TransactionStore>,
    ledger: Arc<dyn LedgerAdapter>,
    executor: Arc<dyn TransferExecutor>,
    locks: PositionLocks,
    config: WithdrawalConfig,
}

impl WithdrawalOrchestrator {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn LedgerAdapter>,
        executor: Arc<dyn TransferExecutor>,
        config: WithdrawalConfig,
    ) -> Self {
        Self {
            positions,
            transactions,
            ledger,
            executor,
            locks: PositionLocks::new(),
            config,
        }
    }

    pub async fn withdraw(
        &self,
        command: WithdrawCommand,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        command.validate(&self.config)?;

        if !self.executor.is_configured() {
            tracing::error!(user_id = command.user_id, "Withdrawal refused: executor not configured");
            return Err(WithdrawalError::ExecutorMisconfigured);
        }

        let record = self.reserve(&command).await?;

        tracing::info!(
            user_id = command.user_id,
            transaction_id = %record.transaction_id,
            network = %command.network,
            amount = %command.amount,
            "Withdrawal recorded, executing transfer"
        );

        let instruction = TransferInstruction {
            reference: record.transaction_id.to_string(),
            owner: command.user_id.to_string(),
            network: command.network,
            destination: record.destination_address.clone(),
            amount: command.amount,
            token: self.config.token.clone(),
        };

        let outcome = tokio::time::timeout(
            self.config.transfer_timeout(),
            self.executor.execute(&instruction),
        )
        .await;

        match outcome {
            Ok(Ok(receipt)) => self.complete(record, receipt).await,
            Ok(Err(e)) if e.is_indeterminate() => {
                tracing::warn!(
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "Transfer outcome unknown, left pending for reconciliation"
                );
                Ok(Self::still_pending(record, None))
            }
            Ok(Err(e)) => self.fail(record, e).await,
            Err(_) => {
                tracing::warn!(
                    transaction_id = %record.transaction_id,
                    timeout_ms = self.config.transfer_timeout_ms,
                    "Transfer timed out, left pending for reconciliation"
                );
                Ok(Self::still_pending(record, None))
            }
        }
    }

    /// Refresh, check and persist the pending record under the position lock
    async fn reserve(&self, command: &WithdrawCommand) -> Result<TransactionRecord, WithdrawalError> {
        let position = self
            .positions
            .get_active(command.user_id)
            .await?
            .ok_or(WithdrawalError::NotFound)?;

        let _guard = self.locks.acquire(position.position_id).await;

        let refresh = self
            .ledger
            .refresh(command.user_id)
            .await
            .map_err(|e| Self::refresh_error(command.user_id, e))?;

        // The active position may have been replaced while we waited
        if refresh.position_id != position.position_id {
            return Err(WithdrawalError::NotFound);
        }

        let pending = self
            .transactions
            .pending_total(refresh.position_id, command.network)
            .await?;
        let available = (refresh.balances.get(command.network) - pending).max(Decimal::ZERO);

        if available < command.amount {
            tracing::info!(
                user_id = command.user_id,
                network = %command.network,
                %available,
                requested = %command.amount,
                %pending,
                "Withdrawal refused: insufficient funds"
            );
            return Err(WithdrawalError::InsufficientFunds {
                available,
                requested: command.amount,
            });
        }

        let record = TransactionRecord::pending_withdrawal(
            command.user_id,
            refresh.position_id,
            command.network,
            command.amount,
            command.destination_address.trim(),
        );
        self.transactions.create(&record).await?;
        Ok(record)
    }

    async fn complete(
        &self,
        mut record: TransactionRecord,
        receipt: TransferReceipt,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        let transition = Transition::Confirm(receipt.clone());

        match self.transactions.finalize(record.transaction_id, &transition).await {
            Ok(true) => {
                record.apply(&transition, Utc::now());
            }
            Ok(false) => {
                // Already settled elsewhere (reconciliation); report what is stored
                return self.report_stored(record, Some(receipt)).await;
            }
            Err(e) => {
                tracing::error!(
                    transaction_id = %record.transaction_id,
                    tx_hash = %receipt.tx_hash,
                    error = %e,
                    "Transfer succeeded but confirmation could not be stored"
                );
                return Ok(Self::still_pending(record, Some(receipt)));
            }
        }

        tracing::info!(
            transaction_id = %record.transaction_id,
            tx_hash = %receipt.tx_hash,
            "Withdrawal confirmed"
        );

        let balances = match self.ledger.refresh(record.user_id).await {
            Ok(refresh) => Some(refresh.balances),
            Err(e) => {
                tracing::warn!(
                    user_id = record.user_id,
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "Post-withdrawal balance refresh failed"
                );
                None
            }
        };

        Ok(WithdrawalReceipt {
            transaction_id: record.transaction_id,
            status: record.status,
            network: record.network,
            amount: record.amount,
            destination_address: record.destination_address,
            receipt: Some(receipt),
            completed_at: record.completed_at,
            total_balance: balances.map(|b| b.total()),
            balances,
        })
    }

    async fn fail(
        &self,
        record: TransactionRecord,
        error: ExecutorError,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        let reason = error.failure_reason();

        match self
            .transactions
            .finalize(record.transaction_id, &Transition::Fail(reason.clone()))
            .await
        {
            Ok(true) => {
                tracing::warn!(
                    transaction_id = %record.transaction_id,
                    %reason,
                    "Withdrawal failed"
                );
                Err(WithdrawalError::TransferFailed {
                    transaction_id: record.transaction_id,
                    reason,
                })
            }
            Ok(false) => {
                // Reconciliation finalized it while execute was in flight
                tracing::warn!(
                    transaction_id = %record.transaction_id,
                    %reason,
                    "Executor reported failure but record was already terminal"
                );
                self.report_stored(record, None).await
            }
            Err(e) => {
                tracing::error!(
                    transaction_id = %record.transaction_id,
                    %reason,
                    error = %e,
                    "Withdrawal failed and failure could not be stored"
                );
                Ok(Self::still_pending(record, None))
            }
        }
    }

    async fn report_stored(
        &self,
        record: TransactionRecord,
        receipt: Option<TransferReceipt>,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        let stored = self
            .transactions
            .get(record.transaction_id)
            .await?
            .ok_or_else(|| {
                StoreError::Corrupt(format!("transaction {} vanished", record.transaction_id))
            })?;

        match stored.status {
            TransactionStatus::Failed | TransactionStatus::Cancelled => {
                Err(WithdrawalError::TransferFailed {
                    transaction_id: stored.transaction_id,
                    reason: stored.failure_reason.unwrap_or_default(),
                })
            }
            _ => Ok(WithdrawalReceipt {
                transaction_id: stored.transaction_id,
                status: stored.status,
                network: stored.network,
                amount: stored.amount,
                destination_address: stored.destination_address,
                receipt: stored.receipt.or(receipt),
                completed_at: stored.completed_at,
                balances: None,
                total_balance: None,
            }),
        }
    }

    fn still_pending(record: TransactionRecord, receipt: Option<TransferReceipt>) -> WithdrawalReceipt {
        WithdrawalReceipt {
            transaction_id: record.transaction_id,
            status: TransactionStatus::Pending,
            network: record.network,
            amount: record.amount,
            destination_address: record.destination_address,
            receipt,
            completed_at: None,
            balances: None,
            total_balance: None,
        }
    }

    fn refresh_error(user_id: UserId, e: LedgerError) -> WithdrawalError {
        match e {
            LedgerError::PositionNotFound(_) => WithdrawalError::NotFound,
            LedgerError::Store(store) => WithdrawalError::Store(store),
            other => {
                tracing::warn!(user_id, error = %other, "Withdrawal refused: balance refresh failed");
                WithdrawalError::UpstreamUnavailable(other.to_string())
            }
        }
    }
}
