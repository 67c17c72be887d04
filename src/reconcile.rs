//! Reconciliation Worker
//!
//! Background worker that settles records left open by a local timeout or an
//! indeterminate executor response. It never infers an outcome: only what the
//! executor reports for the record's reference is applied.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ReconciliationConfig;
use crate::db::StoreError;
use crate::executor::{TransferExecutor, TransferLookup};
use crate::ledger::LedgerAdapter;
use crate::settlement::{SettlementRecord, SettlementStatus, SettlementStore, SettlementUpdate};
use crate::transaction::{TransactionRecord, TransactionStore, Transition};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan
    pub scan_interval: Duration,
    /// How long a record must stay open to be considered stale
    pub stale_threshold: Duration,
    /// Maximum records of each kind per scan
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from(&ReconciliationConfig::default())
    }
}

impl From<&ReconciliationConfig> for WorkerConfig {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            scan_interval: Duration::from_secs(config.scan_interval_secs),
            stale_threshold: Duration::from_secs(config.stale_threshold_secs),
            batch_size: config.batch_size,
        }
    }
}

/// Records settled by one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub transactions: usize,
    pub settlements: usize,
}

pub struct ReconciliationWorker {
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
    executor: Arc<dyn TransferExecutor>,
    ledger: Arc<dyn LedgerAdapter>,
    config: WorkerConfig,
}

impl ReconciliationWorker {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        settlements: Arc<dyn SettlementStore>,
        executor: Arc<dyn TransferExecutor>,
        ledger: Arc<dyn LedgerAdapter>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            transactions,
            settlements,
            executor,
            ledger,
            config,
        }
    }

    /// Run forever, scanning every `scan_interval`
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            stale_threshold_secs = self.config.stale_threshold.as_secs(),
            "Starting reconciliation worker"
        );

        loop {
            let summary = self.scan_once().await;
            if summary != ScanSummary::default() {
                info!(
                    transactions = summary.transactions,
                    settlements = summary.settlements,
                    "Reconciled records this scan"
                );
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    /// One pass over both stores. A failing store does not stop the other.
    pub async fn scan_once(&self) -> ScanSummary {
        let transactions = self.reconcile_transactions().await.unwrap_or_else(|e| {
            error!(error = %e, "Transaction reconciliation scan failed");
            0
        });
        let settlements = self.reconcile_settlements().await.unwrap_or_else(|e| {
            error!(error = %e, "Settlement reconciliation scan failed");
            0
        });
        ScanSummary {
            transactions,
            settlements,
        }
    }

    pub async fn reconcile_transactions(&self) -> Result<usize, StoreError> {
        let stale = self
            .transactions
            .find_stale_pending(self.config.stale_threshold, self.config.batch_size)
            .await?;

        if stale.is_empty() {
            debug!("No stale pending transactions");
            return Ok(0);
        }
        info!(count = stale.len(), "Found stale pending transactions");

        let mut settled = 0;
        for record in &stale {
            match self.reconcile_transaction(record).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(e) => error!(
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "Failed to reconcile transaction"
                ),
            }
        }
        Ok(settled)
    }

    async fn reconcile_transaction(&self, record: &TransactionRecord) -> Result<bool, StoreError> {
        let reference = record.transaction_id.to_string();
        let transition = match self.executor.lookup(&reference).await {
            Ok(TransferLookup::Confirmed(receipt)) => Transition::Confirm(receipt),
            Ok(TransferLookup::Failed(reason)) => Transition::Fail(reason),
            Ok(TransferLookup::Pending) | Ok(TransferLookup::Unknown) => {
                debug!(transaction_id = %record.transaction_id, "Executor has no outcome yet");
                return Ok(false);
            }
            Err(e) => {
                warn!(transaction_id = %record.transaction_id, error = %e, "Executor lookup failed");
                return Ok(false);
            }
        };

        if !self
            .transactions
            .finalize(record.transaction_id, &transition)
            .await?
        {
            return Ok(false);
        }

        info!(
            transaction_id = %record.transaction_id,
            status = %transition.target(),
            "Transaction reconciled"
        );

        if matches!(transition, Transition::Confirm(_))
            && let Err(e) = self.ledger.refresh(record.user_id).await
        {
            warn!(
                user_id = record.user_id,
                transaction_id = %record.transaction_id,
                error = %e,
                "Balance refresh after reconciliation failed"
            );
        }
        Ok(true)
    }

    pub async fn reconcile_settlements(&self) -> Result<usize, StoreError> {
        let stale = self
            .settlements
            .find_stale_initiated(self.config.stale_threshold, self.config.batch_size)
            .await?;

        if stale.is_empty() {
            debug!("No stale initiated settlements");
            return Ok(0);
        }
        info!(count = stale.len(), "Found stale initiated settlements");

        let mut settled = 0;
        for record in &stale {
            match self.reconcile_settlement(record).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(e) => error!(
                    settlement_id = %record.settlement_id,
                    error = %e,
                    "Failed to reconcile settlement"
                ),
            }
        }
        Ok(settled)
    }

    async fn reconcile_settlement(&self, record: &SettlementRecord) -> Result<bool, StoreError> {
        let update = match self.executor.lookup(&record.settlement_id).await {
            Ok(TransferLookup::Confirmed(receipt)) => SettlementUpdate {
                transaction_hash: Some(receipt.tx_hash),
                ..SettlementUpdate::status(SettlementStatus::Processing)
            },
            Ok(TransferLookup::Failed(reason)) => SettlementUpdate {
                failure_reason: Some(reason),
                ..SettlementUpdate::status(SettlementStatus::Failed)
            },
            Ok(TransferLookup::Pending) | Ok(TransferLookup::Unknown) => return Ok(false),
            Err(e) => {
                warn!(settlement_id = %record.settlement_id, error = %e, "Executor lookup failed");
                return Ok(false);
            }
        };

        let Some((outcome, stored)) = self
            .settlements
            .apply_update(&record.settlement_id, &update)
            .await?
        else {
            return Ok(false);
        };

        if outcome.changed() {
            info!(
                settlement_id = %record.settlement_id,
                status = %stored.status,
                "Settlement reconciled"
            );
        }
        Ok(outcome.changed())
    }
}
