//! PostgreSQL settlement store
//!
//! Updates lock the row with `SELECT ... FOR UPDATE`, apply the forward-only
//! rule in Rust, and write back inside the same transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;

use super::state::SettlementStatus;
use super::store::SettlementStore;
use super::types::{AdvanceOutcome, SettlementRecord, SettlementUpdate};
use crate::core_types::Network;
use crate::db::{SafeRow, StoreError};
use crate::transaction::store::stale_cutoff;

const SELECT_COLUMNS: &str = r#"
    SELECT settlement_id, order_id, customer_wallet, amount, token, network,
           business_id, customer_id, status, transaction_hash, confirmations,
           block_number, failure_reason, created_at, estimated_completion_at,
           completed_at, updated_at
    FROM settlements_tb
"#;

pub struct PgSettlementStore {
    pool: PgPool,
}

impl PgSettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<SettlementRecord, StoreError> {
        let network: String = row.try_get_column("network")?;
        let status: String = row.try_get_column("status")?;
        let confirmations: i64 = row.try_get_column("confirmations")?;
        let block_number: Option<i64> = row.try_get_column("block_number")?;

        Ok(SettlementRecord {
            settlement_id: row.try_get_column("settlement_id")?,
            order_id: row.try_get_column("order_id")?,
            customer_wallet: row.try_get_column("customer_wallet")?,
            amount: row.try_get_column("amount")?,
            token: row.try_get_column("token")?,
            network: network.parse::<Network>().map_err(StoreError::Corrupt)?,
            business_id: row.try_get_column("business_id")?,
            customer_id: row.try_get_column("customer_id")?,
            status: status
                .parse::<SettlementStatus>()
                .map_err(StoreError::Corrupt)?,
            transaction_hash: row.try_get_column("transaction_hash")?,
            confirmations: u64::try_from(confirmations)
                .map_err(|_| StoreError::Corrupt(format!("confirmations {}", confirmations)))?,
            block_number: block_number
                .map(u64::try_from)
                .transpose()
                .map_err(|e| StoreError::Corrupt(format!("block_number: {}", e)))?,
            failure_reason: row.try_get_column("failure_reason")?,
            created_at: row.try_get_column("created_at")?,
            estimated_completion_at: row.try_get_column("estimated_completion_at")?,
            completed_at: row.try_get_column("completed_at")?,
            updated_at: row.try_get_column("updated_at")?,
        })
    }
}

fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl SettlementStore for PgSettlementStore {
    async fn create(&self, record: &SettlementRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settlements_tb
                (settlement_id, order_id, customer_wallet, amount, token, network,
                 business_id, customer_id, status, confirmations, created_at,
                 estimated_completion_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&record.settlement_id)
        .bind(&record.order_id)
        .bind(&record.customer_wallet)
        .bind(record.amount)
        .bind(&record.token)
        .bind(record.network.as_str())
        .bind(record.business_id.as_deref())
        .bind(record.customer_id.as_deref())
        .bind(record.status.as_str())
        .bind(to_bigint(record.confirmations))
        .bind(record.created_at)
        .bind(record.estimated_completion_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, settlement_id: &str) -> Result<Option<SettlementRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE settlement_id = $1");
        let row = sqlx::query(&sql)
            .bind(settlement_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn apply_update(
        &self,
        settlement_id: &str,
        update: &SettlementUpdate,
    ) -> Result<Option<(AdvanceOutcome, SettlementRecord)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{SELECT_COLUMNS} WHERE settlement_id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(settlement_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let mut record = Self::row_to_record(&row)?;

        let outcome = record.apply(update, Utc::now());
        if !outcome.changed() {
            tx.rollback().await?;
            return Ok(Some((outcome, record)));
        }

        sqlx::query(
            r#"
            UPDATE settlements_tb
            SET status = $1,
                transaction_hash = $2,
                confirmations = $3,
                block_number = $4,
                failure_reason = $5,
                completed_at = $6,
                updated_at = $7
            WHERE settlement_id = $8
            "#,
        )
        .bind(record.status.as_str())
        .bind(record.transaction_hash.as_deref())
        .bind(to_bigint(record.confirmations))
        .bind(record.block_number.map(to_bigint))
        .bind(record.failure_reason.as_deref())
        .bind(record.completed_at)
        .bind(record.updated_at)
        .bind(settlement_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((outcome, record)))
    }

    async fn find_stale_initiated(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE status = $1 AND updated_at <= $2 ORDER BY updated_at ASC LIMIT $3"
        );
        let rows = sqlx::query(&sql)
            .bind(SettlementStatus::Initiated.as_str())
            .bind(stale_cutoff(older_than))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
