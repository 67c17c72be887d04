//! PostgreSQL transaction store
//!
//! Terminal writes are atomic CAS updates guarded by `status = 'pending'`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Duration;

use super::state::{TransactionStatus, TransactionType};
use super::store::{TransactionStore, stale_cutoff};
use super::types::{TransactionPage, TransactionQuery, TransactionRecord, Transition};
use crate::core_types::{Network, PositionId, TransactionId, UserId};
use crate::db::{SafeRow, StoreError};
use crate::executor::TransferReceipt;

const SELECT_COLUMNS: &str = r#"
    SELECT transaction_id, user_id, position_id, tx_type, network, amount,
           destination_address, status, failure_reason, tx_hash, explorer_url,
           gas_fee_paid_by, created_at, updated_at, completed_at
    FROM liquidity_transactions_tb
"#;

pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<TransactionRecord, StoreError> {
        let transaction_id: String = row.try_get_column("transaction_id")?;
        let position_id: String = row.try_get_column("position_id")?;
        let tx_type: String = row.try_get_column("tx_type")?;
        let network: String = row.try_get_column("network")?;
        let status: String = row.try_get_column("status")?;
        let tx_hash: Option<String> = row.try_get_column("tx_hash")?;

        let receipt = match tx_hash {
            Some(tx_hash) => Some(TransferReceipt {
                tx_hash,
                explorer_url: row.try_get_column("explorer_url")?,
                gas_fee_paid_by: row
                    .try_get_column::<Option<String>>("gas_fee_paid_by")?
                    .unwrap_or_default(),
            }),
            None => None,
        };

        Ok(TransactionRecord {
            transaction_id: transaction_id
                .parse::<TransactionId>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            user_id: row.try_get_column("user_id")?,
            position_id: position_id
                .parse::<PositionId>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            tx_type: tx_type
                .parse::<TransactionType>()
                .map_err(StoreError::Corrupt)?,
            network: network.parse::<Network>().map_err(StoreError::Corrupt)?,
            amount: row.try_get_column("amount")?,
            destination_address: row.try_get_column("destination_address")?,
            status: status
                .parse::<TransactionStatus>()
                .map_err(StoreError::Corrupt)?,
            failure_reason: row.try_get_column("failure_reason")?,
            receipt,
            created_at: row.try_get_column("created_at")?,
            updated_at: row.try_get_column("updated_at")?,
            completed_at: row.try_get_column("completed_at")?,
        })
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO liquidity_transactions_tb
                (transaction_id, user_id, position_id, tx_type, network, amount,
                 destination_address, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.transaction_id.to_string())
        .bind(record.user_id)
        .bind(record.position_id.to_string())
        .bind(record.tx_type.as_str())
        .bind(record.network.as_str())
        .bind(record.amount)
        .bind(&record.destination_address)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE transaction_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn finalize(
        &self,
        id: TransactionId,
        transition: &Transition,
    ) -> Result<bool, StoreError> {
        let (reason, receipt) = match transition {
            Transition::Confirm(receipt) => (None, Some(receipt)),
            Transition::Fail(reason) | Transition::Cancel(reason) => (Some(reason.as_str()), None),
        };

        let result = sqlx::query(
            r#"
            UPDATE liquidity_transactions_tb
            SET status = $1,
                failure_reason = $2,
                tx_hash = $3,
                explorer_url = $4,
                gas_fee_paid_by = $5,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE transaction_id = $6 AND status = $7
            "#,
        )
        .bind(transition.target().as_str())
        .bind(reason)
        .bind(receipt.map(|r| r.tx_hash.as_str()))
        .bind(receipt.and_then(|r| r.explorer_url.as_deref()))
        .bind(receipt.map(|r| r.gas_fee_paid_by.as_str()))
        .bind(id.to_string())
        .bind(TransactionStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        let tx_type = query.tx_type.map(|t| t.as_str());
        let status = query.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM liquidity_transactions_tb
            WHERE user_id = $1
              AND ($2::VARCHAR IS NULL OR tx_type = $2)
              AND ($3::VARCHAR IS NULL OR status = $3)
            "#,
        )
        .bind(user_id)
        .bind(tx_type)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "{SELECT_COLUMNS}
            WHERE user_id = $1
              AND ($2::VARCHAR IS NULL OR tx_type = $2)
              AND ($3::VARCHAR IS NULL OR status = $3)
            ORDER BY created_at DESC, transaction_id DESC
            LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(tx_type)
            .bind(status)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TransactionPage {
            items,
            total: total.max(0) as u64,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn pending_total(
        &self,
        position_id: PositionId,
        network: Network,
    ) -> Result<Decimal, StoreError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount) FROM liquidity_transactions_tb
            WHERE position_id = $1 AND network = $2 AND status = $3
            "#,
        )
        .bind(position_id.to_string())
        .bind(network.as_str())
        .bind(TransactionStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    async fn find_stale_pending(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let sql = format!(
            "{SELECT_COLUMNS}
            WHERE status = $1 AND created_at <= $2
            ORDER BY created_at ASC
            LIMIT $3"
        );
        let rows = sqlx::query(&sql)
            .bind(TransactionStatus::Pending.as_str())
            .bind(stale_cutoff(older_than))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
