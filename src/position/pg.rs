//! PostgreSQL position store
//!
//! `uq_positions_active_user` (partial unique index) enforces one active
//! position per user; a violation surfaces as `StoreError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{BankAccount, LiquidityPosition, LiquidityType};
use super::store::PositionStore;
use crate::core_types::{NetworkBalances, PositionId, UserId};
use crate::db::{SafeRow, StoreError};

pub struct PgPositionStore {
    pool: PgPool,
}

impl PgPositionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_position(row: &sqlx::postgres::PgRow) -> Result<LiquidityPosition, StoreError> {
        let position_id: String = row.try_get_column("position_id")?;
        let liquidity_type: String = row.try_get_column("liquidity_type")?;

        Ok(LiquidityPosition {
            position_id: position_id
                .parse::<PositionId>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            user_id: row.try_get_column("user_id")?,
            wallet_id: row.try_get_column("wallet_id")?,
            liquidity_type: liquidity_type
                .parse::<LiquidityType>()
                .map_err(StoreError::Corrupt)?,
            balances: NetworkBalances::new(
                row.try_get_column("base_balance")?,
                row.try_get_column("solana_balance")?,
            ),
            bank_account: BankAccount {
                account_number: row.try_get_column("account_number")?,
                bank_code: row.try_get_column("bank_code")?,
                bank_name: row.try_get_column("bank_name")?,
                account_name: row.try_get_column("account_name")?,
            },
            is_active: row.try_get_column("is_active")?,
            is_verified: row.try_get_column("is_verified")?,
            created_at: row.try_get_column("created_at")?,
            balances_refreshed_at: row.try_get_column("balances_refreshed_at")?,
            updated_at: row.try_get_column("updated_at")?,
        })
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    async fn create(&self, position: &LiquidityPosition) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO liquidity_positions_tb
                (position_id, user_id, wallet_id, liquidity_type, base_balance, solana_balance,
                 account_number, bank_code, bank_name, account_name, is_active, is_verified,
                 balances_refreshed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(position.position_id.to_string())
        .bind(position.user_id)
        .bind(&position.wallet_id)
        .bind(position.liquidity_type.as_str())
        .bind(position.balances.base)
        .bind(position.balances.solana)
        .bind(&position.bank_account.account_number)
        .bind(&position.bank_account.bank_code)
        .bind(&position.bank_account.bank_name)
        .bind(&position.bank_account.account_name)
        .bind(position.is_active)
        .bind(position.is_verified)
        .bind(position.balances_refreshed_at)
        .bind(position.created_at)
        .bind(position.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_active(&self, user_id: UserId) -> Result<Option<LiquidityPosition>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT position_id, user_id, wallet_id, liquidity_type, base_balance, solana_balance,
                   account_number, bank_code, bank_name, account_name, is_active, is_verified,
                   balances_refreshed_at, created_at, updated_at
            FROM liquidity_positions_tb
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_position).transpose()
    }

    async fn update_balances(
        &self,
        position_id: PositionId,
        balances: &NetworkBalances,
        refreshed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE liquidity_positions_tb
            SET base_balance = $1, solana_balance = $2, balances_refreshed_at = $3, updated_at = NOW()
            WHERE position_id = $4
            "#,
        )
        .bind(balances.base)
        .bind(balances.solana)
        .bind(refreshed_at)
        .bind(position_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_bank_account(
        &self,
        position_id: PositionId,
        bank_account: &BankAccount,
        is_verified: bool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE liquidity_positions_tb
            SET account_number = $1, bank_code = $2, bank_name = $3, account_name = $4,
                is_verified = $5, updated_at = NOW()
            WHERE position_id = $6
            "#,
        )
        .bind(&bank_account.account_number)
        .bind(&bank_account.bank_code)
        .bind(&bank_account.bank_name)
        .bind(&bank_account.account_name)
        .bind(is_verified)
        .bind(position_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
