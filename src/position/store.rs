use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;

use super::models::{BankAccount, LiquidityPosition};
use crate::core_types::{NetworkBalances, PositionId, UserId};
use crate::db::StoreError;

#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Insert a new active position.
    ///
    /// `StoreError::Conflict` when the user already has an active position.
    async fn create(&self, position: &LiquidityPosition) -> Result<(), StoreError>;

    async fn get_active(&self, user_id: UserId) -> Result<Option<LiquidityPosition>, StoreError>;

    /// Overwrite the balance snapshot. Returns `false` for an unknown position.
    async fn update_balances(
        &self,
        position_id: PositionId,
        balances: &NetworkBalances,
        refreshed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn update_bank_account(
        &self,
        position_id: PositionId,
        bank_account: &BankAccount,
        is_verified: bool,
    ) -> Result<bool, StoreError>;
}

/// In-memory position store
#[derive(Default)]
pub struct MemoryPositionStore {
    positions: DashMap<PositionId, LiquidityPosition>,
    active_by_user: DashMap<UserId, PositionId>,
    /// Serializes create so the active index and the row map agree
    create_lock: Mutex<()>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, position_id: PositionId, f: F) -> bool
    where
        F: FnOnce(&mut LiquidityPosition),
    {
        match self.positions.get_mut(&position_id) {
            Some(mut position) => {
                f(&mut position);
                position.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn create(&self, position: &LiquidityPosition) -> Result<(), StoreError> {
        let _guard = self
            .create_lock
            .lock()
            .map_err(|_| StoreError::Database("position store lock poisoned".into()))?;

        if position.is_active && self.active_by_user.contains_key(&position.user_id) {
            return Err(StoreError::Conflict(format!(
                "user {} already has an active position",
                position.user_id
            )));
        }

        // Row before index: a reader that finds the index entry must find the row
        self.positions.insert(position.position_id, position.clone());
        if position.is_active {
            self.active_by_user.insert(position.user_id, position.position_id);
        }
        Ok(())
    }

    async fn get_active(&self, user_id: UserId) -> Result<Option<LiquidityPosition>, StoreError> {
        let Some(position_id) = self.active_by_user.get(&user_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.positions.get(&position_id).map(|p| p.clone()))
    }

    async fn update_balances(
        &self,
        position_id: PositionId,
        balances: &NetworkBalances,
        refreshed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.update(position_id, |p| {
            p.balances = *balances;
            p.balances_refreshed_at = Some(refreshed_at);
        }))
    }

    async fn update_bank_account(
        &self,
        position_id: PositionId,
        bank_account: &BankAccount,
        is_verified: bool,
    ) -> Result<bool, StoreError> {
        Ok(self.update(position_id, |p| {
            p.bank_account = bank_account.clone();
            p.is_verified = is_verified;
        }))
    }
}
