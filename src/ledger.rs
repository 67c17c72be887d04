//! Balance ledger adapter
//!
//! Pulls authoritative balances from the wallet service and writes them onto
//! the user's active position. Nothing is written unless every network was
//! read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::core_types::{Network, NetworkBalances, PositionId, UserId};
use crate::db::StoreError;
use crate::position::PositionStore;
use crate::wallet::WalletProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRefresh {
    pub position_id: PositionId,
    pub balances: NetworkBalances,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("No active position for user {0}")]
    PositionNotFound(UserId),

    #[error("Balances unavailable for networks: {missing:?}")]
    Partial { missing: Vec<Network> },

    #[error("Balance source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// Refresh the active position's balances. Idempotent.
    async fn refresh(&self, user_id: UserId) -> Result<BalanceRefresh, LedgerError>;
}

/// Ledger backed by the wallet service and the position store
pub struct ChainLedger {
    positions: Arc<dyn PositionStore>,
    wallets: Arc<dyn WalletProvider>,
}

impl ChainLedger {
    pub fn new(positions: Arc<dyn PositionStore>, wallets: Arc<dyn WalletProvider>) -> Self {
        Self { positions, wallets }
    }
}

#[async_trait]
impl LedgerAdapter for ChainLedger {
    async fn refresh(&self, user_id: UserId) -> Result<BalanceRefresh, LedgerError> {
        let position = self
            .positions
            .get_active(user_id)
            .await?
            .ok_or(LedgerError::PositionNotFound(user_id))?;

        let live = self
            .wallets
            .get_wallet_balances(user_id)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let missing = live.missing();
        let Some(balances) = live.into_complete() else {
            tracing::warn!(user_id, ?missing, "Partial balance read, position left untouched");
            return Err(LedgerError::Partial { missing });
        };

        let refreshed_at = Utc::now();
        if !self
            .positions
            .update_balances(position.position_id, &balances, refreshed_at)
            .await?
        {
            return Err(LedgerError::PositionNotFound(user_id));
        }

        tracing::debug!(
            user_id,
            position_id = %position.position_id,
            base = %balances.base,
            solana = %balances.solana,
            "Balances refreshed"
        );

        Ok(BalanceRefresh {
            position_id: position.position_id,
            balances,
            refreshed_at,
        })
    }
}
