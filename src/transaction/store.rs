//! Transaction store trait and the in-memory implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::time::Duration;

use super::state::TransactionStatus;
use super::types::{TransactionPage, TransactionQuery, TransactionRecord, Transition};
use crate::core_types::{Network, PositionId, TransactionId, UserId};
use crate::db::StoreError;

/// Append/update-only store of transaction records
///
/// Records are never deleted. The only mutation is [`finalize`], a
/// compare-and-swap out of `pending`.
///
/// [`finalize`]: TransactionStore::finalize
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Durably insert a new record
    async fn create(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError>;

    /// Move a `pending` record to the transition's terminal status.
    ///
    /// Returns `Ok(false)` when the record is unknown or no longer `pending`.
    async fn finalize(&self, id: TransactionId, transition: &Transition)
    -> Result<bool, StoreError>;

    /// Newest-first page of a user's transactions
    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError>;

    /// Sum of `pending` withdrawals reserved against a position on one network
    async fn pending_total(
        &self,
        position_id: PositionId,
        network: Network,
    ) -> Result<Decimal, StoreError>;

    /// Oldest `pending` records created before `now - older_than`
    async fn find_stale_pending(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// `now - older_than`, saturating at the earliest representable instant
pub(crate) fn stale_cutoff(older_than: Duration) -> DateTime<Utc> {
    chrono::TimeDelta::from_std(older_than)
        .ok()
        .and_then(|delta| Utc::now().checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// In-memory transaction store
#[derive(Default)]
pub struct MemoryTransactionStore {
    records: DashMap<TransactionId, TransactionRecord>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.transaction_id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                record.transaction_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn finalize(
        &self,
        id: TransactionId,
        transition: &Transition,
    ) -> Result<bool, StoreError> {
        match self.records.get_mut(&id) {
            Some(mut record) => Ok(record.apply(transition, Utc::now())),
            None => Ok(false),
        }
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        let mut matching: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && query.matches(r))
            .map(|r| r.clone())
            .collect();
        matching.sort_by(|a, b| b.transaction_id.cmp(&a.transaction_id));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok(TransactionPage {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn pending_total(
        &self,
        position_id: PositionId,
        network: Network,
    ) -> Result<Decimal, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                r.position_id == position_id
                    && r.network == network
                    && r.status == TransactionStatus::Pending
            })
            .map(|r| r.amount)
            .sum())
    }

    async fn find_stale_pending(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let cutoff = stale_cutoff(older_than);
        let mut stale: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|r| r.status == TransactionStatus::Pending && r.created_at <= cutoff)
            .map(|r| r.clone())
            .collect();
        stale.sort_by_key(|r| r.created_at);
        stale.truncate(limit);
        Ok(stale)
    }
}
