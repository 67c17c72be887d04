//! Settlement store trait and the in-memory implementation

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;

use super::state::SettlementStatus;
use super::types::{AdvanceOutcome, SettlementRecord, SettlementUpdate};
use crate::db::StoreError;
use crate::transaction::store::stale_cutoff;

#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn create(&self, record: &SettlementRecord) -> Result<(), StoreError>;

    async fn get(&self, settlement_id: &str) -> Result<Option<SettlementRecord>, StoreError>;

    /// Read-modify-write of one record under a row lock.
    ///
    /// Concurrent updates to the same settlement serialize; the forward-only
    /// rule is evaluated against the latest stored state. Returns `None`
    /// for an unknown id.
    async fn apply_update(
        &self,
        settlement_id: &str,
        update: &SettlementUpdate,
    ) -> Result<Option<(AdvanceOutcome, SettlementRecord)>, StoreError>;

    /// Oldest `initiated` settlements not touched since `now - older_than`
    async fn find_stale_initiated(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<SettlementRecord>, StoreError>;
}

#[derive(Default)]
pub struct MemorySettlementStore {
    records: DashMap<String, SettlementRecord>,
}

impl MemorySettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SettlementStore for MemorySettlementStore {
    async fn create(&self, record: &SettlementRecord) -> Result<(), StoreError> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.settlement_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "settlement {} already exists",
                record.settlement_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, settlement_id: &str) -> Result<Option<SettlementRecord>, StoreError> {
        Ok(self.records.get(settlement_id).map(|r| r.clone()))
    }

    async fn apply_update(
        &self,
        settlement_id: &str,
        update: &SettlementUpdate,
    ) -> Result<Option<(AdvanceOutcome, SettlementRecord)>, StoreError> {
        // get_mut holds the shard write lock for the whole read-modify-write
        Ok(self.records.get_mut(settlement_id).map(|mut record| {
            let outcome = record.apply(update, Utc::now());
            (outcome, record.clone())
        }))
    }

    async fn find_stale_initiated(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<SettlementRecord>, StoreError> {
        let cutoff = stale_cutoff(older_than);
        let mut stale: Vec<SettlementRecord> = self
            .records
            .iter()
            .filter(|r| r.status == SettlementStatus::Initiated && r.updated_at <= cutoff)
            .map(|r| r.clone())
            .collect();
        stale.sort_by_key(|r| r.updated_at);
        stale.truncate(limit);
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Network;
    use crate::settlement::types::{IgnoreReason, SettlementRequest};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn record(id: &str) -> SettlementRecord {
        SettlementRecord::new(
            id.to_string(),
            SettlementRequest {
                order_id: "ord-7".into(),
                customer_wallet: "0x4444444444444444444444444444444444444444".into(),
                amount: Decimal::from(40),
                token: "USDC".into(),
                network: Network::Base,
                business_id: Some("biz-1".into()),
                customer_id: None,
            },
            120,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemorySettlementStore::new();
        let r = record("STL-1-aaaaaaaaaaaaaaaa");
        store.create(&r).await.unwrap();
        assert!(matches!(
            store.create(&r).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.get(&r.settlement_id).await.unwrap(), Some(r));
        assert!(store.get("STL-1-bbbbbbbbbbbbbbbb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_update_unknown_id() {
        let store = MemorySettlementStore::new();
        let result = store
            .apply_update(
                "STL-1-cccccccccccccccc",
                &SettlementUpdate::status(SettlementStatus::Completed),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_terminal_updates_pick_one() {
        let store = Arc::new(MemorySettlementStore::new());
        let r = record("STL-1-dddddddddddddddd");
        store.create(&r).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let id = r.settlement_id.clone();
            handles.push(tokio::spawn(async move {
                let status = if i % 2 == 0 {
                    SettlementStatus::Completed
                } else {
                    SettlementStatus::Failed
                };
                store
                    .apply_update(&id, &SettlementUpdate::status(status))
                    .await
                    .unwrap()
                    .unwrap()
                    .0
            }));
        }

        let mut advanced = 0;
        for h in handles {
            match h.await.unwrap() {
                AdvanceOutcome::Advanced => advanced += 1,
                AdvanceOutcome::Ignored(IgnoreReason::Stale | IgnoreReason::Duplicate) => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(advanced, 1);
        let stored = store.get(&r.settlement_id).await.unwrap().unwrap();
        assert!(stored.status.is_terminal());
    }

    #[tokio::test]
    async fn test_find_stale_initiated() {
        let store = MemorySettlementStore::new();
        let mut old = record("STL-1-eeeeeeeeeeeeeeee");
        old.updated_at = Utc::now() - chrono::TimeDelta::minutes(5);
        let mut old_processing = record("STL-1-ffffffffffffffff");
        old_processing.updated_at = old.updated_at;
        old_processing.status = SettlementStatus::Processing;
        let fresh = record("STL-1-0000000000000000");
        for r in [&old, &old_processing, &fresh] {
            store.create(r).await.unwrap();
        }

        let stale = store
            .find_stale_initiated(Duration::from_secs(60), 10)
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].settlement_id, old.settlement_id);
    }
}
