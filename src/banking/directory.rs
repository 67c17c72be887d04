//! Cached bank directory
//!
//! The supported-bank list changes rarely, so it is held per process with a
//! TTL. Account resolution is always forwarded live.

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Bank, BankError, BankVerifier, ResolvedAccount};

const BANKS_KEY: &str = "banks";

pub struct BankDirectory {
    inner: Arc<dyn BankVerifier>,
    banks: Mutex<TimedCache<&'static str, Vec<Bank>>>,
}

impl BankDirectory {
    pub fn new(inner: Arc<dyn BankVerifier>, ttl_secs: u64) -> Self {
        Self {
            inner,
            banks: Mutex::new(TimedCache::with_lifespan(ttl_secs)),
        }
    }
}

#[async_trait]
impl BankVerifier for BankDirectory {
    fn is_valid_account_number(&self, account_number: &str) -> bool {
        self.inner.is_valid_account_number(account_number)
    }

    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, BankError> {
        self.inner.resolve_account(account_number, bank_code).await
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, BankError> {
        // Held across the fetch so concurrent misses hit the provider once
        let mut cache = self.banks.lock().await;
        if let Some(banks) = cache.cache_get(&BANKS_KEY) {
            return Ok(banks.clone());
        }

        tracing::debug!("[banks] Loading bank list from provider");
        let banks = self.inner.list_banks().await?;
        cache.cache_set(BANKS_KEY, banks.clone());
        Ok(banks)
    }
}
