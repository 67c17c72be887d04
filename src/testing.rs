//! Mock collaborators for unit and scenario tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::banking::{Bank, BankError, BankVerifier, ResolvedAccount};
use crate::core_types::{Network, NetworkBalances, PositionId, TransactionId, UserId};
use crate::db::StoreError;
use crate::executor::{
    ExecutorError, TransferExecutor, TransferInstruction, TransferLookup, TransferReceipt,
};
use crate::position::{BankAccount, LiquidityPosition, LiquidityType, NewPosition, PositionStore};
use crate::transaction::{
    MemoryTransactionStore, TransactionPage, TransactionQuery, TransactionRecord,
    TransactionStatus, TransactionStore, Transition,
};
use crate::wallet::{UserWallets, WalletAddresses, WalletBalances, WalletError, WalletProvider};

/// Insert an active, verified position for `user_id`
pub async fn seed_position(store: &dyn PositionStore, user_id: UserId) -> LiquidityPosition {
    let position = NewPosition {
        user_id,
        wallet_id: format!("wallet-{user_id}"),
        liquidity_type: LiquidityType::Offramp,
        bank_account: BankAccount {
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            bank_name: "GTBank".into(),
            account_name: "ADA OBI".into(),
        },
        is_verified: true,
    }
    .into_position();
    store.create(&position).await.unwrap();
    position
}

// === Wallet service ===

pub struct MockWalletProvider {
    /// Successive balance readings per user; the last one repeats
    balances: Mutex<HashMap<UserId, VecDeque<WalletBalances>>>,
    unavailable: Mutex<bool>,
    create_count: AtomicUsize,
    balance_reads: AtomicUsize,
}

impl MockWalletProvider {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(false),
            create_count: AtomicUsize::new(0),
            balance_reads: AtomicUsize::new(0),
        }
    }

    pub fn set_balances(&self, user_id: UserId, base: Decimal, solana: Decimal) {
        self.set_raw_balances(
            user_id,
            WalletBalances::complete(NetworkBalances::new(base, solana)),
        );
    }

    pub fn set_raw_balances(&self, user_id: UserId, balances: WalletBalances) {
        self.balances
            .lock()
            .unwrap()
            .insert(user_id, VecDeque::from([balances]));
    }

    /// Readings returned in order, e.g. before and after a transfer
    pub fn set_balance_sequence(&self, user_id: UserId, readings: Vec<NetworkBalances>) {
        self.balances.lock().unwrap().insert(
            user_id,
            readings.into_iter().map(WalletBalances::complete).collect(),
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    fn wallets_for(user_id: UserId) -> UserWallets {
        UserWallets {
            wallet_id: format!("wallet-{user_id}"),
            addresses: WalletAddresses {
                base: format!("0x{:040x}", user_id),
                solana: format!("So1{:0>41}", user_id),
            },
        }
    }

    fn check_available(&self) -> Result<(), WalletError> {
        if *self.unavailable.lock().unwrap() {
            return Err(WalletError::Unavailable("mock wallet service down".into()));
        }
        Ok(())
    }
}

impl Default for MockWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn create_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError> {
        self.check_available()?;
        self.create_count.fetch_add(1, Ordering::SeqCst);
        Ok(Self::wallets_for(user_id))
    }

    async fn get_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError> {
        self.check_available()?;
        Ok(Self::wallets_for(user_id))
    }

    async fn get_wallet_balances(&self, user_id: UserId) -> Result<WalletBalances, WalletError> {
        self.check_available()?;
        self.balance_reads.fetch_add(1, Ordering::SeqCst);

        let mut balances = self.balances.lock().unwrap();
        let readings = balances.entry(user_id).or_default();
        let reading = if readings.len() > 1 {
            readings.pop_front()
        } else {
            readings.front().copied()
        };
        Ok(reading.unwrap_or_else(|| WalletBalances::complete(NetworkBalances::default())))
    }
}

// === Bank provider ===

pub struct MockBankVerifier {
    banks: Vec<Bank>,
    unavailable: Mutex<bool>,
    resolve_unavailable: Mutex<bool>,
    list_count: AtomicUsize,
}

impl MockBankVerifier {
    pub fn new() -> Self {
        Self {
            banks: vec![
                Bank {
                    name: "GTBank".into(),
                    code: "058".into(),
                    slug: Some("guaranty-trust-bank".into()),
                },
                Bank {
                    name: "Access Bank".into(),
                    code: "044".into(),
                    slug: Some("access-bank".into()),
                },
            ],
            unavailable: Mutex::new(false),
            resolve_unavailable: Mutex::new(false),
            list_count: AtomicUsize::new(0),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn set_resolve_unavailable(&self, unavailable: bool) {
        *self.resolve_unavailable.lock().unwrap() = unavailable;
    }

    pub fn list_count(&self) -> usize {
        self.list_count.load(Ordering::SeqCst)
    }
}

impl Default for MockBankVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankVerifier for MockBankVerifier {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, BankError> {
        if *self.resolve_unavailable.lock().unwrap() {
            return Err(BankError::Unavailable("mock resolve down".into()));
        }
        if !self.banks.iter().any(|b| b.code == bank_code) {
            return Err(BankError::ResolutionFailed("Unknown bank code".into()));
        }
        Ok(ResolvedAccount {
            account_number: account_number.to_string(),
            account_name: "ADA OBI".to_string(),
        })
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, BankError> {
        self.list_count.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock().unwrap() {
            return Err(BankError::Unavailable("mock bank list down".into()));
        }
        Ok(self.banks.clone())
    }
}

// === Transfer executor ===

/// What the next `execute` call does
#[derive(Debug, Clone)]
pub enum ExecBehavior {
    Succeed,
    Reject(String),
    Unreachable,
    Indeterminate,
    /// `is_configured` stays true but execute reports NotConfigured
    NotConfigured,
    /// Sleep before succeeding (drives caller timeouts)
    Hang(Duration),
    /// Sleep, then reject
    RejectAfter(Duration, String),
}

pub struct MockExecutor {
    configured: Mutex<bool>,
    behavior: Mutex<ExecBehavior>,
    receipt: Mutex<TransferReceipt>,
    lookups: Mutex<HashMap<String, TransferLookup>>,
    instructions: Mutex<Vec<TransferInstruction>>,
    /// Status of the caller's record at the moment `execute` was entered
    observed: Mutex<Vec<Option<TransactionStatus>>>,
    observe_store: Mutex<Option<std::sync::Arc<dyn TransactionStore>>>,
    execute_count: AtomicUsize,
    lookup_count: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            configured: Mutex::new(true),
            behavior: Mutex::new(ExecBehavior::Succeed),
            receipt: Mutex::new(TransferReceipt {
                tx_hash: "0xabc".into(),
                explorer_url: None,
                gas_fee_paid_by: "platform".into(),
            }),
            lookups: Mutex::new(HashMap::new()),
            instructions: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
            observe_store: Mutex::new(None),
            execute_count: AtomicUsize::new(0),
            lookup_count: AtomicUsize::new(0),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        *self.configured.lock().unwrap() = configured;
    }

    pub fn set_behavior(&self, behavior: ExecBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_receipt(&self, receipt: TransferReceipt) {
        *self.receipt.lock().unwrap() = receipt;
    }

    pub fn set_lookup(&self, reference: impl Into<String>, result: TransferLookup) {
        self.lookups.lock().unwrap().insert(reference.into(), result);
    }

    /// Record the status of the referenced transaction on every execute
    pub fn observe(&self, store: std::sync::Arc<dyn TransactionStore>) {
        *self.observe_store.lock().unwrap() = Some(store);
    }

    pub fn execute_count(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn instructions(&self) -> Vec<TransferInstruction> {
        self.instructions.lock().unwrap().clone()
    }

    pub fn observed(&self) -> Vec<Option<TransactionStatus>> {
        self.observed.lock().unwrap().clone()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferExecutor for MockExecutor {
    fn is_configured(&self) -> bool {
        *self.configured.lock().unwrap()
    }

    async fn execute(
        &self,
        instruction: &TransferInstruction,
    ) -> Result<TransferReceipt, ExecutorError> {
        self.execute_count.fetch_add(1, Ordering::SeqCst);
        self.instructions.lock().unwrap().push(instruction.clone());

        let store = self.observe_store.lock().unwrap().clone();
        if let Some(store) = store
            && let Ok(id) = instruction.reference.parse::<TransactionId>()
        {
            let status = store.get(id).await.ok().flatten().map(|r| r.status);
            self.observed.lock().unwrap().push(status);
        }

        if !self.is_configured() {
            return Err(ExecutorError::NotConfigured);
        }

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ExecBehavior::Succeed => Ok(self.receipt.lock().unwrap().clone()),
            ExecBehavior::Reject(reason) => Err(ExecutorError::Rejected(reason)),
            ExecBehavior::Unreachable => {
                Err(ExecutorError::Unreachable("connection refused".into()))
            }
            ExecBehavior::Indeterminate => {
                Err(ExecutorError::Indeterminate("relay returned 502".into()))
            }
            ExecBehavior::NotConfigured => Err(ExecutorError::NotConfigured),
            ExecBehavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.receipt.lock().unwrap().clone())
            }
            ExecBehavior::RejectAfter(delay, reason) => {
                tokio::time::sleep(delay).await;
                Err(ExecutorError::Rejected(reason))
            }
        }
    }

    async fn lookup(&self, reference: &str) -> Result<TransferLookup, ExecutorError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lookups
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .unwrap_or(TransferLookup::Unknown))
    }
}

// === Transaction store with an injectable outage ===

/// In-memory transaction store whose terminal writes can be made to fail
#[derive(Default)]
pub struct FlakyTransactionStore {
    inner: MemoryTransactionStore,
    fail_finalize: AtomicBool,
}

impl FlakyTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_finalize(&self, fail: bool) {
        self.fail_finalize.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionStore for FlakyTransactionStore {
    async fn create(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.inner.create(record).await
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        self.inner.get(id).await
    }

    async fn finalize(
        &self,
        id: TransactionId,
        transition: &Transition,
    ) -> Result<bool, StoreError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection reset".into()));
        }
        self.inner.finalize(id, transition).await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        self.inner.list_for_user(user_id, query).await
    }

    async fn pending_total(
        &self,
        position_id: PositionId,
        network: Network,
    ) -> Result<Decimal, StoreError> {
        self.inner.pending_total(position_id, network).await
    }

    async fn find_stale_pending(
        &self,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.inner.find_stale_pending(older_than, limit).await
    }
}
