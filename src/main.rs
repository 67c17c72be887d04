//! Liquidity Settlement Service - entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────┐
//! │  Config  │───▶│    Stores    │───▶│   Services   │───▶│ Gateway  │
//! │  (YAML)  │    │ (PG / memory)│    │ (orchestr.)  │    │  (axum)  │
//! └──────────┘    └──────────────┘    └──────┬───────┘    └──────────┘
//!                                            │
//!                                   ┌────────▼─────────┐
//!                                   │ Reconciliation   │
//!                                   │ worker (tokio)   │
//!                                   └──────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use liquidity_settlement::banking::{BankDirectory, BankVerifier, HttpBankVerifier};
use liquidity_settlement::config::AppConfig;
use liquidity_settlement::db::Database;
use liquidity_settlement::executor::{RelayExecutor, TransferExecutor};
use liquidity_settlement::gateway::{self, state::AppState};
use liquidity_settlement::ledger::{ChainLedger, LedgerAdapter};
use liquidity_settlement::position::{MemoryPositionStore, PgPositionStore, PositionStore};
use liquidity_settlement::reconcile::{ReconciliationWorker, WorkerConfig};
use liquidity_settlement::settlement::{MemorySettlementStore, PgSettlementStore, SettlementStore};
use liquidity_settlement::transaction::{
    MemoryTransactionStore, PgTransactionStore, TransactionStore,
};
use liquidity_settlement::wallet::{HttpWalletProvider, WalletProvider};
use liquidity_settlement::{PositionService, SettlementOrchestrator, WithdrawalOrchestrator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

struct Stores {
    positions: Arc<dyn PositionStore>,
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
    db: Option<Arc<Database>>,
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    let Some(url) = config.postgres_url.as_deref() else {
        tracing::warn!("postgres_url not set, running on in-memory stores");
        return Ok(Stores {
            positions: Arc::new(MemoryPositionStore::new()),
            transactions: Arc::new(MemoryTransactionStore::new()),
            settlements: Arc::new(MemorySettlementStore::new()),
            db: None,
        });
    };

    let db = Database::connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.migrate().await.context("Failed to apply migrations")?;
    tracing::info!("PostgreSQL connected, migrations applied");

    let pool = db.pool().clone();
    Ok(Stores {
        positions: Arc::new(PgPositionStore::new(pool.clone())),
        transactions: Arc::new(PgTransactionStore::new(pool.clone())),
        settlements: Arc::new(PgSettlementStore::new(pool)),
        db: Some(Arc::new(db)),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = liquidity_settlement::logging::init_logging(&app_config);

    tracing::info!("Starting Liquidity Settlement Service in {} mode", env);

    let stores = open_stores(&app_config).await?;

    // Collaborators
    let executor: Arc<dyn TransferExecutor> = Arc::new(
        RelayExecutor::new(&app_config.relay).context("Failed to build relay client")?,
    );
    if !executor.is_configured() {
        tracing::warn!("Relay executor not configured; withdrawals and settlements will be refused");
    }
    let wallets: Arc<dyn WalletProvider> = Arc::new(
        HttpWalletProvider::new(&app_config.wallet_service)
            .context("Failed to build wallet service client")?,
    );
    let bank_provider = HttpBankVerifier::new(&app_config.bank_provider)
        .context("Failed to build bank provider client")?;
    let banks: Arc<dyn BankVerifier> = Arc::new(BankDirectory::new(
        Arc::new(bank_provider),
        app_config.bank_provider.bank_list_ttl_secs,
    ));
    let ledger: Arc<dyn LedgerAdapter> =
        Arc::new(ChainLedger::new(stores.positions.clone(), wallets.clone()));

    // Services
    let positions = Arc::new(PositionService::new(
        stores.positions.clone(),
        stores.transactions.clone(),
        ledger.clone(),
        wallets,
        banks.clone(),
    ));
    let withdrawals = Arc::new(WithdrawalOrchestrator::new(
        stores.positions.clone(),
        stores.transactions.clone(),
        ledger.clone(),
        executor.clone(),
        app_config.withdrawal.clone(),
    ));
    let settlements = Arc::new(SettlementOrchestrator::new(
        stores.settlements.clone(),
        executor.clone(),
        app_config.settlement.clone(),
    ));

    if app_config.reconciliation.enabled {
        let worker = ReconciliationWorker::new(
            stores.transactions.clone(),
            stores.settlements.clone(),
            executor,
            ledger,
            WorkerConfig::from(&app_config.reconciliation),
        );
        tokio::spawn(async move {
            worker.run().await;
        });
    } else {
        tracing::warn!("Reconciliation worker disabled");
    }

    let mut state = AppState::new(
        positions,
        withdrawals,
        settlements,
        banks,
        app_config.auth.jwt_secret.clone(),
    );
    if let Some(db) = stores.db {
        state = state.with_database(db);
    }

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    gateway::run_server(&app_config.gateway.host, port, Arc::new(state))
        .await
        .context("Gateway server error")
}
