use std::sync::Arc;

use crate::banking::BankVerifier;
use crate::db::Database;
use crate::position::PositionService;
use crate::settlement::SettlementOrchestrator;
use crate::withdrawal::WithdrawalOrchestrator;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub positions: Arc<PositionService>,
    pub withdrawals: Arc<WithdrawalOrchestrator>,
    pub settlements: Arc<SettlementOrchestrator>,
    /// Bank directory used by the public bank endpoints
    pub banks: Arc<dyn BankVerifier>,
    /// HS256 secret for user tokens
    pub jwt_secret: String,
    /// PostgreSQL handle, `None` when running on in-memory stores
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        positions: Arc<PositionService>,
        withdrawals: Arc<WithdrawalOrchestrator>,
        settlements: Arc<SettlementOrchestrator>,
        banks: Arc<dyn BankVerifier>,
        jwt_secret: String,
    ) -> Self {
        Self {
            positions,
            withdrawals,
            settlements,
            banks,
            jwt_secret,
            db: None,
        }
    }

    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.db = Some(db);
        self
    }
}
