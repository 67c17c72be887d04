//! Business settlements
//!
//! Payouts requested by a business for an order. Independent of user
//! positions: a settlement is persisted as `initiated`, its transfer is
//! dispatched in the background, and later progress arrives by webhook.

pub mod error;
pub mod id;
pub mod orchestrator;
pub mod pg;
pub mod state;
pub mod store;
pub mod types;

pub use error::SettlementError;
pub use orchestrator::SettlementOrchestrator;
pub use pg::PgSettlementStore;
pub use state::SettlementStatus;
pub use store::{MemorySettlementStore, SettlementStore};
pub use types::{
    AdvanceOutcome, IgnoreReason, SettlementRecord, SettlementRequest, SettlementStatusView,
    SettlementTicket, SettlementUpdate, WebhookAck,
};
