use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core_types::{NetworkBalances, PositionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityType {
    Onramp,
    Offramp,
}

impl LiquidityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidityType::Onramp => "onramp",
            LiquidityType::Offramp => "offramp",
        }
    }
}

impl fmt::Display for LiquidityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiquidityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onramp" => Ok(LiquidityType::Onramp),
            "offramp" => Ok(LiquidityType::Offramp),
            _ => Err(format!("Invalid liquidity type: {}", s)),
        }
    }
}

/// Payout bank account snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub account_number: String,
    pub bank_code: String,
    pub bank_name: String,
    pub account_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityPosition {
    pub position_id: PositionId,
    pub user_id: UserId,
    pub wallet_id: String,
    pub liquidity_type: LiquidityType,
    pub balances: NetworkBalances,
    pub bank_account: BankAccount,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub balances_refreshed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl LiquidityPosition {
    pub fn total_balance(&self) -> Decimal {
        self.balances.total()
    }
}

/// Input for onboarding a position
#[derive(Debug, Clone)]
pub struct NewPosition {
    pub user_id: UserId,
    pub wallet_id: String,
    pub liquidity_type: LiquidityType,
    pub bank_account: BankAccount,
    pub is_verified: bool,
}

impl NewPosition {
    /// Active position with zero balances, never refreshed
    pub fn into_position(self) -> LiquidityPosition {
        let now = Utc::now();
        LiquidityPosition {
            position_id: PositionId::new(),
            user_id: self.user_id,
            wallet_id: self.wallet_id,
            liquidity_type: self.liquidity_type,
            balances: NetworkBalances::default(),
            bank_account: self.bank_account,
            is_active: true,
            is_verified: self.is_verified,
            created_at: now,
            balances_refreshed_at: None,
            updated_at: now,
        }
    }
}

/// Outward view of a position
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub position_id: PositionId,
    pub user_id: UserId,
    pub wallet_id: String,
    pub liquidity_type: LiquidityType,
    pub base_balance: Decimal,
    pub solana_balance: Decimal,
    pub total_balance: Decimal,
    pub bank_account: BankAccount,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub balances_refreshed_at: Option<DateTime<Utc>>,
    /// Set when the live refresh failed and cached balances are served
    pub balances_stale: bool,
}

impl PositionView {
    pub fn new(position: &LiquidityPosition, balances_stale: bool) -> Self {
        Self {
            position_id: position.position_id,
            user_id: position.user_id,
            wallet_id: position.wallet_id.clone(),
            liquidity_type: position.liquidity_type,
            base_balance: position.balances.base,
            solana_balance: position.balances.solana,
            total_balance: position.total_balance(),
            bank_account: position.bank_account.clone(),
            is_active: position.is_active,
            is_verified: position.is_verified,
            created_at: position.created_at,
            balances_refreshed_at: position.balances_refreshed_at,
            balances_stale,
        }
    }
}
