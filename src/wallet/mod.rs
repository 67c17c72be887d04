//! On-chain wallet service boundary
//!
//! Key custody lives behind this service. We only ever ask it to provision
//! per-user wallets, return their addresses, and report live balances.

pub mod http;

pub use http::HttpWalletProvider;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::{Network, NetworkBalances, UserId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("No wallets provisioned for user {0}")]
    NotFound(UserId),

    #[error("Wallet service rejected the request: {0}")]
    Rejected(String),

    #[error("Wallet service unavailable: {0}")]
    Unavailable(String),
}

/// Funding addresses per network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddresses {
    pub base: String,
    pub solana: String,
}

impl WalletAddresses {
    pub fn get(&self, network: Network) -> &str {
        match network {
            Network::Base => &self.base,
            Network::Solana => &self.solana,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWallets {
    pub wallet_id: String,
    pub addresses: WalletAddresses,
}

/// Live balances as reported by the wallet service.
///
/// A network is `None` when the service could not read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalances {
    #[serde(default)]
    pub base: Option<Decimal>,
    #[serde(default)]
    pub solana: Option<Decimal>,
}

impl WalletBalances {
    pub fn complete(balances: NetworkBalances) -> Self {
        Self {
            base: Some(balances.base),
            solana: Some(balances.solana),
        }
    }

    pub fn get(&self, network: Network) -> Option<Decimal> {
        match network {
            Network::Base => self.base,
            Network::Solana => self.solana,
        }
    }

    /// Networks that could not be read
    pub fn missing(&self) -> Vec<Network> {
        Network::ALL
            .into_iter()
            .filter(|n| self.get(*n).is_none())
            .collect()
    }

    /// Full snapshot, only when every network was read
    pub fn into_complete(self) -> Option<NetworkBalances> {
        Some(NetworkBalances::new(self.base?, self.solana?))
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn create_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError>;

    async fn get_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError>;

    async fn get_wallet_balances(&self, user_id: UserId) -> Result<WalletBalances, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_balances() {
        let partial = WalletBalances {
            base: Some(Decimal::from(10)),
            solana: None,
        };
        assert_eq!(partial.missing(), vec![Network::Solana]);
        assert!(partial.into_complete().is_none());

        let full = WalletBalances::complete(NetworkBalances::new(Decimal::from(10), Decimal::ONE));
        assert!(full.missing().is_empty());
        assert_eq!(full.into_complete().unwrap().total(), Decimal::from(11));
    }

    #[test]
    fn test_balances_accept_strings_numbers_and_null() {
        let parsed: WalletBalances =
            serde_json::from_str(r#"{"base":"12.5","solana":null}"#).unwrap();
        assert_eq!(parsed.base, Some(Decimal::new(125, 1)));
        assert_eq!(parsed.solana, None);

        let parsed: WalletBalances = serde_json::from_str(r#"{"base":3}"#).unwrap();
        assert_eq!(parsed.base, Some(Decimal::from(3)));
        assert_eq!(parsed.missing(), vec![Network::Solana]);
    }
}
