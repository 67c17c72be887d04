use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::core_types::Network;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL. In-memory stores are used when absent.
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub withdrawal: WithdrawalConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    #[serde(default)]
    pub relay: ServiceEndpointConfig,
    #[serde(default)]
    pub wallet_service: ServiceEndpointConfig,
    #[serde(default)]
    pub bank_provider: BankProviderConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity service that issues user tokens
    pub jwt_secret: String,
}

/// Withdrawal policy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WithdrawalConfig {
    pub min_amount: Decimal,
    pub min_address_length: usize,
    pub transfer_timeout_ms: u64,
    /// Token moved by user withdrawals
    #[serde(default = "default_token")]
    pub token: String,
}

fn default_token() -> String {
    "USDC".to_string()
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::new(5, 1),
            min_address_length: 32,
            transfer_timeout_ms: 30_000,
            token: default_token(),
        }
    }
}

impl WithdrawalConfig {
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettlementConfig {
    pub estimated_seconds_base: u64,
    pub estimated_seconds_solana: u64,
    /// Shared secret expected in `X-Webhook-Secret`; webhooks are unauthenticated when unset
    #[serde(default)]
    pub webhook_secret: Option<String>,
    pub transfer_timeout_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            estimated_seconds_base: 120,
            estimated_seconds_solana: 60,
            webhook_secret: None,
            transfer_timeout_ms: 30_000,
        }
    }
}

impl SettlementConfig {
    pub fn estimated_seconds(&self, network: Network) -> u64 {
        match network {
            Network::Base => self.estimated_seconds_base,
            Network::Solana => self.estimated_seconds_solana,
        }
    }
}

/// Reconciliation worker for records left `pending`/`initiated`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReconciliationConfig {
    pub enabled: bool,
    pub scan_interval_secs: u64,
    pub stale_threshold_secs: u64,
    pub batch_size: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 30,
            stale_threshold_secs: 120,
            batch_size: 100,
        }
    }
}

/// HTTP collaborator endpoint (relay, wallet service)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceEndpointConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ServiceEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            request_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BankProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub secret_key: Option<String>,
    pub request_timeout_ms: u64,
    pub bank_list_ttl_secs: u64,
}

impl Default for BankProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: None,
            request_timeout_ms: 10_000,
            bank_list_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// A transfer must time out locally before reconciliation may look it up,
    /// otherwise the worker can finalize a record whose `execute` is still running.
    fn validate(&self) -> anyhow::Result<()> {
        if !self.reconciliation.enabled {
            return Ok(());
        }
        let stale_ms = self.reconciliation.stale_threshold_secs.saturating_mul(1000);
        for (section, timeout_ms) in [
            ("withdrawal", self.withdrawal.transfer_timeout_ms),
            ("settlement", self.settlement.transfer_timeout_ms),
        ] {
            anyhow::ensure!(
                timeout_ms < stale_ms,
                "{}.transfer_timeout_ms ({}) must be below reconciliation.stale_threshold_secs ({}s)",
                section,
                timeout_ms,
                self.reconciliation.stale_threshold_secs
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: liquidity.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
auth:
  jwt_secret: dev-secret
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert!(config.postgres_url.is_none());
        assert_eq!(config.withdrawal.min_amount, Decimal::new(5, 1));
        assert_eq!(config.withdrawal.transfer_timeout(), Duration::from_secs(30));
        assert!(config.relay.base_url.is_none());
        assert!(config.settlement.webhook_secret.is_none());
    }

    #[test]
    fn test_withdrawal_overrides() {
        let yaml = format!(
            "{}withdrawal:\n  min_amount: \"1.25\"\n  min_address_length: 40\n  transfer_timeout_ms: 500\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.withdrawal.min_amount, Decimal::new(125, 2));
        assert_eq!(config.withdrawal.min_address_length, 40);
        assert_eq!(
            config.withdrawal.transfer_timeout(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_estimated_seconds_per_network() {
        let config = SettlementConfig::default();
        assert_eq!(config.estimated_seconds(Network::Base), 120);
        assert_eq!(config.estimated_seconds(Network::Solana), 60);
    }

    #[test]
    fn test_transfer_timeout_must_undercut_stale_threshold() {
        let slow_withdrawal = format!(
            "{}withdrawal:\n  min_amount: \"0.5\"\n  min_address_length: 32\n  transfer_timeout_ms: 120000\n",
            MINIMAL
        );
        let err = AppConfig::from_yaml(&slow_withdrawal).unwrap_err();
        assert!(err.to_string().contains("withdrawal.transfer_timeout_ms"));

        let slow_settlement = format!(
            "{}settlement:\n  estimated_seconds_base: 120\n  estimated_seconds_solana: 60\n  transfer_timeout_ms: 300000\n",
            MINIMAL
        );
        let err = AppConfig::from_yaml(&slow_settlement).unwrap_err();
        assert!(err.to_string().contains("settlement.transfer_timeout_ms"));

        // no worker, nothing to race
        let disabled = format!(
            "{}reconciliation:\n  enabled: false\n  scan_interval_secs: 30\n  stale_threshold_secs: 1\n  batch_size: 10\n",
            slow_withdrawal
        );
        assert!(AppConfig::from_yaml(&disabled).is_ok());
    }

    #[test]
    fn test_missing_auth_section_fails() {
        let yaml = MINIMAL.replace("auth:\n  jwt_secret: dev-secret\n", "");
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }
}
