use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::{UserWallets, WalletBalances, WalletError, WalletProvider};
use crate::config::ServiceEndpointConfig;
use crate::core_types::UserId;

/// Wallet service client
///
/// - `POST {base}/users/{id}/wallets` provisions (idempotent on the service side)
/// - `GET  {base}/users/{id}/wallets` returns addresses
/// - `GET  {base}/users/{id}/balances` returns live per-network balances
pub struct HttpWalletProvider {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpWalletProvider {
    pub fn new(config: &ServiceEndpointConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, user_id: UserId, resource: &str) -> Result<String, WalletError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| WalletError::Unavailable("wallet service not configured".into()))?;
        Ok(format!("{}/users/{}/{}", base, user_id, resource))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        user_id: UserId,
        response: reqwest::Response,
    ) -> Result<T, WalletError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WalletError::NotFound(user_id));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("wallet service returned {}: {}", status, text);
            return Err(if status.is_client_error() {
                WalletError::Rejected(message)
            } else {
                WalletError::Unavailable(message)
            });
        }
        response
            .json()
            .await
            .map_err(|e| WalletError::Unavailable(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn create_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError> {
        let response = self
            .authorize(self.client.post(self.url(user_id, "wallets")?))
            .send()
            .await
            .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        Self::decode(user_id, response).await
    }

    async fn get_user_wallets(&self, user_id: UserId) -> Result<UserWallets, WalletError> {
        let response = self
            .authorize(self.client.get(self.url(user_id, "wallets")?))
            .send()
            .await
            .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        Self::decode(user_id, response).await
    }

    async fn get_wallet_balances(&self, user_id: UserId) -> Result<WalletBalances, WalletError> {
        let response = self
            .authorize(self.client.get(self.url(user_id, "balances")?))
            .send()
            .await
            .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        Self::decode(user_id, response).await
    }
}
