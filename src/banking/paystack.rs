//! Paystack-compatible bank provider client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{Bank, BankError, BankVerifier, ResolvedAccount};
use crate::config::BankProviderConfig;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ProviderBank {
    name: String,
    code: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct ProviderAccount {
    account_number: String,
    account_name: String,
}

fn default_active() -> bool {
    true
}

pub struct HttpBankVerifier {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl HttpBankVerifier {
    pub fn new(config: &BankProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, BankError> {
        let key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| BankError::Unavailable("bank provider not configured".into()))?;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(key)
            .query(query)
            .send()
            .await
            .map_err(|e| BankError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(BankError::Unavailable(format!(
                "bank provider returned {}",
                status
            )));
        }

        // 4xx bodies carry the same envelope with `status: false`
        response
            .json()
            .await
            .map_err(|e| BankError::Unavailable(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl BankVerifier for HttpBankVerifier {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, BankError> {
        if !self.is_valid_account_number(account_number) {
            return Err(BankError::InvalidAccountNumber);
        }

        let envelope: Envelope<ProviderAccount> = self
            .get(
                "/bank/resolve",
                &[("account_number", account_number), ("bank_code", bank_code)],
            )
            .await?;

        match envelope.data {
            Some(account) if envelope.status => Ok(ResolvedAccount {
                account_number: account.account_number,
                account_name: account.account_name,
            }),
            _ => Err(BankError::ResolutionFailed(envelope.message)),
        }
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, BankError> {
        let envelope: Envelope<Vec<ProviderBank>> = self
            .get("/bank", &[("country", "nigeria"), ("perPage", "200")])
            .await?;

        if !envelope.status {
            return Err(BankError::Unavailable(envelope.message));
        }

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|b| b.active)
            .map(|b| Bank {
                name: b.name,
                code: b.code,
                slug: b.slug,
            })
            .collect())
    }
}
