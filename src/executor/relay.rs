//! HTTP client for the gasless relay

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{
    ExecutorError, TransferExecutor, TransferInstruction, TransferLookup, TransferReceipt,
    explorer_url,
};
use crate::config::ServiceEndpointConfig;

const DEFAULT_FEE_PAYER: &str = "platform";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayTransferResponse {
    tx_hash: String,
    #[serde(default)]
    explorer_url: Option<String>,
    #[serde(default)]
    gas_fee_paid_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayStatusResponse {
    status: String,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    explorer_url: Option<String>,
    #[serde(default)]
    gas_fee_paid_by: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

/// Relay-backed [`TransferExecutor`]
///
/// `POST {base}/transfers` submits, `GET {base}/transfers/{reference}` looks up.
pub struct RelayExecutor {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl RelayExecutor {
    pub fn new(config: &ServiceEndpointConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
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

    fn endpoint(&self) -> Result<(&str, &str), ExecutorError> {
        match (self.base_url.as_deref(), self.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Ok((url, key)),
            _ => Err(ExecutorError::NotConfigured),
        }
    }

    fn send_error(e: reqwest::Error) -> ExecutorError {
        if e.is_connect() {
            ExecutorError::Unreachable(e.to_string())
        } else {
            // Sent but no usable answer: the relay may have acted on it
            ExecutorError::Indeterminate(e.to_string())
        }
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        serde_json::from_str::<RelayErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("relay returned {}: {}", status, text))
    }
}

#[async_trait]
impl TransferExecutor for RelayExecutor {
    fn is_configured(&self) -> bool {
        self.endpoint().is_ok()
    }

    async fn execute(
        &self,
        instruction: &TransferInstruction,
    ) -> Result<TransferReceipt, ExecutorError> {
        let (base_url, api_key) = self.endpoint()?;

        let response = self
            .client
            .post(format!("{}/transfers", base_url))
            .header("X-API-Key", api_key)
            .header("Idempotency-Key", &instruction.reference)
            .json(instruction)
            .send()
            .await
            .map_err(Self::send_error)?;

        let status = response.status();
        if status.is_success() {
            let body: RelayTransferResponse = response
                .json()
                .await
                .map_err(|e| ExecutorError::Indeterminate(e.to_string()))?;
            return Ok(TransferReceipt {
                explorer_url: body
                    .explorer_url
                    .or_else(|| Some(explorer_url(instruction.network, &body.tx_hash))),
                tx_hash: body.tx_hash,
                gas_fee_paid_by: body
                    .gas_fee_paid_by
                    .unwrap_or_else(|| DEFAULT_FEE_PAYER.to_string()),
            });
        }

        let message = Self::error_message(response).await;
        if status.is_client_error() {
            Err(ExecutorError::Rejected(message))
        } else {
            Err(ExecutorError::Indeterminate(message))
        }
    }

    async fn lookup(&self, reference: &str) -> Result<TransferLookup, ExecutorError> {
        let (base_url, api_key) = self.endpoint()?;

        let response = self
            .client
            .get(format!("{}/transfers/{}", base_url, reference))
            .header("X-API-Key", api_key)
            .send()
            .await
            .map_err(Self::send_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(TransferLookup::Unknown),
            s if !s.is_success() => {
                return Err(ExecutorError::Indeterminate(
                    Self::error_message(response).await,
                ));
            }
            _ => {}
        }

        let body: RelayStatusResponse = response
            .json()
            .await
            .map_err(|e| ExecutorError::Indeterminate(e.to_string()))?;
        Ok(lookup_from_status(body))
    }
}

fn lookup_from_status(body: RelayStatusResponse) -> TransferLookup {
    match (body.status.as_str(), body.tx_hash) {
        ("confirmed" | "completed", Some(tx_hash)) => TransferLookup::Confirmed(TransferReceipt {
            tx_hash,
            explorer_url: body.explorer_url,
            gas_fee_paid_by: body
                .gas_fee_paid_by
                .unwrap_or_else(|| DEFAULT_FEE_PAYER.to_string()),
        }),
        ("failed", _) => TransferLookup::Failed(
            body.reason
                .unwrap_or_else(|| "relay reported failure".to_string()),
        ),
        ("pending" | "submitted" | "confirmed" | "completed", _) => TransferLookup::Pending,
        _ => TransferLookup::Unknown,
    }
}
