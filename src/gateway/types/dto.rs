//! Request DTOs
//!
//! Wire shapes only. Each DTO converts into the typed command its service
//! takes; `validator` rules cover presence and shape, the conversion covers
//! enum parsing.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::error::ApiError;
use super::money::StrictDecimal;
use crate::core_types::{Network, UserId};
use crate::position::{CreatePosition, LiquidityType, UpdateBankAccount};
use crate::settlement::{SettlementRequest, SettlementStatus, SettlementUpdate};
use crate::transaction::{TransactionQuery, TransactionStatus, TransactionType};
use crate::withdrawal::WithdrawCommand;

fn parse_network(raw: &str) -> Result<Network, ApiError> {
    raw.parse::<Network>().map_err(ApiError::bad_request)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePositionRequest {
    /// `onramp` or `offramp`
    #[schema(example = "offramp")]
    pub liquidity_type: String,
    #[validate(length(equal = 10, message = "accountNumber must be 10 digits"))]
    #[schema(example = "0123456789")]
    pub account_number: String,
    #[validate(length(min = 1, message = "bankCode is required"))]
    #[schema(example = "058")]
    pub bank_code: String,
    /// Used when the bank provider cannot resolve the name
    pub account_name: Option<String>,
}

impl CreatePositionRequest {
    pub fn into_command(self) -> Result<CreatePosition, ApiError> {
        Ok(CreatePosition {
            liquidity_type: self
                .liquidity_type
                .trim()
                .to_lowercase()
                .parse::<LiquidityType>()
                .map_err(ApiError::bad_request)?,
            account_number: self.account_number,
            bank_code: self.bank_code,
            account_name: self.account_name,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankAccountRequest {
    #[validate(length(equal = 10, message = "accountNumber must be 10 digits"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "bankCode is required"))]
    pub bank_code: String,
    pub account_name: Option<String>,
}

impl From<UpdateBankAccountRequest> for UpdateBankAccount {
    fn from(req: UpdateBankAccountRequest) -> Self {
        Self {
            account_number: req.account_number,
            bank_code: req.bank_code,
            account_name: req.account_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// `base` or `solana`
    #[validate(length(min = 1, message = "network is required"))]
    #[schema(example = "base")]
    pub network: String,
    #[schema(value_type = String, example = "5.00")]
    pub amount: StrictDecimal,
    #[validate(length(min = 1, message = "destinationAddress is required"))]
    #[schema(example = "0x2222222222222222222222222222222222222222")]
    pub destination_address: String,
}

impl WithdrawRequest {
    pub fn into_command(self, user_id: UserId) -> Result<WithdrawCommand, ApiError> {
        Ok(WithdrawCommand {
            user_id,
            network: parse_network(&self.network)?,
            amount: self.amount.inner(),
            destination_address: self.destination_address,
        })
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionsParams {
    /// 1-based page number
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
    /// `withdrawal` or `deposit`
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    /// `pending`, `confirmed`, `failed` or `cancelled`
    pub status: Option<String>,
}

impl TransactionsParams {
    pub fn into_query(self) -> Result<TransactionQuery, ApiError> {
        Ok(TransactionQuery {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(TransactionQuery::DEFAULT_LIMIT),
            tx_type: self
                .tx_type
                .as_deref()
                .map(str::parse::<TransactionType>)
                .transpose()
                .map_err(ApiError::bad_request)?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<TransactionStatus>)
                .transpose()
                .map_err(ApiError::bad_request)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccountRequest {
    #[validate(length(min = 1, message = "accountNumber is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "bankCode is required"))]
    pub bank_code: String,
}

/// Business payout request. Every field is optional on the wire so a
/// missing one is reported by name instead of as a JSON error.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestSettlementRequest {
    #[validate(
        required(message = "orderId is required"),
        length(min = 1, message = "orderId is required")
    )]
    pub order_id: Option<String>,
    #[validate(
        required(message = "customerWallet is required"),
        length(min = 1, message = "customerWallet is required")
    )]
    pub customer_wallet: Option<String>,
    #[validate(required(message = "amount is required"))]
    #[schema(value_type = Option<String>, example = "25.00")]
    pub amount: Option<StrictDecimal>,
    #[validate(
        required(message = "token is required"),
        length(min = 1, message = "token is required")
    )]
    #[schema(example = "USDC")]
    pub token: Option<String>,
    #[validate(
        required(message = "network is required"),
        length(min = 1, message = "network is required")
    )]
    #[schema(example = "base")]
    pub network: Option<String>,
    pub business_id: Option<String>,
    pub customer_id: Option<String>,
}

impl RequestSettlementRequest {
    pub fn into_request(self) -> Result<SettlementRequest, ApiError> {
        let missing = |field: &str| ApiError::bad_request(format!("{} is required", field));
        Ok(SettlementRequest {
            order_id: self.order_id.ok_or_else(|| missing("orderId"))?,
            customer_wallet: self.customer_wallet.ok_or_else(|| missing("customerWallet"))?,
            amount: self.amount.ok_or_else(|| missing("amount"))?.inner(),
            token: self.token.ok_or_else(|| missing("token"))?,
            network: parse_network(&self.network.ok_or_else(|| missing("network"))?)?,
            business_id: self.business_id,
            customer_id: self.customer_id,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementWebhookRequest {
    #[validate(
        required(message = "settlementId is required"),
        length(min = 1, message = "settlementId is required")
    )]
    pub settlement_id: Option<String>,
    /// `initiated`, `processing`, `completed` or `failed`
    #[validate(required(message = "status is required"))]
    pub status: Option<String>,
    pub transaction_hash: Option<String>,
    pub confirmations: Option<u64>,
    pub block_number: Option<u64>,
    pub failure_reason: Option<String>,
}

impl SettlementWebhookRequest {
    pub fn into_update(self) -> Result<(String, SettlementUpdate), ApiError> {
        let settlement_id = self
            .settlement_id
            .ok_or_else(|| ApiError::bad_request("settlementId is required"))?;
        let status = self
            .status
            .ok_or_else(|| ApiError::bad_request("status is required"))?
            .parse::<SettlementStatus>()
            .map_err(ApiError::bad_request)?;
        Ok((
            settlement_id,
            SettlementUpdate {
                status,
                transaction_hash: self.transaction_hash.filter(|h| !h.trim().is_empty()),
                confirmations: self.confirmations,
                block_number: self.block_number,
                failure_reason: self.failure_reason,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_missing_token_fails_validation() {
        let req: RequestSettlementRequest = serde_json::from_str(
            r#"{"orderId":"o1","customerWallet":"0xabc","amount":"5","network":"base"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("token"));
    }

    #[test]
    fn test_settlement_request_converts() {
        let req: RequestSettlementRequest = serde_json::from_str(
            r#"{"orderId":"o1","customerWallet":"0xabc","amount":25,"token":"USDC","network":"Solana"}"#,
        )
        .unwrap();
        req.validate().unwrap();
        let request = req.into_request().unwrap();
        assert_eq!(request.network, Network::Solana);
        assert_eq!(request.amount, Decimal::from(25));
    }

    #[test]
    fn test_unknown_network_rejected() {
        let req: WithdrawRequest = serde_json::from_str(
            r#"{"network":"ethereum","amount":"1","destinationAddress":"0x2"}"#,
        )
        .unwrap();
        let err = req.into_command(1).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transactions_params() {
        let params: TransactionsParams =
            serde_json::from_str(r#"{"page":2,"type":"withdrawal","status":"failed"}"#).unwrap();
        params.validate().unwrap();
        let query = params.into_query().unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, TransactionQuery::DEFAULT_LIMIT);
        assert_eq!(query.tx_type, Some(TransactionType::Withdrawal));
        assert_eq!(query.status, Some(TransactionStatus::Failed));

        let too_many: TransactionsParams = serde_json::from_str(r#"{"limit":101}"#).unwrap();
        assert!(too_many.validate().is_err());
        let zero_page: TransactionsParams = serde_json::from_str(r#"{"page":0}"#).unwrap();
        assert!(zero_page.validate().is_err());
    }

    #[test]
    fn test_webhook_status_parsed() {
        let req: SettlementWebhookRequest = serde_json::from_str(
            r#"{"settlementId":"STL-1-00","status":"completed","confirmations":3}"#,
        )
        .unwrap();
        let (id, update) = req.into_update().unwrap();
        assert_eq!(id, "STL-1-00");
        assert_eq!(update.status, SettlementStatus::Completed);
        assert_eq!(update.confirmations, Some(3));

        let bad: SettlementWebhookRequest =
            serde_json::from_str(r#"{"settlementId":"STL-1-00","status":"settled"}"#).unwrap();
        assert!(bad.into_update().is_err());
    }
}
