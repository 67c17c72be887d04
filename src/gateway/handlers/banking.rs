//! Bank directory handlers (public)

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;

use super::super::state::AppState;
use super::super::types::dto::VerifyAccountRequest;
use super::super::types::{ApiResult, ValidatedJson, ok};
use crate::banking::{Bank, BankError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAccount {
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
}

/// Supported banks
#[utoipa::path(
    get,
    path = "/api/v1/liquidity/banks",
    responses(
        (status = 200, description = "Bank list", content_type = "application/json"),
        (status = 500, description = "Bank provider unavailable")
    ),
    tag = "Banking"
)]
pub async fn list_banks(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Bank>> {
    ok(state.banks.list_banks().await?)
}

/// Validate a bank account and resolve the holder name
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/verify-account",
    request_body = VerifyAccountRequest,
    responses(
        (status = 200, description = "Account resolved", content_type = "application/json"),
        (status = 400, description = "Invalid account number, unknown bank or unresolvable account")
    ),
    tag = "Banking"
)]
pub async fn verify_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerifyAccountRequest>,
) -> ApiResult<VerifiedAccount> {
    let account_number = req.account_number.trim();
    let bank_code = req.bank_code.trim();

    if !state.banks.is_valid_account_number(account_number) {
        return Err(BankError::InvalidAccountNumber.into());
    }
    if !state.banks.is_valid_bank_code(bank_code).await? {
        return Err(BankError::UnknownBankCode(bank_code.to_string()).into());
    }

    let resolved = state.banks.resolve_account(account_number, bank_code).await?;
    ok(VerifiedAccount {
        account_number: resolved.account_number,
        account_name: resolved.account_name,
        bank_code: bank_code.to_string(),
    })
}
