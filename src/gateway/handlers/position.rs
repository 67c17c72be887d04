//! Liquidity position handlers (JWT)

use std::sync::Arc;

use axum::{Extension, extract::State};

use super::super::middleware::AuthenticatedUser;
use super::super::state::AppState;
use super::super::types::dto::{CreatePositionRequest, TransactionsParams, UpdateBankAccountRequest};
use super::super::types::{ApiResult, ValidatedJson, ValidatedQuery, created, ok};
use crate::position::{PositionView, WalletsView};
use crate::transaction::TransactionPage;

/// Create the caller's liquidity position
///
/// POST /api/v1/liquidity/create
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/create",
    request_body = CreatePositionRequest,
    responses(
        (status = 201, description = "Position created", content_type = "application/json"),
        (status = 400, description = "Invalid bank details or position already exists"),
        (status = 401, description = "Authentication failed")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn create_position(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<CreatePositionRequest>,
) -> ApiResult<PositionView> {
    let command = req.into_command()?;
    let view = state.positions.create_position(user.user_id, command).await?;
    created(view)
}

/// Fetch the caller's position with refreshed balances
#[utoipa::path(
    get,
    path = "/api/v1/liquidity/position",
    responses(
        (status = 200, description = "Position; `balancesStale` is set when the refresh failed", content_type = "application/json"),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "No active position")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn get_position(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<PositionView> {
    ok(state.positions.get_position(user.user_id).await?)
}

/// Funding addresses and balances per network
#[utoipa::path(
    get,
    path = "/api/v1/liquidity/wallets",
    responses(
        (status = 200, description = "Wallet addresses and balances", content_type = "application/json"),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "No active position")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn get_wallets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<WalletsView> {
    ok(state.positions.get_wallets(user.user_id).await?)
}

/// Replace the payout bank account
#[utoipa::path(
    put,
    path = "/api/v1/liquidity/bank-account",
    request_body = UpdateBankAccountRequest,
    responses(
        (status = 200, description = "Bank account updated", content_type = "application/json"),
        (status = 400, description = "Invalid bank details"),
        (status = 404, description = "No active position")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn update_bank_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<UpdateBankAccountRequest>,
) -> ApiResult<PositionView> {
    ok(state
        .positions
        .update_bank_account(user.user_id, req.into())
        .await?)
}

/// Force a balance refresh from the wallet provider
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/refresh-balances",
    responses(
        (status = 200, description = "Balances refreshed", content_type = "application/json"),
        (status = 404, description = "No active position"),
        (status = 500, description = "Wallet provider unavailable")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn refresh_balances(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<PositionView> {
    ok(state.positions.refresh_balances(user.user_id).await?)
}

/// Paginated transaction history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/liquidity/transactions",
    params(TransactionsParams),
    responses(
        (status = 200, description = "Transaction page", content_type = "application/json"),
        (status = 400, description = "Invalid paging or filter")
    ),
    security(("bearer_jwt" = [])),
    tag = "Position"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedQuery(params): ValidatedQuery<TransactionsParams>,
) -> ApiResult<TransactionPage> {
    let query = params.into_query()?;
    ok(state
        .positions
        .list_transactions(user.user_id, &query)
        .await?)
}
