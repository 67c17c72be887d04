//! Withdrawal handler (JWT)

use std::sync::Arc;

use axum::{Extension, extract::State};

use super::super::middleware::AuthenticatedUser;
use super::super::state::AppState;
use super::super::types::dto::WithdrawRequest;
use super::super::types::{ApiResult, ValidatedJson, ok};
use crate::withdrawal::WithdrawalReceipt;

/// Withdraw from the caller's position to an external address
///
/// Synchronous: the response carries the executor receipt, or `pending` when
/// the outcome is not known yet.
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal confirmed or pending", content_type = "application/json"),
        (status = 400, description = "Invalid request or insufficient balance"),
        (status = 404, description = "No active position"),
        (status = 500, description = "Transfer failed or executor misconfigured")
    ),
    security(("bearer_jwt" = [])),
    tag = "Withdrawal"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<WithdrawRequest>,
) -> ApiResult<WithdrawalReceipt> {
    let command = req.into_command(user.user_id)?;
    ok(state.withdrawals.withdraw(command).await?)
}
