//! Business settlement handlers (public)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
};

use super::super::state::AppState;
use super::super::types::dto::{RequestSettlementRequest, SettlementWebhookRequest};
use super::super::types::{ApiResult, ValidatedJson, ok};
use crate::settlement::{SettlementStatusView, SettlementTicket, WebhookAck};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Request a payout to a customer wallet
///
/// Returns as soon as the settlement is recorded; the transfer runs in the
/// background and is tracked through `settlement-status`.
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/request-settlement",
    request_body = RequestSettlementRequest,
    responses(
        (status = 200, description = "Settlement initiated", content_type = "application/json"),
        (status = 400, description = "Missing or invalid field"),
        (status = 500, description = "Executor misconfigured or storage failure")
    ),
    tag = "Settlement"
)]
pub async fn request_settlement(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RequestSettlementRequest>,
) -> ApiResult<SettlementTicket> {
    let request = req.into_request()?;
    ok(state.settlements.request_settlement(request).await?)
}

/// Poll a settlement
#[utoipa::path(
    get,
    path = "/api/v1/liquidity/settlement-status/{settlement_id}",
    params(("settlement_id" = String, Path, description = "Settlement id, e.g. STL-1703494800000-9f86d081884c7d65")),
    responses(
        (status = 200, description = "Current settlement state", content_type = "application/json"),
        (status = 400, description = "Empty settlement id"),
        (status = 404, description = "Unknown settlement")
    ),
    tag = "Settlement"
)]
pub async fn settlement_status(
    State(state): State<Arc<AppState>>,
    Path(settlement_id): Path<String>,
) -> ApiResult<SettlementStatusView> {
    ok(state.settlements.get_status(&settlement_id).await?)
}

/// Status update pushed by the transfer executor
///
/// Updates only move forward; duplicates and stale deliveries are
/// acknowledged with `applied = false`.
#[utoipa::path(
    post,
    path = "/api/v1/liquidity/settlement-webhook",
    request_body = SettlementWebhookRequest,
    params(("X-Webhook-Secret" = Option<String>, Header, description = "Required when a webhook secret is configured")),
    responses(
        (status = 200, description = "Update acknowledged", content_type = "application/json"),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "Webhook secret mismatch"),
        (status = 404, description = "Unknown settlement")
    ),
    tag = "Settlement"
)]
pub async fn settlement_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<SettlementWebhookRequest>,
) -> ApiResult<WebhookAck> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    state.settlements.verify_webhook_secret(provided)?;

    let (settlement_id, update) = req.into_update()?;
    ok(state
        .settlements
        .handle_webhook(&settlement_id, update)
        .await?)
}
