//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
    /// Build revision
    #[schema(example = "a1b2c3d")]
    pub version: &'static str,
    /// `postgres` or `memory`
    #[schema(example = "postgres")]
    pub store: &'static str,
}

/// Health check endpoint
///
/// The store ping is rate limited; between pings the last result is reused.
/// Internal details are never exposed in the response.
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms, version, store}}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    static LAST_CHECK_MS: AtomicU64 = AtomicU64::new(0);
    static LAST_HEALTHY: AtomicBool = AtomicBool::new(true);
    const CHECK_INTERVAL_MS: u64 = 5000;

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let (store, healthy) = match state.db {
        Some(ref db) => {
            let last_check = LAST_CHECK_MS.load(Ordering::Relaxed);
            let healthy = if now_ms.saturating_sub(last_check) > CHECK_INTERVAL_MS {
                LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
                let ok = match db.health_check().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
                        false
                    }
                };
                LAST_HEALTHY.store(ok, Ordering::Relaxed);
                ok
            } else {
                LAST_HEALTHY.load(Ordering::Relaxed)
            };
            ("postgres", healthy)
        }
        None => ("memory", true),
    };

    if healthy {
        (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now_ms,
                version: env!("GIT_HASH"),
                store,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: error_codes::SERVICE_UNAVAILABLE,
                msg: "unavailable".to_string(),
                data: None,
            }),
        )
    }
}
