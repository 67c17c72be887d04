pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Assemble the full HTTP surface
///
/// ```text
/// /api/v1/health                      public
/// /api/v1/liquidity/{user routes}     Bearer JWT
/// /api/v1/liquidity/{banks, verify-account, *settlement*}  public
/// /docs, /api-docs/openapi.json       Swagger UI
/// ```
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // User Routes - Protected by JWT
    // ==========================================================================
    let user_routes = Router::new()
        .route("/create", post(handlers::create_position))
        .route("/position", get(handlers::get_position))
        .route("/wallets", get(handlers::get_wallets))
        .route("/bank-account", put(handlers::update_bank_account))
        .route("/withdraw", post(handlers::withdraw))
        .route("/transactions", get(handlers::list_transactions))
        .route("/refresh-balances", post(handlers::refresh_balances))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::jwt_auth_middleware,
        ));

    // ==========================================================================
    // Public Routes (no auth required)
    // ==========================================================================
    let public_routes = Router::new()
        .route("/banks", get(handlers::list_banks))
        .route("/verify-account", post(handlers::verify_account))
        .route("/request-settlement", post(handlers::request_settlement))
        .route(
            "/settlement-status/{settlement_id}",
            get(handlers::settlement_status),
        )
        .route("/settlement-webhook", post(handlers::settlement_webhook));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/liquidity", user_routes.merge(public_routes))
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            port
        );
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SettlementConfig, WithdrawalConfig};
    use crate::gateway::middleware::tests::issue_token;
    use crate::gateway::types::error_codes;
    use crate::ledger::ChainLedger;
    use crate::position::{MemoryPositionStore, PositionService};
    use crate::settlement::{MemorySettlementStore, SettlementOrchestrator};
    use crate::testing::{MockBankVerifier, MockExecutor, MockWalletProvider};
    use crate::transaction::MemoryTransactionStore;
    use crate::withdrawal::WithdrawalOrchestrator;
    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    const SECRET: &str = "gateway-test-secret";
    const USER: i64 = 3003;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        token: String,
        wallets: Arc<MockWalletProvider>,
    }

    impl TestServer {
        async fn start() -> Self {
            Self::start_with(SettlementConfig::default()).await
        }

        async fn start_with(settlement_config: SettlementConfig) -> Self {
            let positions = Arc::new(MemoryPositionStore::new());
            let transactions = Arc::new(MemoryTransactionStore::new());
            let wallets = Arc::new(MockWalletProvider::new());
            let banks = Arc::new(MockBankVerifier::new());
            let executor = Arc::new(MockExecutor::new());
            let ledger = Arc::new(ChainLedger::new(positions.clone(), wallets.clone()));

            let position_service = Arc::new(PositionService::new(
                positions.clone(),
                transactions.clone(),
                ledger.clone(),
                wallets.clone(),
                banks.clone(),
            ));
            let withdrawals = Arc::new(WithdrawalOrchestrator::new(
                positions,
                transactions,
                ledger,
                executor.clone(),
                WithdrawalConfig::default(),
            ));
            let settlements = Arc::new(SettlementOrchestrator::new(
                Arc::new(MemorySettlementStore::new()),
                executor,
                settlement_config,
            ));

            let state = Arc::new(AppState::new(
                position_service,
                withdrawals,
                settlements,
                banks,
                SECRET.to_string(),
            ));

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, build_router(state)).await.unwrap();
            });

            Self {
                base: format!("http://{}", addr),
                client: reqwest::Client::new(),
                token: issue_token(SECRET, &USER.to_string(), 3600),
                wallets,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
            let resp = req.send().await.unwrap();
            let status = resp.status();
            (status, resp.json().await.unwrap())
        }

        async fn authed_get(&self, path: &str) -> (StatusCode, Value) {
            self.send(self.client.get(self.url(path)).bearer_auth(&self.token))
                .await
        }

        async fn authed_post(&self, path: &str, body: Value) -> (StatusCode, Value) {
            self.send(
                self.client
                    .post(self.url(path))
                    .bearer_auth(&self.token)
                    .json(&body),
            )
            .await
        }

        async fn create_position(&self) {
            let (status, body) = self
                .authed_post(
                    "/api/v1/liquidity/create",
                    json!({"liquidityType": "offramp", "accountNumber": "0123456789", "bankCode": "058"}),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let server = TestServer::start().await;
        let (status, body) = server
            .send(server.client.get(server.url("/api/v1/health")))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["store"], "memory");
    }

    #[tokio::test]
    async fn test_user_routes_require_token() {
        let server = TestServer::start().await;

        let (status, body) = server
            .send(server.client.get(server.url("/api/v1/liquidity/position")))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], error_codes::MISSING_AUTH);

        let (status, body) = server
            .send(
                server
                    .client
                    .get(server.url("/api/v1/liquidity/position"))
                    .bearer_auth("not-a-jwt"),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], error_codes::AUTH_FAILED);
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let server = TestServer::start().await;
        server.create_position().await;

        let (status, body) = server.authed_get("/api/v1/liquidity/position").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["userId"], USER);
        assert_eq!(body["data"]["isVerified"], true);

        let (status, body) = server
            .authed_post(
                "/api/v1/liquidity/create",
                json!({"liquidityType": "offramp", "accountNumber": "0123456789", "bankCode": "058"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], error_codes::ALREADY_EXISTS);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_then_confirmed() {
        let server = TestServer::start().await;
        server.create_position().await;
        server
            .wallets
            .set_balances(USER, Decimal::from(10), Decimal::ZERO);

        let (status, body) = server
            .authed_post(
                "/api/v1/liquidity/withdraw",
                json!({"network": "base", "amount": "15", "destinationAddress": "0x2222222222222222222222222222222222222222"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], error_codes::INSUFFICIENT_BALANCE);
        assert_eq!(body["data"]["available"], "10");
        assert_eq!(body["data"]["requested"], "15");

        let (status, body) = server
            .authed_post(
                "/api/v1/liquidity/withdraw",
                json!({"network": "base", "amount": "5", "destinationAddress": "0x2222222222222222222222222222222222222222"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "confirmed");

        let (status, body) = server
            .authed_get("/api/v1/liquidity/transactions?type=withdrawal")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
    }

    #[tokio::test]
    async fn test_transactions_rejects_bad_limit() {
        let server = TestServer::start().await;
        let (status, body) = server
            .authed_get("/api/v1/liquidity/transactions?limit=500")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], error_codes::INVALID_PARAMETER);
    }

    #[tokio::test]
    async fn test_verify_account() {
        let server = TestServer::start().await;
        let (status, body) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/verify-account"))
                    .json(&json!({"accountNumber": "0123456789", "bankCode": "058"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["accountName"], "ADA OBI");

        let (status, _) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/verify-account"))
                    .json(&json!({"accountNumber": "12345", "bankCode": "058"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/verify-account"))
                    .json(&json!({"accountNumber": "0123456789", "bankCode": "999"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_settlement_missing_token_rejected() {
        let server = TestServer::start().await;
        let (status, body) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/request-settlement"))
                    .json(&json!({"orderId": "o-1", "customerWallet": "0xabc", "amount": "25", "network": "base"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "token is required");
    }

    #[tokio::test]
    async fn test_settlement_round_trip_over_http() {
        let server = TestServer::start().await;
        let (status, body) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/request-settlement"))
                    .json(&json!({"orderId": "o-1", "customerWallet": "0xabc", "amount": "25", "token": "usdc", "network": "base"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let id = body["data"]["settlementId"].as_str().unwrap().to_string();
        assert!(id.starts_with("STL-"));

        let (status, body) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/settlement-webhook"))
                    .json(&json!({"settlementId": id, "status": "completed", "transactionHash": "0xfeed"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (status, body) = server
            .send(server.client.get(server.url(&format!(
                "/api/v1/liquidity/settlement-status/{}",
                id
            ))))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (status, body) = server
            .send(
                server
                    .client
                    .get(server.url("/api/v1/liquidity/settlement-status/STL-0-unknown")),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], error_codes::SETTLEMENT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_secret_enforced() {
        let server = TestServer::start_with(SettlementConfig {
            webhook_secret: Some("hook".into()),
            ..SettlementConfig::default()
        })
        .await;

        let body = json!({"settlementId": "STL-0-unknown", "status": "completed"});
        let (status, resp) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/settlement-webhook"))
                    .json(&body),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp["code"], error_codes::AUTH_FAILED);

        let (status, _) = server
            .send(
                server
                    .client
                    .post(server.url("/api/v1/liquidity/settlement-webhook"))
                    .header("X-Webhook-Secret", "hook")
                    .json(&body),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
