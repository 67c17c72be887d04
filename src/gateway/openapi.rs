//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::dto::{
    CreatePositionRequest, RequestSettlementRequest, SettlementWebhookRequest,
    UpdateBankAccountRequest, VerifyAccountRequest, WithdrawRequest,
};

/// Bearer JWT issued by the identity service
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some("HS256 token; `sub` is the numeric user id"))
                .build();
            components.add_security_scheme("bearer_jwt", SecurityScheme::Http(scheme));
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Liquidity Settlement API",
        version = "1.0.0",
        description = "Liquidity positions, withdrawals and business settlements over Base and Solana.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        // Positions (JWT)
        crate::gateway::handlers::position::create_position,
        crate::gateway::handlers::position::get_position,
        crate::gateway::handlers::position::get_wallets,
        crate::gateway::handlers::position::update_bank_account,
        crate::gateway::handlers::position::refresh_balances,
        crate::gateway::handlers::position::list_transactions,
        crate::gateway::handlers::withdraw::withdraw,
        // Public
        crate::gateway::handlers::banking::list_banks,
        crate::gateway::handlers::banking::verify_account,
        crate::gateway::handlers::settlement::request_settlement,
        crate::gateway::handlers::settlement::settlement_status,
        crate::gateway::handlers::settlement::settlement_webhook,
    ),
    components(
        schemas(
            HealthResponse,
            CreatePositionRequest,
            UpdateBankAccountRequest,
            WithdrawRequest,
            VerifyAccountRequest,
            RequestSettlementRequest,
            SettlementWebhookRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Position", description = "Liquidity position management (JWT required)"),
        (name = "Withdrawal", description = "Withdrawals to external addresses (JWT required)"),
        (name = "Banking", description = "Supported banks and account verification"),
        (name = "Settlement", description = "Business payouts and executor webhooks"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
