//! Gateway error type
//!
//! Every domain error is mapped once into [`ApiError`], which renders the
//! standard `{code, msg, data}` envelope with the matching HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use super::response::{ApiResponse, error_codes};
use crate::banking::BankError;
use crate::position::PositionError;
use crate::settlement::SettlementError;
use crate::withdrawal::WithdrawalError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
    pub data: Option<Value>,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    fn status_of(http_status: u16) -> StatusCode {
        StatusCode::from_u16(http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn status_logged(
        http_status: u16,
        kind: &'static str,
        error: &impl std::fmt::Display,
    ) -> StatusCode {
        let status = Self::status_of(http_status);
        if status.is_server_error() {
            tracing::error!(kind, error = %error, "Request failed");
        }
        status
    }

    /// Store failures are logged here and reported without internals
    fn store_failure(error: &impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "Store operation failed");
        Self::internal("Internal storage error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<WithdrawalError> for ApiError {
    fn from(e: WithdrawalError) -> Self {
        let (code, data) = match &e {
            WithdrawalError::Store(store) => return Self::store_failure(store),
            WithdrawalError::Validation(_) => (error_codes::INVALID_PARAMETER, None),
            WithdrawalError::NotFound => (error_codes::POSITION_NOT_FOUND, None),
            WithdrawalError::InsufficientFunds {
                available,
                requested,
            } => (
                error_codes::INSUFFICIENT_BALANCE,
                Some(json!({ "available": available, "requested": requested })),
            ),
            WithdrawalError::ExecutorMisconfigured => (error_codes::EXECUTOR_MISCONFIGURED, None),
            WithdrawalError::UpstreamUnavailable(_) => (error_codes::UPSTREAM_UNAVAILABLE, None),
            WithdrawalError::TransferFailed { transaction_id, .. } => (
                error_codes::TRANSFER_FAILED,
                Some(json!({ "transactionId": transaction_id, "status": "failed" })),
            ),
        };
        let status = Self::status_logged(e.http_status(), e.code(), &e);
        let mut err = Self::new(status, code, e.to_string());
        err.data = data;
        err
    }
}

impl From<PositionError> for ApiError {
    fn from(e: PositionError) -> Self {
        let code = match &e {
            PositionError::AlreadyExists => error_codes::ALREADY_EXISTS,
            PositionError::NotFound => error_codes::POSITION_NOT_FOUND,
            PositionError::Validation(_) => error_codes::INVALID_PARAMETER,
            PositionError::UpstreamUnavailable(_) => error_codes::UPSTREAM_UNAVAILABLE,
            PositionError::Store(store) => return Self::store_failure(store),
        };
        let status = Self::status_logged(e.http_status(), e.code(), &e);
        Self::new(status, code, e.to_string())
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        let code = match &e {
            SettlementError::Validation(_) => error_codes::INVALID_PARAMETER,
            SettlementError::NotFound(_) => error_codes::SETTLEMENT_NOT_FOUND,
            SettlementError::ExecutorMisconfigured => error_codes::EXECUTOR_MISCONFIGURED,
            SettlementError::Unauthorized => error_codes::AUTH_FAILED,
            SettlementError::Store(store) => return Self::store_failure(store),
        };
        let status = Self::status_logged(e.http_status(), e.code(), &e);
        Self::new(status, code, e.to_string())
    }
}

impl From<BankError> for ApiError {
    fn from(e: BankError) -> Self {
        match e {
            BankError::Unavailable(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::UPSTREAM_UNAVAILABLE,
                e.to_string(),
            ),
            other => Self::bad_request(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TransactionId;
    use crate::db::StoreError;
    use rust_decimal::Decimal;

    #[test]
    fn test_insufficient_funds_carries_amounts() {
        let err = ApiError::from(WithdrawalError::InsufficientFunds {
            available: Decimal::from(10),
            requested: Decimal::from(15),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);
        let data = err.data.unwrap();
        assert_eq!(data["available"], "10");
        assert_eq!(data["requested"], "15");
    }

    #[test]
    fn test_transfer_failed_carries_transaction() {
        let id = TransactionId::new();
        let err = ApiError::from(WithdrawalError::TransferFailed {
            transaction_id: id,
            reason: "rejected".into(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, error_codes::TRANSFER_FAILED);
        let data = err.data.unwrap();
        assert_eq!(data["transactionId"], id.to_string());
        assert_eq!(data["status"], "failed");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(PositionError::AlreadyExists).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PositionError::NotFound).code,
            error_codes::POSITION_NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SettlementError::NotFound("STL-1".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SettlementError::Unauthorized).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(BankError::InvalidAccountNumber).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_store_errors_are_not_leaked() {
        let err = ApiError::from(WithdrawalError::Store(StoreError::Database(
            "password authentication failed for user postgres".into(),
        )));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.msg.contains("postgres"));
    }
}
