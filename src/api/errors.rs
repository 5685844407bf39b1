//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.
//! Core errors keep their machine-checkable kind as the response code.

use crate::errors::{EconomicError, ProtocolError, SlotError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (an error kind such as STALE_PRICE, or NOT_FOUND / BAD_REQUEST)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub request_id: String,
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND".to_string(),
            message,
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST".to_string(),
            message,
            request_id,
        }
    }

    pub fn internal_error(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message,
            request_id,
        }
    }

    /// Map a core error to its HTTP status, keeping the error kind as code
    pub fn from_slot(request_id: String, err: SlotError) -> Self {
        let status = match err {
            SlotError::Input(_) => StatusCode::BAD_REQUEST,
            SlotError::Economic(EconomicError::Overflow(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            SlotError::Economic(EconomicError::InsufficientPool { .. })
            | SlotError::Economic(EconomicError::InsufficientBankroll { .. }) => StatusCode::CONFLICT,
            SlotError::Economic(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SlotError::Oracle(_) => StatusCode::SERVICE_UNAVAILABLE,
            SlotError::Protocol(ProtocolError::UnknownRequest(_)) => StatusCode::NOT_FOUND,
            SlotError::Protocol(ProtocolError::RandomnessUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            SlotError::Protocol(_) => StatusCode::CONFLICT,
            SlotError::Storage(_) | SlotError::Table(_) | SlotError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            code: err.kind().as_str().to_string(),
            message: err.to_string(),
            request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.request_id, self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(request_id = %self.request_id, code = %self.code, message = %self.message, "Request failed");
        }

        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        });

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::AssetId;
    use crate::errors::{InputError, OracleError};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(SlotError, StatusCode, &str)> = vec![
            (InputError::InvalidReelCount(9).into(), StatusCode::BAD_REQUEST, "INVALID_REEL_COUNT"),
            (
                EconomicError::CostAboveLimit { cost: 2, limit: 1 }.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "COST_ABOVE_LIMIT",
            ),
            (
                OracleError::StalePrice { asset: AssetId::Base, age_secs: 2, max_secs: 1 }.into(),
                StatusCode::SERVICE_UNAVAILABLE,
                "STALE_PRICE",
            ),
            (ProtocolError::UnknownRequest(4).into(), StatusCode::NOT_FOUND, "UNKNOWN_REQUEST"),
            (ProtocolError::AlreadyFulfilled(4).into(), StatusCode::CONFLICT, "ALREADY_FULFILLED"),
            (
                InputError::InvalidRandomWord("odd length".to_string()).into(),
                StatusCode::BAD_REQUEST,
                "INVALID_RANDOM_WORD",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from_slot("req-1".to_string(), err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }
}
