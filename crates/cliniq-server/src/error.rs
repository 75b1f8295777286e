//! HTTP error mapping.
//!
//! One `IntoResponse` impl maps the whole error taxonomy to statuses
//! and bodies. Internal causes are logged server-side and never leak
//! into a response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use cliniq_core::error::CliniqError;

pub struct ApiError(pub CliniqError);

impl From<CliniqError> for ApiError {
    fn from(err: CliniqError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            CliniqError::Validation { message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message }),
            ),
            CliniqError::AuthenticationFailed { reason } => {
                (StatusCode::UNAUTHORIZED, json!({ "error": reason }))
            }
            CliniqError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                json!({ "code": "TOKEN_EXPIRED" }),
            ),
            CliniqError::TokenMalformed => (
                StatusCode::UNAUTHORIZED,
                json!({ "code": "TOKEN_MALFORMED" }),
            ),
            CliniqError::AuthorizationDenied { .. } | CliniqError::TenantUnresolved => {
                (StatusCode::FORBIDDEN, json!({ "error": "Access denied" }))
            }
            CliniqError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, json!({ "error": "Not found" }))
            }
            CliniqError::AlreadyExists { .. } => (
                StatusCode::CONFLICT,
                json!({ "error": "Resource already exists" }),
            ),
            CliniqError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Too many requests" }),
            ),
            CliniqError::UnscopedQuery
            | CliniqError::Database(_)
            | CliniqError::Crypto(_)
            | CliniqError::Internal(_) => {
                tracing::error!(error = %self.0, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal server error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
