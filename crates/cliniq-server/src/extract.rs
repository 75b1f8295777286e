//! Bearer-token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use cliniq_auth::SessionClaims;
use cliniq_auth::mailer::OtpMailer;
use cliniq_core::error::CliniqError;

use crate::error::ApiError;
use crate::state::AppState;

/// Validated claims extracted from the `Authorization: Bearer` header.
///
/// Extraction only proves the token; handlers that touch tenant-bound
/// data still go through the access guard, which re-reads the
/// principal from the identity store.
pub struct AuthClaims(pub SessionClaims);

impl<M: OtpMailer + 'static> FromRequestParts<AppState<M>> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<M>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError(CliniqError::TokenMalformed))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError(CliniqError::TokenMalformed))?;

        let claims = state
            .gateway
            .tokens()
            .validate(token)
            .map_err(|e| ApiError(CliniqError::from(e)))?;

        Ok(AuthClaims(claims))
    }
}
