//! `/auth/*` handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use cliniq_auth::gateway::{LoginInput, LoginOutput, OtpLoginInput, RegisterClinicInput, ResetPasswordInput};
use cliniq_auth::mailer::OtpMailer;
use cliniq_core::error::CliniqError;
use cliniq_core::models::principal::PrincipalSummary;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthClaims;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ResetRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Principal data in login and introspection responses.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub role: String,
    pub cid: String,
    pub name: String,
    pub email: String,
}

impl From<PrincipalSummary> for UserView {
    fn from(p: PrincipalSummary) -> Self {
        UserView {
            id: p.id.to_string(),
            role: p.role.as_str().to_string(),
            cid: p.clinic_id.to_string(),
            name: p.name,
            email: p.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

impl From<LoginOutput> for LoginResponse {
    fn from(out: LoginOutput) -> Self {
        LoginResponse {
            token: out.token,
            user: out.principal.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn register<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    // Staff accounts are provisioned by their clinic, never
    // self-registered.
    if body.role != "clinic" {
        return Err(ApiError(CliniqError::Validation {
            message: "only clinics may self-register".into(),
        }));
    }

    let clinic = state
        .gateway
        .register_clinic(RegisterClinicInput {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            address: body.address,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": clinic.id.to_string(),
            "name": clinic.name,
            "email": clinic.email,
        })),
    ))
}

pub async fn login<M: OtpMailer>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let out = state
        .gateway
        .login(LoginInput {
            email: body.email,
            password: body.password,
            client_ip: None,
            user_agent: user_agent(&headers),
        })
        .await?;
    Ok(Json(out.into()))
}

pub async fn login_step1<M: OtpMailer>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    state
        .gateway
        .login_step1(LoginInput {
            email: body.email,
            password: body.password,
            client_ip: None,
            user_agent: user_agent(&headers),
        })
        .await?;
    Ok(Json(json!({ "otpSent": true })))
}

pub async fn login_step2<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<OtpRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let out = state
        .gateway
        .login_step2(OtpLoginInput {
            email: body.email,
            code: body.otp,
        })
        .await?;
    Ok(Json(out.into()))
}

pub async fn dev_login<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let out = state
        .gateway
        .dev_login(LoginInput {
            email: body.email,
            password: body.password,
            client_ip: None,
            user_agent: None,
        })
        .await?;
    Ok(Json(out.into()))
}

/// Always answers 200 so responses cannot confirm whether an address
/// is registered.
pub async fn request_otp<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<EmailRequest>,
) -> ApiResult<Json<Value>> {
    state.gateway.request_otp(&body.email).await?;
    Ok(Json(json!({ "otpSent": true })))
}

/// Same non-committal answer as `request_otp`.
pub async fn forgot_password<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<EmailRequest>,
) -> ApiResult<Json<Value>> {
    state.gateway.forgot_password(&body.email).await?;
    Ok(Json(json!({ "otpSent": true })))
}

pub async fn reset_password<M: OtpMailer>(
    State(state): State<AppState<M>>,
    Json(body): Json<ResetRequest>,
) -> ApiResult<Json<Value>> {
    state
        .gateway
        .reset_password(ResetPasswordInput {
            email: body.email,
            code: body.otp,
            new_password: body.new_password,
        })
        .await
        // On this endpoint an OTP failure is a 400, not a 401: the
        // caller is not holding a session, they are filling a form.
        .map_err(|e| match e {
            CliniqError::AuthenticationFailed { reason } => {
                ApiError(CliniqError::Validation { message: reason })
            }
            other => ApiError(other),
        })?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn refresh<M: OtpMailer>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    let refreshed = state
        .gateway
        .tokens()
        .refresh(token)
        .map_err(CliniqError::from)?;
    Ok(Json(json!({ "token": refreshed })))
}

pub async fn logout<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
) -> ApiResult<Json<Value>> {
    state.gateway.logout(&claims);
    Ok(Json(json!({ "ok": true })))
}

pub async fn me<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
) -> ApiResult<Json<UserView>> {
    let summary = state.gateway.whoami(&claims).await?;
    Ok(Json(summary.into()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError(CliniqError::TokenMalformed))
}
