//! Authentication error types.
//!
//! Variants carry the real failure cause for logging; the conversion
//! into [`CliniqError`] collapses everything client-facing into the
//! constant, non-informative messages the HTTP surface returns.

use cliniq_core::error::CliniqError;
use thiserror::Error;

/// Client-facing message for any credential failure.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Client-facing message shared by "no pending code" and "wrong code"
/// so responses cannot be used for email enumeration.
pub const INVALID_OTP: &str = "Invalid OTP code";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    /// The stored hash could not be parsed. Audit-worthy; surfaced to
    /// clients as a generic authentication failure.
    #[error("stored credential hash is corrupt")]
    CorruptHash,

    #[error("no pending OTP or wrong code")]
    InvalidOtp,

    #[error("OTP code has expired")]
    OtpExpired,

    #[error("too many OTP attempts")]
    OtpTooManyAttempts,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is malformed")]
    TokenMalformed,

    #[error("token outside its refresh window")]
    RefreshDenied,

    #[error("password policy: {0}")]
    WeakPassword(String),

    #[error("developer login is disabled")]
    DevLoginDisabled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CliniqError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::CorruptHash
            | AuthError::DevLoginDisabled
            | AuthError::RefreshDenied => CliniqError::AuthenticationFailed {
                reason: INVALID_CREDENTIALS.into(),
            },
            AuthError::InvalidOtp => CliniqError::AuthenticationFailed {
                reason: INVALID_OTP.into(),
            },
            AuthError::OtpExpired => CliniqError::AuthenticationFailed {
                reason: "OTP code has expired".into(),
            },
            AuthError::OtpTooManyAttempts => CliniqError::AuthenticationFailed {
                reason: "Too many attempts".into(),
            },
            AuthError::TokenExpired => CliniqError::TokenExpired,
            AuthError::TokenMalformed => CliniqError::TokenMalformed,
            AuthError::WeakPassword(message) => CliniqError::Validation { message },
            AuthError::Crypto(msg) => CliniqError::Crypto(msg),
        }
    }
}
