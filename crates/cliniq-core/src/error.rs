//! Error types for the CLINIQ system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliniqError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is malformed")]
    TokenMalformed,

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Tenant context missing or invalid")]
    TenantUnresolved,

    /// A tenant-bound query reached storage dispatch without a clinic
    /// predicate. Always a programming error, never a user error.
    #[error("Query dispatched without a clinic predicate")]
    UnscopedQuery,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CliniqResult<T> = Result<T, CliniqError>;
