//! Clinic domain model.
//!
//! A clinic is simultaneously an authenticatable principal and the
//! tenant anchor: every tenant-bound record carries its id. Clinics are
//! never destroyed, only deactivated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    /// Administrator email, lowercased, unique.
    pub email: String,
    /// Opaque credential hash. Plaintext never reaches the store.
    pub credential_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinic {
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}
