//! Community feed post — the tenant-bound resource class that the
//! access guard and resource router are exercised against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    /// Owning tenant. Set by the access guard, never by clients.
    pub clinic_id: Uuid,
    pub author_id: Uuid,
    pub author_role: Role,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub body: Option<String>,
}
