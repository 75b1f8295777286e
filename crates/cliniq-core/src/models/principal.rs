//! Unified view over authenticatable identities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clinic::Clinic;
use super::role::Role;
use super::staff::Staff;

/// Any identity that can hold a session: a clinic or a staff member.
#[derive(Debug, Clone)]
pub enum Principal {
    Clinic(Clinic),
    Staff(Staff),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::Clinic(c) => c.id,
            Principal::Staff(s) => s.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Clinic(c) => &c.email,
            Principal::Staff(s) => &s.email,
        }
    }

    pub fn credential_hash(&self) -> &str {
        match self {
            Principal::Clinic(c) => &c.credential_hash,
            Principal::Staff(s) => &s.credential_hash,
        }
    }

    pub fn active(&self) -> bool {
        match self {
            Principal::Clinic(c) => c.active,
            Principal::Staff(s) => s.active,
        }
    }

    /// The tenant this principal belongs to. A clinic is its own tenant.
    pub fn clinic_id(&self) -> Uuid {
        match self {
            Principal::Clinic(c) => c.id,
            Principal::Staff(s) => s.clinic_id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Clinic(_) => Role::Clinic,
            Principal::Staff(s) => s.login_role(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Principal::Clinic(c) => &c.name,
            Principal::Staff(s) => &s.full_name,
        }
    }
}

/// The principal data safe to return to clients. Never carries the
/// credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalSummary {
    pub id: Uuid,
    pub role: Role,
    pub clinic_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Principal> for PrincipalSummary {
    fn from(p: &Principal) -> Self {
        PrincipalSummary {
            id: p.id(),
            role: p.role(),
            clinic_id: p.clinic_id(),
            name: p.display_name().to_string(),
            email: p.email().to_string(),
        }
    }
}
