//! Staff domain models — doctors, nurses, and pharmacists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::{Role, StaffRole};

/// Nurse shift rotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum Shift {
    Day,
    Night,
    Evening,
    Rotating,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "Day",
            Shift::Night => "Night",
            Shift::Evening => "Evening",
            Shift::Rotating => "Rotating",
        }
    }

    pub fn parse(s: &str) -> Option<Shift> {
        match s {
            "Day" => Some(Shift::Day),
            "Night" => Some(Shift::Night),
            "Evening" => Some(Shift::Evening),
            "Rotating" => Some(Shift::Rotating),
            _ => None,
        }
    }
}

/// Role-specific attributes of a staff record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum StaffDetail {
    Doctor {
        specialty: String,
    },
    Nurse {
        departments: Vec<String>,
        shift: Shift,
        /// Head nurses authenticate with the `head_nurse` role tag.
        head: bool,
    },
    Pharmacist {
        specialization: String,
    },
}

impl StaffDetail {
    pub fn role(&self) -> StaffRole {
        match self {
            StaffDetail::Doctor { .. } => StaffRole::Doctor,
            StaffDetail::Nurse { .. } => StaffRole::Nurse,
            StaffDetail::Pharmacist { .. } => StaffRole::Pharmacist,
        }
    }
}

/// An authenticatable staff member, always bound to a clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    /// The owning clinic. Never null; deactivation keeps the binding.
    pub clinic_id: Uuid,
    pub full_name: String,
    /// Unique hospital identifier, uppercased, unique within the role.
    pub uhid: String,
    /// Lowercased, unique within the role.
    pub email: String,
    pub credential_hash: String,
    pub role: StaffRole,
    pub active: bool,
    pub profile_image: Option<String>,
    pub detail: StaffDetail,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// The role tag minted into this member's session tokens. Head
    /// nurses get the elevated tag; everyone else maps directly.
    pub fn login_role(&self) -> Role {
        match &self.detail {
            StaffDetail::Doctor { .. } => Role::Doctor,
            StaffDetail::Nurse { head: true, .. } => Role::HeadNurse,
            StaffDetail::Nurse { .. } => Role::Nurse,
            StaffDetail::Pharmacist { .. } => Role::Pharmacist,
        }
    }
}

/// Fields required to create a staff member. The target table follows
/// from `detail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaff {
    pub clinic_id: Uuid,
    pub full_name: String,
    pub uhid: String,
    pub email: String,
    pub credential_hash: String,
    pub profile_image: Option<String>,
    pub detail: StaffDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_flag_elevates_the_login_role() {
        let detail = StaffDetail::Nurse {
            departments: vec!["icu".into()],
            shift: Shift::Night,
            head: true,
        };
        assert_eq!(detail.role(), StaffRole::Nurse);

        let staff = Staff {
            id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
            full_name: "N. Night".into(),
            uhid: "NUR001".into(),
            email: "n@example.test".into(),
            credential_hash: String::new(),
            role: StaffRole::Nurse,
            active: true,
            profile_image: None,
            detail,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(staff.login_role(), Role::HeadNurse);
    }
}
