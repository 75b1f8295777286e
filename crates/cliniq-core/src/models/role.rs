//! Role tags for authenticatable principals.

use serde::{Deserialize, Serialize};

/// Claims-level role tag carried in session tokens and consulted by the
/// permission matrix.
///
/// `HeadNurse` is a nurse with elevated duties inside her clinic; the
/// elevation never crosses the tenant boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Clinic,
    Doctor,
    Nurse,
    HeadNurse,
    Pharmacist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Clinic => "clinic",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::HeadNurse => "head_nurse",
            Role::Pharmacist => "pharmacist",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "clinic" => Some(Role::Clinic),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "head_nurse" => Some(Role::HeadNurse),
            "pharmacist" => Some(Role::Pharmacist),
            _ => None,
        }
    }

    /// The staff table behind this role, if any. `Clinic` principals
    /// live in their own table and anchor the tenant.
    pub fn staff_role(&self) -> Option<StaffRole> {
        match self {
            Role::Clinic => None,
            Role::Doctor => Some(StaffRole::Doctor),
            Role::Nurse | Role::HeadNurse => Some(StaffRole::Nurse),
            Role::Pharmacist => Some(StaffRole::Pharmacist),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-level staff role: selects the table a staff record lives in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Nurse,
    Pharmacist,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Doctor => "doctor",
            StaffRole::Nurse => "nurse",
            StaffRole::Pharmacist => "pharmacist",
        }
    }

    pub fn parse(s: &str) -> Option<StaffRole> {
        match s {
            "doctor" => Some(StaffRole::Doctor),
            "nurse" => Some(StaffRole::Nurse),
            "pharmacist" => Some(StaffRole::Pharmacist),
            _ => None,
        }
    }

    /// Name of the backing table.
    pub fn table(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
