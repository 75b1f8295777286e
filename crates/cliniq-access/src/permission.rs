//! Role-permission matrix for tenant-bound resource classes.
//!
//! Adding a role or a resource class means extending the match below —
//! the compiler then walks every caller. No role is ever compared as a
//! string.

use cliniq_core::models::role::Role;
use cliniq_core::scope::ResourceClass;

/// Operation verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matrix lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Allowed, but restricted to rows the doctor authored; the guard
    /// ANDs an owner predicate onto the clinic predicate.
    AllowOwn,
    Deny,
}

/// The role-permission matrix.
///
/// | role       | patients | appts    | prescriptions | inventory | posts | staff | invoices |
/// |------------|----------|----------|---------------|-----------|-------|-------|----------|
/// | clinic     | CRUD     | CRUD     | R             | R         | CRUD  | CRUD  | CRUD     |
/// | doctor     | RU       | CRUD own | CRUD own      | R         | CR    | —     | R        |
/// | nurse      | RU       | R        | R             | —         | CR    | —     | —        |
/// | head nurse | RU       | R        | R             | —         | CR    | —     | —        |
/// | pharmacist | R        | R        | RU            | CRUD      | —     | —     | —        |
pub fn permitted(role: Role, class: ResourceClass, verb: Verb) -> Decision {
    use Decision::*;
    use ResourceClass::*;
    use Verb::*;

    match (role, class) {
        (Role::Clinic, Prescriptions | Inventory) => read_only(verb),
        (Role::Clinic, _) => Allow,

        (Role::Doctor, Patients) => read_update(verb),
        (Role::Doctor, Appointments | Prescriptions) => AllowOwn,
        (Role::Doctor, Inventory | Invoices) => read_only(verb),
        (Role::Doctor, Posts) => create_read(verb),
        (Role::Doctor, Staff) => Deny,

        (Role::Nurse | Role::HeadNurse, Patients) => read_update(verb),
        (Role::Nurse | Role::HeadNurse, Appointments | Prescriptions) => read_only(verb),
        (Role::Nurse | Role::HeadNurse, Posts) => create_read(verb),
        (Role::Nurse | Role::HeadNurse, Inventory | Staff | Invoices) => Deny,

        (Role::Pharmacist, Patients | Appointments) => read_only(verb),
        // Dispensing updates the prescription record.
        (Role::Pharmacist, Prescriptions) => read_update(verb),
        (Role::Pharmacist, Inventory) => Allow,
        (Role::Pharmacist, Posts | Staff | Invoices) => Deny,
    }
}

fn read_only(verb: Verb) -> Decision {
    match verb {
        Verb::Read => Decision::Allow,
        _ => Decision::Deny,
    }
}

fn read_update(verb: Verb) -> Decision {
    match verb {
        Verb::Read | Verb::Update => Decision::Allow,
        _ => Decision::Deny,
    }
}

fn create_read(verb: Verb) -> Decision {
    match verb {
        Verb::Create | Verb::Read => Decision::Allow,
        _ => Decision::Deny,
    }
}
