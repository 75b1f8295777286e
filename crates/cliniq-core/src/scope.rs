//! Tenant-scope types threaded from the access guard to storage.
//!
//! Every read against a tenant-bound table is described by a
//! [`QuerySpec`] whose clinic predicate is a typed slot, not a string.
//! Storage implementations call [`QuerySpec::clinic_id`] before
//! dispatching; an empty slot is rejected with
//! [`CliniqError::UnscopedQuery`] without ever reaching the database.

use uuid::Uuid;

use crate::error::{CliniqError, CliniqResult};

/// Resource classes subject to the role-permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Patients,
    Appointments,
    Prescriptions,
    Inventory,
    Posts,
    Staff,
    Invoices,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Patients => "patients",
            ResourceClass::Appointments => "appointments",
            ResourceClass::Prescriptions => "prescriptions",
            ResourceClass::Inventory => "inventory",
            ResourceClass::Posts => "posts",
            ResourceClass::Staff => "staff",
            ResourceClass::Invoices => "invoices",
        }
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filled clinic-predicate slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicScope(Uuid);

impl ClinicScope {
    pub fn new(clinic_id: Uuid) -> Self {
        ClinicScope(clinic_id)
    }

    pub fn clinic_id(&self) -> Uuid {
        self.0
    }
}

/// Read-side query specification for a tenant-bound resource class.
///
/// The access guard is the only production code path that builds scoped
/// specs; handlers receive them via a `Grant` and pass them through
/// untouched.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    class: ResourceClass,
    clinic: Option<ClinicScope>,
    owner_doctor: Option<Uuid>,
}

impl QuerySpec {
    pub fn scoped(class: ResourceClass, clinic: ClinicScope) -> Self {
        QuerySpec {
            class,
            clinic: Some(clinic),
            owner_doctor: None,
        }
    }

    /// A spec with an empty clinic slot. Exists so that the dispatch
    /// rejection is expressible and testable; storage refuses these.
    pub fn unscoped(class: ResourceClass) -> Self {
        QuerySpec {
            class,
            clinic: None,
            owner_doctor: None,
        }
    }

    /// Restrict further to rows authored by the given doctor. Composed
    /// with the clinic predicate using AND.
    pub fn with_owner(mut self, doctor_id: Uuid) -> Self {
        self.owner_doctor = Some(doctor_id);
        self
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    pub fn owner_doctor(&self) -> Option<Uuid> {
        self.owner_doctor
    }

    /// The clinic predicate. Storage implementations must call this
    /// before building any query and propagate the error on an empty
    /// slot.
    pub fn clinic_id(&self) -> CliniqResult<Uuid> {
        self.clinic
            .map(|c| c.clinic_id())
            .ok_or(CliniqError::UnscopedQuery)
    }
}

/// Write-side specification. The clinic id is always present and
/// overrides whatever a client supplied in the request body.
#[derive(Debug, Clone)]
pub struct WriteSpec {
    clinic: ClinicScope,
    owner_doctor: Option<Uuid>,
}

impl WriteSpec {
    pub fn new(clinic: ClinicScope, owner_doctor: Option<Uuid>) -> Self {
        WriteSpec {
            clinic,
            owner_doctor,
        }
    }

    pub fn clinic_id(&self) -> Uuid {
        self.clinic.clinic_id()
    }

    pub fn owner_doctor(&self) -> Option<Uuid> {
        self.owner_doctor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_spec_is_rejected_at_dispatch() {
        let spec = QuerySpec::unscoped(ResourceClass::Posts);
        assert!(matches!(
            spec.clinic_id(),
            Err(CliniqError::UnscopedQuery)
        ));
    }

    #[test]
    fn scoped_spec_exposes_the_clinic_predicate() {
        let cid = Uuid::new_v4();
        let spec = QuerySpec::scoped(ResourceClass::Posts, ClinicScope::new(cid));
        assert_eq!(spec.clinic_id().unwrap(), cid);
        assert_eq!(spec.owner_doctor(), None);
    }

    #[test]
    fn owner_predicate_composes_with_the_clinic_predicate() {
        let cid = Uuid::new_v4();
        let did = Uuid::new_v4();
        let spec =
            QuerySpec::scoped(ResourceClass::Prescriptions, ClinicScope::new(cid)).with_owner(did);
        assert_eq!(spec.clinic_id().unwrap(), cid);
        assert_eq!(spec.owner_doctor(), Some(did));
    }
}
