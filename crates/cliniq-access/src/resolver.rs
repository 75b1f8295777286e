//! Effective-tenant resolution for authenticated principals.

use uuid::Uuid;

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::principal::Principal;
use cliniq_core::models::role::Role;

/// Resolve the clinic id that scopes every query a principal runs.
///
/// The principal is the freshly re-read identity record, not the token
/// claims; the claims-level clinic id is only a hint. A role tag that
/// does not match the record it points at is unresolvable — elevated
/// nurse roles resolve like nurses and never cross the tenant boundary.
pub fn resolve_tenant(role: Role, principal: &Principal) -> CliniqResult<Uuid> {
    match (role, principal) {
        (Role::Clinic, Principal::Clinic(clinic)) => Ok(clinic.id),
        (
            Role::Doctor | Role::Nurse | Role::HeadNurse | Role::Pharmacist,
            Principal::Staff(staff),
        ) => Ok(staff.clinic_id),
        _ => Err(CliniqError::TenantUnresolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cliniq_core::models::clinic::Clinic;
    use cliniq_core::models::role::StaffRole;
    use cliniq_core::models::staff::{Shift, Staff, StaffDetail};

    fn clinic(id: Uuid) -> Principal {
        Principal::Clinic(Clinic {
            id,
            name: "C".into(),
            email: "c@x.test".into(),
            credential_hash: String::new(),
            phone: None,
            address: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn nurse(clinic_id: Uuid, head: bool) -> Principal {
        Principal::Staff(Staff {
            id: Uuid::new_v4(),
            clinic_id,
            full_name: "N".into(),
            uhid: "NUR001".into(),
            email: "n@x.test".into(),
            credential_hash: String::new(),
            role: StaffRole::Nurse,
            active: true,
            profile_image: None,
            detail: StaffDetail::Nurse {
                departments: vec![],
                shift: Shift::Day,
                head,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn clinic_resolves_to_itself() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_tenant(Role::Clinic, &clinic(id)).unwrap(), id);
    }

    #[test]
    fn head_nurse_resolves_like_nurse() {
        let cid = Uuid::new_v4();
        assert_eq!(
            resolve_tenant(Role::HeadNurse, &nurse(cid, true)).unwrap(),
            cid
        );
        assert_eq!(resolve_tenant(Role::Nurse, &nurse(cid, false)).unwrap(), cid);
    }

    #[test]
    fn mismatched_role_and_record_is_unresolvable() {
        let cid = Uuid::new_v4();
        assert!(matches!(
            resolve_tenant(Role::Clinic, &nurse(cid, false)),
            Err(CliniqError::TenantUnresolved)
        ));
        assert!(matches!(
            resolve_tenant(Role::Doctor, &clinic(cid)),
            Err(CliniqError::TenantUnresolved)
        ));
    }
}
