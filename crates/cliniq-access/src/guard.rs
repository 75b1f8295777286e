//! The single interception point for tenant-bound resource operations.
//!
//! For every request the guard re-validates the principal against the
//! identity store (token claims may be stale), resolves the effective
//! clinic id, consults the permission matrix, and hands the handler a
//! [`Grant`] — the only production source of scoped query and write
//! specs.

use uuid::Uuid;

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::principal::Principal;
use cliniq_core::models::role::Role;
use cliniq_core::repository::{ClinicRepository, StaffRepository};
use cliniq_core::scope::{ClinicScope, QuerySpec, ResourceClass, WriteSpec};

use crate::permission::{Decision, Verb, permitted};
use crate::resolver::resolve_tenant;

/// An authorized operation: role, principal, effective tenant, and
/// whether the matrix restricted it to the principal's own rows.
#[derive(Debug, Clone)]
pub struct Grant {
    role: Role,
    principal_id: Uuid,
    clinic_id: Uuid,
    class: ResourceClass,
    own_only: bool,
}

impl Grant {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn principal_id(&self) -> Uuid {
        self.principal_id
    }

    /// The store-resolved clinic id, not the token claim.
    pub fn clinic_id(&self) -> Uuid {
        self.clinic_id
    }

    /// Read predicate: clinic scope, plus the owner restriction when
    /// the matrix said "own".
    pub fn query_spec(&self) -> QuerySpec {
        let spec = QuerySpec::scoped(self.class, ClinicScope::new(self.clinic_id));
        if self.own_only {
            spec.with_owner(self.principal_id)
        } else {
            spec
        }
    }

    /// Write predicate: the clinic id here overwrites any value a
    /// client put in the request body.
    pub fn write_spec(&self) -> WriteSpec {
        WriteSpec::new(
            ClinicScope::new(self.clinic_id),
            self.own_only.then_some(self.principal_id),
        )
    }
}

/// Access guard over the identity store.
pub struct AccessGuard<C, S>
where
    C: ClinicRepository,
    S: StaffRepository,
{
    clinics: C,
    staff: S,
}

impl<C, S> AccessGuard<C, S>
where
    C: ClinicRepository,
    S: StaffRepository,
{
    pub fn new(clinics: C, staff: S) -> Self {
        Self { clinics, staff }
    }

    /// Authorize `verb` on `class` for the token-identified principal.
    ///
    /// `claimed_clinic_id` is the clinic claim from the token; it is
    /// informational only and a mismatch with the store is logged, not
    /// trusted.
    pub async fn authorize(
        &self,
        principal_id: Uuid,
        role: Role,
        claimed_clinic_id: Uuid,
        verb: Verb,
        class: ResourceClass,
    ) -> CliniqResult<Grant> {
        let principal = self.load_principal(role, principal_id).await?;

        if !principal.active() {
            tracing::warn!(
                target: "audit",
                principal = %principal_id,
                role = role.as_str(),
                "deactivated principal rejected"
            );
            return Err(CliniqError::AuthenticationFailed {
                reason: "Invalid credentials".into(),
            });
        }

        let clinic_id = resolve_tenant(role, &principal)?;
        if clinic_id != claimed_clinic_id {
            tracing::warn!(
                target: "audit",
                principal = %principal_id,
                claimed = %claimed_clinic_id,
                effective = %clinic_id,
                "token clinic claim is stale; store value wins"
            );
        }

        match permitted(role, class, verb) {
            Decision::Deny => {
                tracing::warn!(
                    target: "audit",
                    principal = %principal_id,
                    role = role.as_str(),
                    verb = verb.as_str(),
                    class = class.as_str(),
                    clinic = %clinic_id,
                    "operation denied"
                );
                Err(CliniqError::AuthorizationDenied {
                    reason: format!("{role} may not {verb} {class}"),
                })
            }
            Decision::Allow => Ok(Grant {
                role,
                principal_id,
                clinic_id,
                class,
                own_only: false,
            }),
            Decision::AllowOwn => Ok(Grant {
                role,
                principal_id,
                clinic_id,
                class,
                own_only: true,
            }),
        }
    }

    async fn load_principal(&self, role: Role, id: Uuid) -> CliniqResult<Principal> {
        let loaded = match role.staff_role() {
            None => self.clinics.get_by_id(id).await.map(Principal::Clinic),
            Some(staff_role) => self
                .staff
                .get_by_id(staff_role, id)
                .await
                .map(Principal::Staff),
        };

        // A token whose subject no longer exists is indistinguishable
        // from a bad credential to the caller.
        loaded.map_err(|e| match e {
            CliniqError::NotFound { .. } => CliniqError::AuthenticationFailed {
                reason: "Invalid credentials".into(),
            },
            other => other,
        })
    }
}
