//! SurrealDB implementation of [`StaffRepository`].
//!
//! Each staff role has its own table (`doctor`, `nurse`, `pharmacist`)
//! with role-specific columns; one repository serves all three by
//! dispatching on the role tag. Emails are stored lowercased and UHIDs
//! uppercased, so uniqueness is case-insensitive in practice.

use chrono::{DateTime, Utc};
use cliniq_core::error::CliniqResult;
use cliniq_core::models::role::StaffRole;
use cliniq_core::models::staff::{CreateStaff, Shift, Staff, StaffDetail};
use cliniq_core::repository::{PaginatedResult, Pagination, StaffRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DoctorRow {
    record_id: String,
    clinic_id: String,
    full_name: String,
    uhid: String,
    email: String,
    credential_hash: String,
    active: bool,
    profile_image: Option<String>,
    specialty: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NurseRow {
    record_id: String,
    clinic_id: String,
    full_name: String,
    uhid: String,
    email: String,
    credential_hash: String,
    active: bool,
    profile_image: Option<String>,
    departments: Vec<String>,
    shift: String,
    head: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PharmacistRow {
    record_id: String,
    clinic_id: String,
    full_name: String,
    uhid: String,
    email: String,
    credential_hash: String,
    active: bool,
    profile_image: Option<String>,
    specialization: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_ids(record_id: &str, clinic_id: &str) -> Result<(Uuid, Uuid), DbError> {
    let id = Uuid::parse_str(record_id)
        .map_err(|e| DbError::Decode(format!("invalid staff UUID: {e}")))?;
    let clinic = Uuid::parse_str(clinic_id)
        .map_err(|e| DbError::Decode(format!("invalid clinic UUID: {e}")))?;
    Ok((id, clinic))
}

impl DoctorRow {
    fn try_into_staff(self) -> Result<Staff, DbError> {
        let (id, clinic_id) = parse_ids(&self.record_id, &self.clinic_id)?;
        Ok(Staff {
            id,
            clinic_id,
            full_name: self.full_name,
            uhid: self.uhid,
            email: self.email,
            credential_hash: self.credential_hash,
            role: StaffRole::Doctor,
            active: self.active,
            profile_image: self.profile_image,
            detail: StaffDetail::Doctor {
                specialty: self.specialty,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl NurseRow {
    fn try_into_staff(self) -> Result<Staff, DbError> {
        let (id, clinic_id) = parse_ids(&self.record_id, &self.clinic_id)?;
        let shift = Shift::parse(&self.shift)
            .ok_or_else(|| DbError::Decode(format!("unknown nurse shift: {}", self.shift)))?;
        Ok(Staff {
            id,
            clinic_id,
            full_name: self.full_name,
            uhid: self.uhid,
            email: self.email,
            credential_hash: self.credential_hash,
            role: StaffRole::Nurse,
            active: self.active,
            profile_image: self.profile_image,
            detail: StaffDetail::Nurse {
                departments: self.departments,
                shift,
                head: self.head,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PharmacistRow {
    fn try_into_staff(self) -> Result<Staff, DbError> {
        let (id, clinic_id) = parse_ids(&self.record_id, &self.clinic_id)?;
        Ok(Staff {
            id,
            clinic_id,
            full_name: self.full_name,
            uhid: self.uhid,
            email: self.email,
            credential_hash: self.credential_hash,
            role: StaffRole::Pharmacist,
            active: self.active,
            profile_image: self.profile_image,
            detail: StaffDetail::Pharmacist {
                specialization: self.specialization,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the staff side of the identity store.
#[derive(Clone)]
pub struct SurrealStaffRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStaffRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Decode the first statement of a response into staff records of
    /// the given role.
    fn take_staff(
        result: &mut surrealdb::IndexedResults,
        role: StaffRole,
    ) -> Result<Vec<Staff>, DbError> {
        match role {
            StaffRole::Doctor => {
                let rows: Vec<DoctorRow> = result.take(0)?;
                rows.into_iter().map(DoctorRow::try_into_staff).collect()
            }
            StaffRole::Nurse => {
                let rows: Vec<NurseRow> = result.take(0)?;
                rows.into_iter().map(NurseRow::try_into_staff).collect()
            }
            StaffRole::Pharmacist => {
                let rows: Vec<PharmacistRow> = result.take(0)?;
                rows.into_iter()
                    .map(PharmacistRow::try_into_staff)
                    .collect()
            }
        }
    }

    async fn field_taken(
        &self,
        role: StaffRole,
        field: &'static str,
        value: String,
    ) -> Result<bool, DbError> {
        // `field` is one of two static column names, never user input.
        let query = format!(
            "SELECT count() AS total FROM type::table($table) \
             WHERE {field} = $value GROUP ALL"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("table", role.table().to_string()))
            .bind(("value", value))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> StaffRepository for SurrealStaffRepository<C> {
    async fn create(&self, input: CreateStaff) -> CliniqResult<Staff> {
        let role = input.detail.role();
        let id = Uuid::new_v4();
        let email = input.email.trim().to_lowercase();
        let uhid = input.uhid.trim().to_uppercase();

        if self.field_taken(role, "email", email.clone()).await? {
            return Err(DbError::Conflict {
                entity: format!("{role} email"),
            }
            .into());
        }
        if self.field_taken(role, "uhid", uhid.clone()).await? {
            return Err(DbError::Conflict {
                entity: format!("{role} uhid"),
            }
            .into());
        }

        let common = self
            .db
            .query(match &input.detail {
                StaffDetail::Doctor { .. } => {
                    "CREATE type::record('doctor', $id) SET \
                     clinic_id = $clinic_id, full_name = $full_name, \
                     uhid = $uhid, email = $email, \
                     credential_hash = $credential_hash, \
                     active = true, profile_image = $profile_image, \
                     specialty = $specialty \
                     RETURN NONE"
                }
                StaffDetail::Nurse { .. } => {
                    "CREATE type::record('nurse', $id) SET \
                     clinic_id = $clinic_id, full_name = $full_name, \
                     uhid = $uhid, email = $email, \
                     credential_hash = $credential_hash, \
                     active = true, profile_image = $profile_image, \
                     departments = $departments, shift = $shift, \
                     head = $head \
                     RETURN NONE"
                }
                StaffDetail::Pharmacist { .. } => {
                    "CREATE type::record('pharmacist', $id) SET \
                     clinic_id = $clinic_id, full_name = $full_name, \
                     uhid = $uhid, email = $email, \
                     credential_hash = $credential_hash, \
                     active = true, profile_image = $profile_image, \
                     specialization = $specialization \
                     RETURN NONE"
                }
            })
            .bind(("id", id.to_string()))
            .bind(("clinic_id", input.clinic_id.to_string()))
            .bind(("full_name", input.full_name))
            .bind(("uhid", uhid))
            .bind(("email", email))
            .bind(("credential_hash", input.credential_hash))
            .bind(("profile_image", input.profile_image));

        let result = match input.detail {
            StaffDetail::Doctor { specialty } => common.bind(("specialty", specialty)),
            StaffDetail::Nurse {
                departments,
                shift,
                head,
            } => common
                .bind(("departments", departments))
                .bind(("shift", shift.as_str().to_string()))
                .bind(("head", head)),
            StaffDetail::Pharmacist { specialization } => {
                common.bind(("specialization", specialization))
            }
        }
        .await
        .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Conflict {
            entity: format!("{role}: {e}"),
        })?;

        self.get_by_id(role, id).await
    }

    async fn get_by_id(&self, role: StaffRole, id: Uuid) -> CliniqResult<Staff> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record($table, $id)",
            )
            .bind(("table", role.table().to_string()))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let staff = Self::take_staff(&mut result, role)?;
        staff
            .into_iter()
            .next()
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: role.to_string(),
                    id: id_str,
                }
                .into()
            })
    }

    async fn get_by_email(&self, role: StaffRole, email: &str) -> CliniqResult<Staff> {
        let email = email.trim().to_lowercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::table($table) WHERE email = $email",
            )
            .bind(("table", role.table().to_string()))
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let staff = Self::take_staff(&mut result, role)?;
        staff.into_iter().next().ok_or_else(|| {
            DbError::NotFound {
                entity: role.to_string(),
                id: format!("email={email}"),
            }
            .into()
        })
    }

    async fn get_by_uhid(&self, role: StaffRole, uhid: &str) -> CliniqResult<Staff> {
        let uhid = uhid.trim().to_uppercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::table($table) WHERE uhid = $uhid",
            )
            .bind(("table", role.table().to_string()))
            .bind(("uhid", uhid.clone()))
            .await
            .map_err(DbError::from)?;

        let staff = Self::take_staff(&mut result, role)?;
        staff.into_iter().next().ok_or_else(|| {
            DbError::NotFound {
                entity: role.to_string(),
                id: format!("uhid={uhid}"),
            }
            .into()
        })
    }

    async fn set_active(&self, role: StaffRole, id: Uuid, active: bool) -> CliniqResult<Staff> {
        self.db
            .query(
                "UPDATE type::record($table, $id) SET \
                 active = $active, updated_at = time::now() \
                 RETURN NONE",
            )
            .bind(("table", role.table().to_string()))
            .bind(("id", id.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        self.get_by_id(role, id).await
    }

    async fn update_credential(
        &self,
        role: StaffRole,
        id: Uuid,
        credential_hash: String,
    ) -> CliniqResult<()> {
        self.db
            .query(
                "UPDATE type::record($table, $id) SET \
                 credential_hash = $credential_hash, \
                 updated_at = time::now() \
                 RETURN NONE",
            )
            .bind(("table", role.table().to_string()))
            .bind(("id", id.to_string()))
            .bind(("credential_hash", credential_hash))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        clinic_id: Uuid,
        role: StaffRole,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Staff>> {
        let clinic_id_str = clinic_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM type::table($table) \
                 WHERE clinic_id = $clinic_id GROUP ALL",
            )
            .bind(("table", role.table().to_string()))
            .bind(("clinic_id", clinic_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::table($table) \
                 WHERE clinic_id = $clinic_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("table", role.table().to_string()))
            .bind(("clinic_id", clinic_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let items = Self::take_staff(&mut result, role)?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
