//! SurrealDB implementation of [`ClinicRepository`].

use chrono::{DateTime, Utc};
use cliniq_core::error::CliniqResult;
use cliniq_core::models::clinic::{Clinic, CreateClinic};
use cliniq_core::repository::ClinicRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ClinicRow {
    record_id: String,
    name: String,
    email: String,
    credential_hash: String,
    phone: Option<String>,
    address: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClinicRow {
    fn try_into_clinic(self) -> Result<Clinic, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid clinic UUID: {e}")))?;
        Ok(Clinic {
            id,
            name: self.name,
            email: self.email,
            credential_hash: self.credential_hash,
            phone: self.phone,
            address: self.address,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the clinic side of the identity store.
#[derive(Clone)]
pub struct SurrealClinicRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClinicRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM clinic \
                 WHERE email = $email GROUP ALL",
            )
            .bind(("email", email.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> ClinicRepository for SurrealClinicRepository<C> {
    async fn create(&self, input: CreateClinic) -> CliniqResult<Clinic> {
        let id = Uuid::new_v4();
        let email = input.email.trim().to_lowercase();

        // Pre-check for a friendly conflict error; the unique index
        // remains the backstop under races.
        if self.email_taken(&email).await? {
            return Err(DbError::Conflict {
                entity: "clinic".into(),
            }
            .into());
        }

        self.db
            .query(
                "CREATE type::record('clinic', $id) SET \
                 name = $name, \
                 email = $email, \
                 credential_hash = $credential_hash, \
                 phone = $phone, \
                 address = $address, \
                 active = true \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("email", email))
            .bind(("credential_hash", input.credential_hash))
            .bind(("phone", input.phone))
            .bind(("address", input.address))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Conflict {
                entity: format!("clinic: {e}"),
            })?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Clinic> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('clinic', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClinicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "clinic".into(),
            id: id_str,
        })?;

        Ok(row.try_into_clinic()?)
    }

    async fn get_by_email(&self, email: &str) -> CliniqResult<Clinic> {
        let email = email.trim().to_lowercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM clinic \
                 WHERE email = $email",
            )
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClinicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "clinic".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_clinic()?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CliniqResult<Clinic> {
        self.db
            .query(
                "UPDATE type::record('clinic', $id) SET \
                 active = $active, updated_at = time::now() \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        self.get_by_id(id).await
    }

    async fn update_credential(&self, id: Uuid, credential_hash: String) -> CliniqResult<()> {
        self.db
            .query(
                "UPDATE type::record('clinic', $id) SET \
                 credential_hash = $credential_hash, \
                 updated_at = time::now() \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("credential_hash", credential_hash))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
