//! SurrealDB implementation of [`OtpRepository`].
//!
//! Issuance expires prior pending records and inserts the fresh one in
//! a single transaction, so a race between two issuers leaves exactly
//! one pending record. Status transitions are guarded on the legal
//! source status in the UPDATE itself; a record that already moved on
//! simply matches zero rows.

use chrono::{DateTime, Duration, Utc};
use cliniq_core::error::CliniqResult;
use cliniq_core::models::otp::{IssueOtp, OtpPurpose, OtpRecord, OtpStatus};
use cliniq_core::repository::OtpRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OtpRow {
    record_id: String,
    email: String,
    code: String,
    purpose: String,
    status: String,
    attempts: u32,
    expires_at: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
    client_ip: Option<String>,
    user_agent: Option<String>,
}

impl OtpRow {
    fn try_into_record(self) -> Result<OtpRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid OTP UUID: {e}")))?;
        let purpose = OtpPurpose::parse(&self.purpose)
            .ok_or_else(|| DbError::Decode(format!("unknown OTP purpose: {}", self.purpose)))?;
        let status = OtpStatus::parse(&self.status)
            .ok_or_else(|| DbError::Decode(format!("unknown OTP status: {}", self.status)))?;
        Ok(OtpRecord {
            id,
            email: self.email,
            code: self.code,
            purpose,
            status,
            attempts: self.attempts,
            expires_at: self.expires_at,
            issued_at: self.issued_at,
            verified_at: self.verified_at,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row shape for guarded UPDATEs that only need to report a match.
#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

const SELECT_FIELDS: &str = "SELECT meta::id(id) AS record_id, *";

/// SurrealDB implementation of the OTP record store.
#[derive(Clone)]
pub struct SurrealOtpRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOtpRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<OtpRecord> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_FIELDS} FROM type::record('otp', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OtpRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "otp".into(),
            id: id_str,
        })?;

        Ok(row.try_into_record()?)
    }
}

impl<C: Connection> OtpRepository for SurrealOtpRepository<C> {
    async fn issue(&self, input: IssueOtp) -> CliniqResult<OtpRecord> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "BEGIN TRANSACTION;
                 UPDATE otp SET status = 'expired' \
                 WHERE email = $email AND purpose = $purpose \
                 AND status = 'pending';
                 CREATE type::record('otp', $id) SET \
                 email = $email, code = $code, purpose = $purpose, \
                 status = 'pending', attempts = 0, \
                 expires_at = $expires_at, \
                 verified_at = NONE, \
                 client_ip = $client_ip, user_agent = $user_agent \
                 RETURN NONE;
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("email", input.email))
            .bind(("code", input.code))
            .bind(("purpose", input.purpose.as_str().to_string()))
            .bind(("expires_at", input.expires_at))
            .bind(("client_ip", input.client_ip))
            .bind(("user_agent", input.user_agent))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn latest(&self, email: &str, purpose: OtpPurpose) -> CliniqResult<Option<OtpRecord>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_FIELDS} FROM otp \
                 WHERE email = $email AND purpose = $purpose \
                 ORDER BY issued_at DESC LIMIT 1"
            ))
            .bind(("email", email.to_string()))
            .bind(("purpose", purpose.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OtpRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_record().map_err(Into::into))
            .transpose()
    }

    async fn find_pending(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> CliniqResult<Option<OtpRecord>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_FIELDS} FROM otp \
                 WHERE email = $email AND purpose = $purpose \
                 AND status = 'pending'"
            ))
            .bind(("email", email.to_string()))
            .bind(("purpose", purpose.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OtpRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_record().map_err(Into::into))
            .transpose()
    }

    async fn increment_attempts(&self, id: Uuid) -> CliniqResult<OtpRecord> {
        let id_str = id.to_string();

        // The += is applied storage-side inside a single statement, so
        // two racing callers each observe a distinct count.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('otp', $id) SET attempts += 1 \
                 WHERE status = 'pending' \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "otp".into(),
                id: id_str,
            }
            .into());
        }

        self.get_by_id(id).await
    }

    async fn mark_expired(&self, id: Uuid) -> CliniqResult<()> {
        self.db
            .query(
                "UPDATE type::record('otp', $id) SET status = 'expired' \
                 WHERE status = 'pending' RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> CliniqResult<OtpRecord> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('otp', $id) SET \
                 status = 'verified', verified_at = time::now() \
                 WHERE status = 'pending' \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "otp".into(),
                id: id_str,
            }
            .into());
        }

        self.get_by_id(id).await
    }

    async fn mark_used(&self, id: Uuid) -> CliniqResult<()> {
        // Idempotent: re-marking a used record matches it and rewrites
        // the same status; any other status matches nothing.
        self.db
            .query(
                "UPDATE type::record('otp', $id) SET status = 'used' \
                 WHERE status = 'verified' OR status = 'used' \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn sweep(&self, grace_secs: i64) -> CliniqResult<u64> {
        let cutoff = Utc::now() - Duration::seconds(grace_secs);

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM otp \
                 WHERE expires_at < $cutoff GROUP ALL",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE otp WHERE expires_at < $cutoff")
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
