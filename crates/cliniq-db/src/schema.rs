//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Clinics (the tenant anchor; also a principal)
-- =======================================================================
DEFINE TABLE clinic SCHEMAFULL;
DEFINE FIELD name ON TABLE clinic TYPE string;
DEFINE FIELD email ON TABLE clinic TYPE string;
DEFINE FIELD credential_hash ON TABLE clinic TYPE string;
DEFINE FIELD phone ON TABLE clinic TYPE option<string>;
DEFINE FIELD address ON TABLE clinic TYPE option<string>;
DEFINE FIELD active ON TABLE clinic TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE clinic TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE clinic TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_clinic_email ON TABLE clinic COLUMNS email UNIQUE;

-- =======================================================================
-- Doctors (clinic scope)
-- =======================================================================
DEFINE TABLE doctor SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE doctor TYPE string;
DEFINE FIELD full_name ON TABLE doctor TYPE string;
DEFINE FIELD uhid ON TABLE doctor TYPE string;
DEFINE FIELD email ON TABLE doctor TYPE string;
DEFINE FIELD credential_hash ON TABLE doctor TYPE string;
DEFINE FIELD active ON TABLE doctor TYPE bool DEFAULT true;
DEFINE FIELD profile_image ON TABLE doctor TYPE option<string>;
DEFINE FIELD specialty ON TABLE doctor TYPE string;
DEFINE FIELD created_at ON TABLE doctor TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE doctor TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_doctor_email ON TABLE doctor COLUMNS email UNIQUE;
DEFINE INDEX idx_doctor_uhid ON TABLE doctor COLUMNS uhid UNIQUE;
DEFINE INDEX idx_doctor_clinic ON TABLE doctor COLUMNS clinic_id;

-- =======================================================================
-- Nurses (clinic scope)
-- =======================================================================
DEFINE TABLE nurse SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE nurse TYPE string;
DEFINE FIELD full_name ON TABLE nurse TYPE string;
DEFINE FIELD uhid ON TABLE nurse TYPE string;
DEFINE FIELD email ON TABLE nurse TYPE string;
DEFINE FIELD credential_hash ON TABLE nurse TYPE string;
DEFINE FIELD active ON TABLE nurse TYPE bool DEFAULT true;
DEFINE FIELD profile_image ON TABLE nurse TYPE option<string>;
DEFINE FIELD departments ON TABLE nurse TYPE array;
DEFINE FIELD departments.* ON TABLE nurse TYPE string;
DEFINE FIELD shift ON TABLE nurse TYPE string \
    ASSERT $value IN ['Day', 'Night', 'Evening', 'Rotating'];
DEFINE FIELD head ON TABLE nurse TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE nurse TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE nurse TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_nurse_email ON TABLE nurse COLUMNS email UNIQUE;
DEFINE INDEX idx_nurse_uhid ON TABLE nurse COLUMNS uhid UNIQUE;
DEFINE INDEX idx_nurse_clinic ON TABLE nurse COLUMNS clinic_id;

-- =======================================================================
-- Pharmacists (clinic scope)
-- =======================================================================
DEFINE TABLE pharmacist SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE pharmacist TYPE string;
DEFINE FIELD full_name ON TABLE pharmacist TYPE string;
DEFINE FIELD uhid ON TABLE pharmacist TYPE string;
DEFINE FIELD email ON TABLE pharmacist TYPE string;
DEFINE FIELD credential_hash ON TABLE pharmacist TYPE string;
DEFINE FIELD active ON TABLE pharmacist TYPE bool DEFAULT true;
DEFINE FIELD profile_image ON TABLE pharmacist TYPE option<string>;
DEFINE FIELD specialization ON TABLE pharmacist TYPE string;
DEFINE FIELD created_at ON TABLE pharmacist TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE pharmacist TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_pharmacist_email ON TABLE pharmacist \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_pharmacist_uhid ON TABLE pharmacist \
    COLUMNS uhid UNIQUE;
DEFINE INDEX idx_pharmacist_clinic ON TABLE pharmacist \
    COLUMNS clinic_id;

-- =======================================================================
-- OTP records
-- =======================================================================
DEFINE TABLE otp SCHEMAFULL;
DEFINE FIELD email ON TABLE otp TYPE string;
DEFINE FIELD code ON TABLE otp TYPE string;
DEFINE FIELD purpose ON TABLE otp TYPE string \
    ASSERT $value IN ['login', 'registration', 'password_reset', \
    'email_verification'];
DEFINE FIELD status ON TABLE otp TYPE string \
    ASSERT $value IN ['pending', 'verified', 'expired', 'used'];
DEFINE FIELD attempts ON TABLE otp TYPE int DEFAULT 0;
DEFINE FIELD expires_at ON TABLE otp TYPE datetime;
DEFINE FIELD issued_at ON TABLE otp TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD verified_at ON TABLE otp TYPE option<datetime>;
DEFINE FIELD client_ip ON TABLE otp TYPE option<string>;
DEFINE FIELD user_agent ON TABLE otp TYPE option<string>;
DEFINE INDEX idx_otp_email_purpose ON TABLE otp \
    COLUMNS email, purpose;

-- =======================================================================
-- Posts (clinic scope)
-- =======================================================================
DEFINE TABLE post SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE post TYPE string;
DEFINE FIELD author_id ON TABLE post TYPE string;
DEFINE FIELD author_role ON TABLE post TYPE string \
    ASSERT $value IN ['clinic', 'doctor', 'nurse', 'head_nurse', \
    'pharmacist'];
DEFINE FIELD title ON TABLE post TYPE string;
DEFINE FIELD body ON TABLE post TYPE string;
DEFINE FIELD created_at ON TABLE post TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE post TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_post_clinic ON TABLE post COLUMNS clinic_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}
