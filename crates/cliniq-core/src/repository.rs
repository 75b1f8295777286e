//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Staff and resource operations
//! carry tenant context so the storage layer can enforce isolation;
//! resource repositories additionally take a scoped spec whose clinic
//! slot must be filled before dispatch.

use uuid::Uuid;

use crate::error::CliniqResult;
use crate::models::{
    clinic::{Clinic, CreateClinic},
    otp::{IssueOtp, OtpPurpose, OtpRecord},
    post::{CreatePost, Post, UpdatePost},
    role::{Role, StaffRole},
    staff::{CreateStaff, Staff},
};
use crate::scope::{QuerySpec, WriteSpec};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Identity store
// ---------------------------------------------------------------------------

pub trait ClinicRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email collides.
    fn create(&self, input: CreateClinic) -> impl Future<Output = CliniqResult<Clinic>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Clinic>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CliniqResult<Clinic>> + Send;
    fn set_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = CliniqResult<Clinic>> + Send;
    fn update_credential(
        &self,
        id: Uuid,
        credential_hash: String,
    ) -> impl Future<Output = CliniqResult<()>> + Send;
}

pub trait StaffRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email or UHID collides
    /// within the role. The target table follows from `input.detail`.
    fn create(&self, input: CreateStaff) -> impl Future<Output = CliniqResult<Staff>> + Send;
    fn get_by_id(
        &self,
        role: StaffRole,
        id: Uuid,
    ) -> impl Future<Output = CliniqResult<Staff>> + Send;
    /// Lookup by lowercased email.
    fn get_by_email(
        &self,
        role: StaffRole,
        email: &str,
    ) -> impl Future<Output = CliniqResult<Staff>> + Send;
    /// Lookup by uppercased UHID.
    fn get_by_uhid(
        &self,
        role: StaffRole,
        uhid: &str,
    ) -> impl Future<Output = CliniqResult<Staff>> + Send;
    /// Offboarding deactivates; records stay as authors of history.
    fn set_active(
        &self,
        role: StaffRole,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = CliniqResult<Staff>> + Send;
    fn update_credential(
        &self,
        role: StaffRole,
        id: Uuid,
        credential_hash: String,
    ) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        clinic_id: Uuid,
        role: StaffRole,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Staff>>> + Send;
}

// ---------------------------------------------------------------------------
// OTP records
// ---------------------------------------------------------------------------

pub trait OtpRepository: Send + Sync {
    /// Atomically expires every pending record for `(email, purpose)`
    /// and inserts a fresh pending one — a single transaction, so two
    /// racing issuers leave exactly one pending record.
    fn issue(&self, input: IssueOtp) -> impl Future<Output = CliniqResult<OtpRecord>> + Send;

    /// Most recent record for `(email, purpose)` regardless of status.
    fn latest(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> impl Future<Output = CliniqResult<Option<OtpRecord>>> + Send;

    /// The single pending record for `(email, purpose)`, if any.
    fn find_pending(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> impl Future<Output = CliniqResult<Option<OtpRecord>>> + Send;

    /// Atomic `attempts += 1` on a still-pending record; returns the
    /// updated record, or `NotFound` if the record left `pending`
    /// concurrently.
    fn increment_attempts(
        &self,
        id: Uuid,
    ) -> impl Future<Output = CliniqResult<OtpRecord>> + Send;

    /// pending → expired. No-op if the record already left `pending`.
    fn mark_expired(&self, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;

    /// pending → verified; stamps `verified_at`. `NotFound` if the
    /// record is not pending.
    fn mark_verified(&self, id: Uuid) -> impl Future<Output = CliniqResult<OtpRecord>> + Send;

    /// verified → used. Idempotent on used; a no-op from any other
    /// status so terminal states never revert.
    fn mark_used(&self, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;

    /// Remove records whose expiry lies more than `grace_secs` in the
    /// past. Returns the number removed. Best-effort, off the critical
    /// path.
    fn sweep(&self, grace_secs: i64) -> impl Future<Output = CliniqResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-bound resources
// ---------------------------------------------------------------------------

pub trait PostRepository: Send + Sync {
    /// The stored clinic id comes from `spec`, never from the input.
    fn create(
        &self,
        spec: &WriteSpec,
        author_id: Uuid,
        author_role: Role,
        input: CreatePost,
    ) -> impl Future<Output = CliniqResult<Post>> + Send;
    fn get(&self, spec: &QuerySpec, id: Uuid) -> impl Future<Output = CliniqResult<Post>> + Send;
    fn list(
        &self,
        spec: &QuerySpec,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Post>>> + Send;
    fn update(
        &self,
        spec: &QuerySpec,
        id: Uuid,
        input: UpdatePost,
    ) -> impl Future<Output = CliniqResult<Post>> + Send;
    fn delete(&self, spec: &QuerySpec, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
}
