//! Email OTP issuance and verification.
//!
//! State machine over [`OtpRecord`]:
//!
//! | From     | Event                                  | To       |
//! |----------|----------------------------------------|----------|
//! | pending  | correct code, fresh, attempts < limit  | verified |
//! | pending  | wrong code, attempts below limit       | pending  |
//! | pending  | attempt limit reached                  | expired  |
//! | pending  | past `expires_at`                      | expired  |
//! | verified | token consumed by the caller           | used     |
//!
//! Terminal states never revert; the repository guards every
//! transition on the legal source status.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use cliniq_core::error::CliniqResult;
use cliniq_core::models::otp::{IssueOtp, OtpPurpose, OtpRecord, OtpStatus};
use cliniq_core::repository::OtpRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Outcome of an issuance request.
#[derive(Debug)]
pub enum IssueOutcome {
    /// A fresh pending record; the code goes out by mail.
    Fresh(OtpRecord),
    /// Re-requested too soon after the previous issuance. The caller
    /// still reports success; the earlier code remains the live one.
    Throttled,
}

/// Internal verification failure reasons. `NoPending` and `WrongCode`
/// collapse to one client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFailure {
    NoPending,
    Expired,
    TooManyAttempts,
    WrongCode,
}

impl From<OtpFailure> for AuthError {
    fn from(f: OtpFailure) -> Self {
        match f {
            OtpFailure::NoPending | OtpFailure::WrongCode => AuthError::InvalidOtp,
            OtpFailure::Expired => AuthError::OtpExpired,
            OtpFailure::TooManyAttempts => AuthError::OtpTooManyAttempts,
        }
    }
}

/// Issues, verifies, and consumes short-lived 6-digit codes bound to
/// `(email, purpose)`.
pub struct OtpService<R: OtpRepository> {
    repo: R,
    ttl_secs: u64,
    max_attempts: u32,
    reissue_interval_secs: i64,
    sweep_grace_secs: i64,
}

impl<R: OtpRepository> OtpService<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            ttl_secs: config.otp_ttl_secs,
            max_attempts: config.otp_max_attempts,
            reissue_interval_secs: config.otp_reissue_interval_secs,
            sweep_grace_secs: config.otp_sweep_grace_secs,
        }
    }

    /// Issue a code for `(email, purpose)`.
    ///
    /// Prior pending records are expired atomically with the insert, so
    /// at most one pending record exists per pair at any moment. A
    /// request arriving inside the re-issue interval is throttled.
    pub async fn issue(
        &self,
        email: &str,
        purpose: OtpPurpose,
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) -> CliniqResult<IssueOutcome> {
        let email = normalize_email(email);
        let now = Utc::now();

        if let Some(previous) = self.repo.latest(&email, purpose).await? {
            if now - previous.issued_at < Duration::seconds(self.reissue_interval_secs) {
                tracing::debug!(%email, purpose = purpose.as_str(), "OTP re-issue throttled");
                return Ok(IssueOutcome::Throttled);
            }
        }

        let record = self
            .repo
            .issue(IssueOtp {
                email,
                code: generate_code(),
                purpose,
                expires_at: now + Duration::seconds(self.ttl_secs as i64),
                client_ip,
                user_agent,
            })
            .await?;

        Ok(IssueOutcome::Fresh(record))
    }

    /// Verify a submitted code against the pending record for
    /// `(email, purpose)`.
    ///
    /// Attempts are incremented with an atomic storage-side update
    /// before the code comparison, so racing wrong guesses cannot
    /// stretch the ceiling.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpRecord, VerifyError> {
        let email = normalize_email(email);

        let Some(record) = self.repo.find_pending(&email, purpose).await? else {
            return Err(OtpFailure::NoPending.into());
        };

        if Utc::now() >= record.expires_at {
            self.repo.mark_expired(record.id).await?;
            return Err(OtpFailure::Expired.into());
        }

        let record = match self.repo.increment_attempts(record.id).await {
            Ok(r) => r,
            // The record left `pending` under us; same answer as if it
            // was never there.
            Err(cliniq_core::CliniqError::NotFound { .. }) => {
                return Err(OtpFailure::NoPending.into());
            }
            Err(e) => return Err(e.into()),
        };

        if record.attempts >= self.max_attempts {
            self.repo.mark_expired(record.id).await?;
            return Err(OtpFailure::TooManyAttempts.into());
        }

        if !codes_match(&record.code, code) {
            // The incremented attempt count is already persisted.
            return Err(OtpFailure::WrongCode.into());
        }

        let record = self.repo.mark_verified(record.id).await?;
        Ok(record)
    }

    /// Transition a verified record to used. Idempotent on used.
    pub async fn consume(&self, record: &OtpRecord) -> CliniqResult<()> {
        match record.status {
            OtpStatus::Verified | OtpStatus::Used => self.repo.mark_used(record.id).await,
            other => Err(cliniq_core::CliniqError::Internal(format!(
                "consume on {} OTP record",
                other.as_str()
            ))),
        }
    }

    /// Remove terminal records past their grace period. Runs from the
    /// background sweep; failures are logged, not propagated.
    pub async fn sweep(&self) -> CliniqResult<u64> {
        self.repo.sweep(self.sweep_grace_secs).await
    }
}

/// Verification error: either a policy failure or a storage error.
#[derive(Debug)]
pub enum VerifyError {
    Failure(OtpFailure),
    Storage(cliniq_core::CliniqError),
}

impl From<OtpFailure> for VerifyError {
    fn from(f: OtpFailure) -> Self {
        VerifyError::Failure(f)
    }
}

impl From<cliniq_core::CliniqError> for VerifyError {
    fn from(e: cliniq_core::CliniqError) -> Self {
        VerifyError::Storage(e)
    }
}

impl From<VerifyError> for cliniq_core::CliniqError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Failure(f) => AuthError::from(f).into(),
            VerifyError::Storage(e) => e,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A uniformly random 6-digit decimal code, drawn from the full
/// `0..1_000_000` range with the thread-local CSPRNG. Leading zeros are
/// preserved.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let n: u32 = rand::Rng::random_range(&mut rng, 0..1_000_000);
    format!("{n:06}")
}

/// Compare codes by SHA-256 digest equality so the comparison time does
/// not depend on where the submitted code first diverges.
fn codes_match(stored: &str, submitted: &str) -> bool {
    Sha256::digest(stored.as_bytes()) == Sha256::digest(submitted.as_bytes())
}
