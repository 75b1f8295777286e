//! One-time password records.
//!
//! A record is bound to `(email, purpose)` and walks a one-way state
//! machine: `Pending` to one of `Verified`, `Expired`, or (after the
//! verified token is consumed) `Used`. Terminal states never revert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a code was issued. A code can only be redeemed by the flow that
/// requested it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Registration,
    PasswordReset,
    EmailVerification,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Registration => "registration",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::EmailVerification => "email_verification",
        }
    }

    pub fn parse(s: &str) -> Option<OtpPurpose> {
        match s {
            "login" => Some(OtpPurpose::Login),
            "registration" => Some(OtpPurpose::Registration),
            "password_reset" => Some(OtpPurpose::PasswordReset),
            "email_verification" => Some(OtpPurpose::EmailVerification),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
    Used,
}

impl OtpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpStatus::Pending => "pending",
            OtpStatus::Verified => "verified",
            OtpStatus::Expired => "expired",
            OtpStatus::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<OtpStatus> {
        match s {
            "pending" => Some(OtpStatus::Pending),
            "verified" => Some(OtpStatus::Verified),
            "expired" => Some(OtpStatus::Expired),
            "used" => Some(OtpStatus::Used),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: Uuid,
    /// Lowercased.
    pub email: String,
    /// Exactly six ASCII digits; leading zeros preserved.
    pub code: String,
    pub purpose: OtpPurpose,
    pub status: OtpStatus,
    /// Verification attempts consumed so far, capped at 5.
    pub attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Fields required to issue a fresh record.
#[derive(Debug, Clone)]
pub struct IssueOtp {
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}
