//! Outbound mail boundary for OTP delivery.
//!
//! Mail delivery is an external collaborator: the gateway fires and
//! forgets, and a failed delivery never rolls back an issuance (the
//! user can request a resend).

use std::sync::{Arc, Mutex};

use cliniq_core::error::CliniqResult;
use cliniq_core::models::otp::OtpPurpose;

pub trait OtpMailer: Send + Sync {
    fn send_otp(
        &self,
        to: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> impl Future<Output = CliniqResult<()>> + Send;
}

/// Logs the delivery event instead of sending. Stands in for the real
/// transport in deployments without one; never logs the code itself.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer {
    pub from: String,
}

impl OtpMailer for TracingMailer {
    async fn send_otp(&self, to: &str, purpose: OtpPurpose, _code: &str) -> CliniqResult<()> {
        tracing::info!(
            target: "mail",
            from = %self.from,
            to,
            purpose = purpose.as_str(),
            "OTP dispatched"
        );
        Ok(())
    }
}

/// A delivery captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentOtp {
    pub to: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

/// Test transport that records every delivery for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentOtp>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentOtp> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// The most recently delivered code for an address, if any.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("mailer lock")
            .iter()
            .rev()
            .find(|s| s.to == email)
            .map(|s| s.code.clone())
    }
}

impl OtpMailer for RecordingMailer {
    async fn send_otp(&self, to: &str, purpose: OtpPurpose, code: &str) -> CliniqResult<()> {
        self.sent.lock().expect("mailer lock").push(SentOtp {
            to: to.to_string(),
            purpose,
            code: code.to_string(),
        });
        Ok(())
    }
}
