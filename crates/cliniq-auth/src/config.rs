//! Authentication configuration.

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric HMAC-SHA-256 signing key. Must be at least 32 bytes;
    /// [`crate::token::TokenService::new`] rejects shorter keys.
    pub signing_key: Vec<u8>,
    /// Session token lifetime in seconds (default: 3600 = 1 hour).
    pub token_ttl_secs: u64,
    /// A token may be refreshed only inside this final window of its
    /// life, in seconds (default: 900 = 15 minutes).
    pub refresh_window_secs: u64,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// OTP code lifetime in seconds (default: 300 = 5 minutes).
    pub otp_ttl_secs: u64,
    /// Verification attempts before a pending code is force-expired.
    pub otp_max_attempts: u32,
    /// Minimum seconds between issuances per (email, purpose); faster
    /// requests are acknowledged but not acted on.
    pub otp_reissue_interval_secs: i64,
    /// Seconds past expiry before the sweep removes a record.
    pub otp_sweep_grace_secs: i64,
    /// Password-check failures per email before lockout.
    pub login_failure_limit: u32,
    /// Width of the failure-counting window in seconds.
    pub login_failure_window_secs: i64,
    /// Argon2id memory cost in KiB.
    pub argon2_memory_kib: u32,
    /// Argon2id iteration count.
    pub argon2_iterations: u32,
    /// Argon2id lane count.
    pub argon2_parallelism: u32,
    /// Allows the single-factor developer login flow. Off by default;
    /// must stay off outside development deployments.
    pub dev_login_enabled: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: Vec::new(),
            token_ttl_secs: 3600,
            refresh_window_secs: 900,
            issuer: "cliniq".into(),
            otp_ttl_secs: 300,
            otp_max_attempts: 5,
            otp_reissue_interval_secs: 60,
            otp_sweep_grace_secs: 300,
            login_failure_limit: 10,
            login_failure_window_secs: 900,
            // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            dev_login_enabled: false,
        }
    }
}
