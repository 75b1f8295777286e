//! Authentication gateway — composes the credential verifier, OTP
//! service, and token service into the registration, login, and reset
//! flows. Each flow is a linear orchestration; no other code path mints
//! tokens or verifies codes.

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::clinic::{Clinic, CreateClinic};
use cliniq_core::models::otp::OtpPurpose;
use cliniq_core::models::principal::{Principal, PrincipalSummary};
use cliniq_core::models::role::StaffRole;
use cliniq_core::models::staff::{CreateStaff, Staff, StaffDetail};
use cliniq_core::repository::{ClinicRepository, OtpRepository, StaffRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::limiter::LoginRateLimiter;
use crate::mailer::OtpMailer;
use crate::otp::{IssueOutcome, OtpService};
use crate::password;
use crate::token::{SessionClaims, TokenService};

/// Input for the password-bearing login flows.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for the second step of the two-step login flow.
#[derive(Debug)]
pub struct OtpLoginInput {
    pub email: String,
    pub code: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token.
    pub token: String,
    pub principal: PrincipalSummary,
}

/// Input for clinic self-registration.
#[derive(Debug)]
pub struct RegisterClinicInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for staff onboarding by a clinic administrator.
#[derive(Debug)]
pub struct CreateStaffInput {
    pub full_name: String,
    pub uhid: String,
    pub email: String,
    pub password: String,
    pub profile_image: Option<String>,
    pub detail: StaffDetail,
}

/// Input for completing a password reset.
#[derive(Debug)]
pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Authentication gateway.
///
/// Generic over repository and mailer implementations so that the auth
/// layer has no dependency on the database crate or a mail transport.
pub struct AuthGateway<C, S, O, M>
where
    C: ClinicRepository,
    S: StaffRepository,
    O: OtpRepository,
    M: OtpMailer,
{
    clinics: C,
    staff: S,
    otp: OtpService<O>,
    tokens: TokenService,
    mailer: M,
    limiter: LoginRateLimiter,
    config: AuthConfig,
    /// Verified against when the email resolves to no principal, so
    /// unknown-email and wrong-password responses take the same time.
    dummy_hash: String,
}

impl<C, S, O, M> AuthGateway<C, S, O, M>
where
    C: ClinicRepository,
    S: StaffRepository,
    O: OtpRepository,
    M: OtpMailer,
{
    pub fn new(
        clinics: C,
        staff: S,
        otp_repo: O,
        mailer: M,
        config: AuthConfig,
    ) -> CliniqResult<Self> {
        let tokens = TokenService::new(&config)?;
        let otp = OtpService::new(otp_repo, &config);
        let limiter = LoginRateLimiter::new(
            config.login_failure_limit,
            config.login_failure_window_secs,
        );
        let dummy_hash = password::dummy_hash(&config)?;
        Ok(Self {
            clinics,
            staff,
            otp,
            tokens,
            mailer,
            limiter,
            config,
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn otp(&self) -> &OtpService<O> {
        &self.otp
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// Register a clinic: the only self-service principal creation.
    /// Staff are onboarded by their clinic via [`Self::create_staff`].
    pub async fn register_clinic(&self, input: RegisterClinicInput) -> CliniqResult<Clinic> {
        password::validate_password_policy(&input.password).map_err(CliniqError::from)?;

        let email = normalize_email(&input.email);
        if self.find_principal(&email).await?.is_some() {
            return Err(CliniqError::AlreadyExists {
                entity: "principal".into(),
            });
        }

        let credential_hash =
            password::hash_password(&input.password, &self.config).map_err(CliniqError::from)?;

        let clinic = self
            .clinics
            .create(CreateClinic {
                name: input.name,
                email: email.clone(),
                credential_hash,
                phone: input.phone,
                address: input.address,
            })
            .await?;

        // Address confirmation is best-effort; registration stands
        // even if issuance or delivery fails.
        self.issue_and_deliver(&email, OtpPurpose::EmailVerification, None, None)
            .await;

        Ok(clinic)
    }

    /// Onboard a staff member under `clinic_id` (the guard-resolved
    /// tenant of the calling administrator).
    pub async fn create_staff(
        &self,
        clinic_id: Uuid,
        input: CreateStaffInput,
    ) -> CliniqResult<Staff> {
        password::validate_password_policy(&input.password).map_err(CliniqError::from)?;

        let email = normalize_email(&input.email);
        if self.find_principal(&email).await?.is_some() {
            return Err(CliniqError::AlreadyExists {
                entity: "principal".into(),
            });
        }

        let credential_hash =
            password::hash_password(&input.password, &self.config).map_err(CliniqError::from)?;

        self.staff
            .create(CreateStaff {
                clinic_id,
                full_name: input.full_name,
                uhid: input.uhid,
                email,
                credential_hash,
                profile_image: input.profile_image,
                detail: input.detail,
            })
            .await
    }

    // -------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------

    /// Single-factor password login.
    pub async fn login(&self, input: LoginInput) -> CliniqResult<LoginOutput> {
        let email = normalize_email(&input.email);
        let principal = self.authenticate_password(&email, &input.password).await?;

        let token = self.tokens.mint(&principal).map_err(CliniqError::from)?;
        Ok(LoginOutput {
            token,
            principal: PrincipalSummary::from(&principal),
        })
    }

    /// First step of the two-step login: password check, then an OTP
    /// goes out by mail. No token is minted here.
    pub async fn login_step1(&self, input: LoginInput) -> CliniqResult<()> {
        let email = normalize_email(&input.email);
        self.authenticate_password(&email, &input.password).await?;

        self.issue_and_deliver(
            &email,
            OtpPurpose::Login,
            input.client_ip,
            input.user_agent,
        )
        .await;
        Ok(())
    }

    /// Second step: redeem the login code. The pending record's
    /// existence is the proof that step one succeeded recently.
    pub async fn login_step2(&self, input: OtpLoginInput) -> CliniqResult<LoginOutput> {
        let email = normalize_email(&input.email);

        let record = self
            .otp
            .verify(&email, &input.code, OtpPurpose::Login)
            .await
            .map_err(CliniqError::from)?;

        let principal = self
            .find_principal(&email)
            .await?
            .ok_or_else(invalid_credentials)?;
        if !principal.active() {
            return Err(AuthError::AccountInactive.into());
        }

        let token = self.tokens.mint(&principal).map_err(CliniqError::from)?;
        self.otp.consume(&record).await?;

        Ok(LoginOutput {
            token,
            principal: PrincipalSummary::from(&principal),
        })
    }

    /// Single-factor login that bypasses the OTP step. Routed only in
    /// development deployments; the flag is re-checked here so the flow
    /// cannot be reached through a wiring mistake.
    pub async fn dev_login(&self, input: LoginInput) -> CliniqResult<LoginOutput> {
        if !self.config.dev_login_enabled {
            return Err(AuthError::DevLoginDisabled.into());
        }
        self.login(input).await
    }

    // -------------------------------------------------------------------
    // OTP resend and password reset
    // -------------------------------------------------------------------

    /// Resend a login code. Succeeds unconditionally so responses do
    /// not reveal whether the address is registered.
    pub async fn request_otp(&self, email: &str) -> CliniqResult<()> {
        let email = normalize_email(email);
        if self.find_principal(&email).await?.is_some() {
            self.issue_and_deliver(&email, OtpPurpose::Login, None, None)
                .await;
        }
        Ok(())
    }

    /// Start a password reset. Succeeds unconditionally, same as above.
    pub async fn forgot_password(&self, email: &str) -> CliniqResult<()> {
        let email = normalize_email(email);
        if self.find_principal(&email).await?.is_some() {
            self.issue_and_deliver(&email, OtpPurpose::PasswordReset, None, None)
                .await;
        }
        Ok(())
    }

    /// Complete a password reset with the mailed code.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> CliniqResult<()> {
        password::validate_password_policy(&input.new_password).map_err(CliniqError::from)?;

        let email = normalize_email(&input.email);
        let record = self
            .otp
            .verify(&email, &input.code, OtpPurpose::PasswordReset)
            .await
            .map_err(CliniqError::from)?;

        let principal = self
            .find_principal(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        let credential_hash = password::hash_password(&input.new_password, &self.config)
            .map_err(CliniqError::from)?;

        match &principal {
            Principal::Clinic(c) => self.clinics.update_credential(c.id, credential_hash).await?,
            Principal::Staff(s) => {
                self.staff
                    .update_credential(s.role, s.id, credential_hash)
                    .await?
            }
        }

        self.otp.consume(&record).await?;
        self.limiter.clear(&email);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Session introspection
    // -------------------------------------------------------------------

    /// Re-read the principal behind a validated token; catches
    /// deactivation and clinic reassignment since mint time.
    pub async fn whoami(&self, claims: &SessionClaims) -> CliniqResult<PrincipalSummary> {
        let principal = self.load_claims_principal(claims).await?;
        if !principal.active() {
            return Err(AuthError::AccountInactive.into());
        }
        Ok(PrincipalSummary::from(&principal))
    }

    /// Advisory logout: denylists the token's jti until expiry.
    pub fn logout(&self, claims: &SessionClaims) {
        self.tokens.revoke(claims);
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    /// Password check shared by every password-bearing flow: rate
    /// limit, lookup, verify (against the dummy hash when the lookup
    /// found nothing), activity check.
    async fn authenticate_password(
        &self,
        email: &str,
        submitted: &str,
    ) -> CliniqResult<Principal> {
        self.limiter.check(email)?;

        let principal = self.find_principal(email).await?;

        let stored_hash = principal
            .as_ref()
            .map(|p| p.credential_hash())
            .unwrap_or(self.dummy_hash.as_str());

        let verified = match password::verify_password(submitted, stored_hash) {
            Ok(v) => v,
            Err(AuthError::CorruptHash) => {
                tracing::error!(target: "audit", email, "stored credential hash is corrupt");
                false
            }
            Err(e) => return Err(e.into()),
        };

        let Some(principal) = principal else {
            self.limiter.record_failure(email);
            return Err(invalid_credentials());
        };
        if !verified {
            self.limiter.record_failure(email);
            return Err(invalid_credentials());
        }
        if !principal.active() {
            return Err(AuthError::AccountInactive.into());
        }

        self.limiter.clear(email);
        Ok(principal)
    }

    /// Look up a principal by lowercased email, scanning the clinic
    /// table first and then each staff role.
    async fn find_principal(&self, email: &str) -> CliniqResult<Option<Principal>> {
        match self.clinics.get_by_email(email).await {
            Ok(clinic) => return Ok(Some(Principal::Clinic(clinic))),
            Err(CliniqError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        for role in [StaffRole::Doctor, StaffRole::Nurse, StaffRole::Pharmacist] {
            match self.staff.get_by_email(role, email).await {
                Ok(staff) => return Ok(Some(Principal::Staff(staff))),
                Err(CliniqError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    async fn load_claims_principal(&self, claims: &SessionClaims) -> CliniqResult<Principal> {
        let id = claims.principal_id().map_err(CliniqError::from)?;
        let role = claims.role_tag().map_err(CliniqError::from)?;

        let principal = match role.staff_role() {
            None => self
                .clinics
                .get_by_id(id)
                .await
                .map(Principal::Clinic),
            Some(staff_role) => self
                .staff
                .get_by_id(staff_role, id)
                .await
                .map(Principal::Staff),
        };

        principal.map_err(|e| match e {
            CliniqError::NotFound { .. } => invalid_credentials(),
            other => other,
        })
    }

    /// Issue a code and hand it to the mail transport. Best-effort:
    /// issuance and delivery failures are logged, never surfaced, and a
    /// throttled re-request is treated as delivered.
    async fn issue_and_deliver(
        &self,
        email: &str,
        purpose: OtpPurpose,
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) {
        match self.otp.issue(email, purpose, client_ip, user_agent).await {
            Ok(IssueOutcome::Fresh(record)) => {
                if let Err(e) = self.mailer.send_otp(email, purpose, &record.code).await {
                    tracing::warn!(email, purpose = purpose.as_str(), error = %e, "OTP delivery failed");
                }
            }
            Ok(IssueOutcome::Throttled) => {}
            Err(e) => {
                tracing::warn!(email, purpose = purpose.as_str(), error = %e, "OTP issuance failed");
            }
        }
    }
}

fn invalid_credentials() -> CliniqError {
    AuthError::InvalidCredentials.into()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
