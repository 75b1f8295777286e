//! Shared application state.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use cliniq_access::AccessGuard;
use cliniq_auth::gateway::AuthGateway;
use cliniq_auth::mailer::OtpMailer;
use cliniq_auth::AuthConfig;
use cliniq_core::error::CliniqResult;
use cliniq_db::repository::{
    SurrealClinicRepository, SurrealOtpRepository, SurrealPostRepository, SurrealStaffRepository,
};

pub type Clinics = SurrealClinicRepository<Any>;
pub type StaffStore = SurrealStaffRepository<Any>;
pub type OtpStore = SurrealOtpRepository<Any>;
pub type Posts = SurrealPostRepository<Any>;
pub type Gateway<M> = AuthGateway<Clinics, StaffStore, OtpStore, M>;
pub type Guard = AccessGuard<Clinics, StaffStore>;

/// Application state, generic over the mail transport so tests can
/// plug in a recording one.
pub struct AppState<M: OtpMailer> {
    pub gateway: Arc<Gateway<M>>,
    pub guard: Arc<Guard>,
    pub posts: Arc<Posts>,
    pub staff: Arc<StaffStore>,
    pub dev_login_enabled: bool,
}

impl<M: OtpMailer> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            guard: Arc::clone(&self.guard),
            posts: Arc::clone(&self.posts),
            staff: Arc::clone(&self.staff),
            dev_login_enabled: self.dev_login_enabled,
        }
    }
}

/// Wire repositories and services over one database handle.
pub fn build_state<M: OtpMailer>(
    db: Surreal<Any>,
    mailer: M,
    config: AuthConfig,
) -> CliniqResult<AppState<M>> {
    let dev_login_enabled = config.dev_login_enabled;

    let gateway = AuthGateway::new(
        SurrealClinicRepository::new(db.clone()),
        SurrealStaffRepository::new(db.clone()),
        SurrealOtpRepository::new(db.clone()),
        mailer,
        config,
    )?;

    let guard = AccessGuard::new(
        SurrealClinicRepository::new(db.clone()),
        SurrealStaffRepository::new(db.clone()),
    );

    Ok(AppState {
        gateway: Arc::new(gateway),
        guard: Arc::new(guard),
        posts: Arc::new(SurrealPostRepository::new(db.clone())),
        staff: Arc::new(SurrealStaffRepository::new(db)),
        dev_login_enabled,
    })
}
