//! HTTP routes, grouped by surface.

pub mod auth;
pub mod posts;
pub mod staff;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use cliniq_access::{Grant, Verb};
use cliniq_auth::SessionClaims;
use cliniq_auth::mailer::OtpMailer;
use cliniq_core::error::CliniqError;
use cliniq_core::scope::ResourceClass;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the full application router.
///
/// The developer-login route exists only when the deployment enables
/// it; everywhere else the path does not resolve at all.
pub fn router<M: OtpMailer + 'static>(state: AppState<M>) -> Router {
    let mut auth_routes = Router::new()
        .route("/register", post(auth::register::<M>))
        .route("/login", post(auth::login::<M>))
        .route("/login-step1", post(auth::login_step1::<M>))
        .route("/login-step2", post(auth::login_step2::<M>))
        .route("/request-otp", post(auth::request_otp::<M>))
        .route("/forgot-password", post(auth::forgot_password::<M>))
        .route("/reset-password", post(auth::reset_password::<M>))
        .route("/refresh", post(auth::refresh::<M>))
        .route("/logout", post(auth::logout::<M>))
        .route("/me", get(auth::me::<M>));

    if state.dev_login_enabled {
        auth_routes = auth_routes.route("/dev-login", post(auth::dev_login::<M>));
    }

    Router::new()
        .nest("/auth", auth_routes)
        .route("/posts", get(posts::list::<M>).post(posts::create::<M>))
        .route(
            "/posts/{id}",
            get(posts::get_one::<M>)
                .put(posts::update::<M>)
                .delete(posts::remove::<M>),
        )
        .route("/staff", get(staff::list::<M>).post(staff::create::<M>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the guard for a claims-bearing request: unpack the token
/// fields, then authorize the verb against the resource class.
pub(crate) async fn authorize<M: OtpMailer>(
    state: &AppState<M>,
    claims: &SessionClaims,
    verb: Verb,
    class: ResourceClass,
) -> Result<Grant, ApiError> {
    let principal_id = claims.principal_id().map_err(CliniqError::from)?;
    let role = claims.role_tag().map_err(CliniqError::from)?;
    let claimed_cid = claims.clinic_id().map_err(CliniqError::from)?;

    state
        .guard
        .authorize(principal_id, role, claimed_cid, verb, class)
        .await
        .map_err(ApiError::from)
}
