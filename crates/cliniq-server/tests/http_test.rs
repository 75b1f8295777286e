//! End-to-end HTTP tests: the full router over in-memory SurrealDB,
//! driven with `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use cliniq_auth::AuthConfig;
use cliniq_auth::mailer::RecordingMailer;
use cliniq_server::{build_state, router};

fn test_config() -> AuthConfig {
    AuthConfig {
        signing_key: b"0123456789abcdef0123456789abcdef".to_vec(),
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        otp_reissue_interval_secs: 0,
        ..Default::default()
    }
}

async fn setup() -> (Router, RecordingMailer) {
    let db = surrealdb::engine::any::connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();

    let mailer = RecordingMailer::default();
    let state = build_state(db, mailer.clone(), test_config()).unwrap();
    (router(state), mailer)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register a clinic and return a logged-in admin token.
async fn register_and_login_clinic(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "role": "clinic",
            "name": "Sunrise Clinic",
            "email": email,
            "password": "Adm1n!Pass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "Adm1n!Pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Onboard a doctor under the admin's clinic.
async fn create_doctor(app: &Router, admin_token: &str, email: &str, uhid: &str) {
    let (status, _) = send(
        app,
        Method::POST,
        "/staff",
        Some(admin_token),
        Some(json!({
            "role": "doctor",
            "fullName": "Alice Doe",
            "uhid": uhid,
            "email": email,
            "password": "Str0ng!Pass1",
            "specialty": "cardiology",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Registration and login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_rejects_non_clinic_roles() {
    let (app, _) = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "role": "doctor",
            "name": "X",
            "email": "x@x.test",
            "password": "Str0ng!Pass1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _) = setup().await;
    register_and_login_clinic(&app, "admin@c.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "role": "clinic",
            "name": "Again",
            "email": "admin@c.test",
            "password": "Adm1n!Pass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_share_status_and_body() {
    let (app, _) = setup().await;
    register_and_login_clinic(&app, "admin@c.test").await;

    let (s1, b1) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@nowhere.test", "password": "anything" })),
    )
    .await;
    let (s2, b2) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@c.test", "password": "wrong" })),
    )
    .await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(b1, json!({ "error": "Invalid credentials" }));
    assert_eq!(b2, b1);
}

// ---------------------------------------------------------------------------
// Two-step login (end to end)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_step_login_over_http() {
    let (app, mailer) = setup().await;
    let admin = register_and_login_clinic(&app, "admin@c.test").await;
    create_doctor(&app, &admin, "alice@clinic.test", "DOC001").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login-step1",
        None,
        Some(json!({ "email": "alice@clinic.test", "password": "Str0ng!Pass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "otpSent": true }));

    let code = mailer.last_code_for("alice@clinic.test").unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login-step2",
        None,
        Some(json!({ "email": "alice@clinic.test", "otp": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "doctor");
    assert!(body["token"].as_str().is_some());

    // Replaying the consumed code fails generically.
    let code = mailer.last_code_for("alice@clinic.test").unwrap();
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login-step2",
        None,
        Some(json!({ "email": "alice@clinic.test", "otp": code })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid OTP code" }));
}

#[tokio::test]
async fn wrong_otp_is_unauthorized() {
    let (app, mailer) = setup().await;
    let admin = register_and_login_clinic(&app, "admin@c.test").await;
    create_doctor(&app, &admin, "alice@clinic.test", "DOC001").await;

    send(
        &app,
        Method::POST,
        "/auth/login-step1",
        None,
        Some(json!({ "email": "alice@clinic.test", "password": "Str0ng!Pass1" })),
    )
    .await;

    let real = mailer.last_code_for("alice@clinic.test").unwrap();
    let wrong = if real == "000000" { "999999" } else { "000000" };

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login-step2",
        None,
        Some(json!({ "email": "alice@clinic.test", "otp": wrong })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Password reset (end to end)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn password_reset_over_http() {
    let (app, mailer) = setup().await;
    register_and_login_clinic(&app, "admin@c.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "admin@c.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = mailer.last_code_for("admin@c.test").unwrap();
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/reset-password",
        None,
        Some(json!({
            "email": "admin@c.test",
            "otp": code,
            "newPassword": "N3w!Password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old credential dead, new one live.
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@c.test", "password": "Adm1n!Pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@c.test", "password": "N3w!Password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reset_with_bad_otp_is_a_bad_request() {
    let (app, _) = setup().await;
    register_and_login_clinic(&app, "admin@c.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/reset-password",
        None,
        Some(json!({
            "email": "admin@c.test",
            "otp": "000000",
            "newPassword": "N3w!Password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn forgot_password_answers_200_for_unknown_addresses() {
    let (app, mailer) = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "nobody@nowhere.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(mailer.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Tenant isolation and the guard (end to end)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cross_tenant_post_reads_are_not_found() {
    let (app, _) = setup().await;
    let token_a = register_and_login_clinic(&app, "a@c.test").await;
    let token_b = register_and_login_clinic(&app, "b@c.test").await;

    let (status, post_b) = send(
        &app,
        Method::POST,
        "/posts",
        Some(&token_b),
        Some(json!({ "title": "B-only", "body": "tenant B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_b_id = post_b["id"].as_str().unwrap().to_string();

    // Owner sees it.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/posts/{post_b_id}"),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The other tenant gets a 404, not a 403.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/posts/{post_b_id}"),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    // And disjoint listings.
    let (_, listing) = send(&app, Method::GET, "/posts", Some(&token_a), None).await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn client_supplied_clinic_id_is_overwritten() {
    let (app, _) = setup().await;
    let token_a = register_and_login_clinic(&app, "a@c.test").await;
    register_and_login_clinic(&app, "b@c.test").await;

    // The body names another clinic; the guard's value is stored.
    let (status, created) = send(
        &app,
        Method::POST,
        "/posts",
        Some(&token_a),
        Some(json!({
            "title": "x",
            "body": "y",
            "clinicId": "11111111-2222-3333-4444-555555555555",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(
        created["clinicId"], "11111111-2222-3333-4444-555555555555",
        "client clinic id must be ignored"
    );

    // The row is visible to its real tenant.
    let (_, listing) = send(&app, Method::GET, "/posts", Some(&token_a), None).await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn staff_management_is_clinic_only() {
    let (app, mailer) = setup().await;
    let admin = register_and_login_clinic(&app, "admin@c.test").await;
    create_doctor(&app, &admin, "alice@clinic.test", "DOC001").await;

    // Log the doctor in through the two-step flow.
    send(
        &app,
        Method::POST,
        "/auth/login-step1",
        None,
        Some(json!({ "email": "alice@clinic.test", "password": "Str0ng!Pass1" })),
    )
    .await;
    let code = mailer.last_code_for("alice@clinic.test").unwrap();
    let (_, login) = send(
        &app,
        Method::POST,
        "/auth/login-step2",
        None,
        Some(json!({ "email": "alice@clinic.test", "otp": code })),
    )
    .await;
    let doctor_token = login["token"].as_str().unwrap().to_string();

    // Doctors cannot list or create staff.
    let (status, _) = send(
        &app,
        Method::GET,
        "/staff?role=doctor",
        Some(&doctor_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The clinic sees exactly its own roster.
    let (status, listing) = send(
        &app,
        Method::GET,
        "/staff?role=doctor",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["uhid"], "DOC001");
}

// ---------------------------------------------------------------------------
// Session introspection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn me_reports_token_failures_with_codes() {
    let (app, _) = setup().await;
    let token = register_and_login_clinic(&app, "admin@c.test").await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "clinic");

    // No token at all.
    let (status, body) = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "code": "TOKEN_MALFORMED" }));

    // Garbage token.
    let (status, body) = send(&app, Method::GET, "/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "code": "TOKEN_MALFORMED" }));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (app, _) = setup().await;
    let token = register_and_login_clinic(&app, "admin@c.test").await;

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "code": "TOKEN_EXPIRED" }));
}

#[tokio::test]
async fn dev_login_route_is_absent_by_default() {
    let (app, _) = setup().await;
    register_and_login_clinic(&app, "admin@c.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/dev-login",
        None,
        Some(json!({ "email": "admin@c.test", "password": "Adm1n!Pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
