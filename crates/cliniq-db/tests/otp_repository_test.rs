//! Integration tests for the OTP record store: pending uniqueness,
//! guarded transitions, attempt accounting, and the TTL sweep.

use chrono::{Duration, Utc};
use cliniq_core::error::CliniqError;
use cliniq_core::models::otp::{IssueOtp, OtpPurpose, OtpStatus};
use cliniq_core::repository::OtpRepository;
use cliniq_db::repository::SurrealOtpRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> SurrealOtpRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();
    SurrealOtpRepository::new(db)
}

fn issue_input(email: &str, code: &str, purpose: OtpPurpose) -> IssueOtp {
    IssueOtp {
        email: email.into(),
        code: code.into(),
        purpose,
        expires_at: Utc::now() + Duration::seconds(300),
        client_ip: None,
        user_agent: None,
    }
}

#[tokio::test]
async fn issue_creates_a_pending_record() {
    let repo = setup().await;

    let record = repo
        .issue(issue_input("a@x.test", "314159", OtpPurpose::Login))
        .await
        .unwrap();

    assert_eq!(record.status, OtpStatus::Pending);
    assert_eq!(record.attempts, 0);
    assert_eq!(record.code, "314159");
    assert!(record.verified_at.is_none());
}

#[tokio::test]
async fn reissue_expires_the_previous_pending_record() {
    let repo = setup().await;

    let first = repo
        .issue(issue_input("a@x.test", "111111", OtpPurpose::Login))
        .await
        .unwrap();
    let second = repo
        .issue(issue_input("a@x.test", "222222", OtpPurpose::Login))
        .await
        .unwrap();

    // Exactly one pending record survives, and it is the new one.
    let pending = repo
        .find_pending("a@x.test", OtpPurpose::Login)
        .await
        .unwrap()
        .expect("a pending record");
    assert_eq!(pending.id, second.id);
    assert_ne!(pending.id, first.id);
    assert_eq!(pending.code, "222222");
}

#[tokio::test]
async fn purposes_do_not_interfere() {
    let repo = setup().await;

    repo.issue(issue_input("a@x.test", "111111", OtpPurpose::Login))
        .await
        .unwrap();
    repo.issue(issue_input("a@x.test", "222222", OtpPurpose::PasswordReset))
        .await
        .unwrap();

    // One pending per purpose.
    assert!(
        repo.find_pending("a@x.test", OtpPurpose::Login)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        repo.find_pending("a@x.test", OtpPurpose::PasswordReset)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn increment_attempts_persists_the_count() {
    let repo = setup().await;

    let record = repo
        .issue(issue_input("a@x.test", "314159", OtpPurpose::Login))
        .await
        .unwrap();

    let once = repo.increment_attempts(record.id).await.unwrap();
    assert_eq!(once.attempts, 1);
    let twice = repo.increment_attempts(record.id).await.unwrap();
    assert_eq!(twice.attempts, 2);
}

#[tokio::test]
async fn increment_requires_a_pending_record() {
    let repo = setup().await;

    let record = repo
        .issue(issue_input("a@x.test", "314159", OtpPurpose::Login))
        .await
        .unwrap();
    repo.mark_expired(record.id).await.unwrap();

    let result = repo.increment_attempts(record.id).await;
    assert!(matches!(result, Err(CliniqError::NotFound { .. })));
}

#[tokio::test]
async fn transitions_are_guarded() {
    let repo = setup().await;

    let record = repo
        .issue(issue_input("a@x.test", "314159", OtpPurpose::Login))
        .await
        .unwrap();

    // pending → used is not a legal edge; the record must not move.
    repo.mark_used(record.id).await.unwrap();
    let pending = repo
        .find_pending("a@x.test", OtpPurpose::Login)
        .await
        .unwrap();
    assert!(pending.is_some(), "pending record must not jump to used");

    // pending → verified → used is the legal path.
    let verified = repo.mark_verified(record.id).await.unwrap();
    assert_eq!(verified.status, OtpStatus::Verified);
    assert!(verified.verified_at.is_some());

    repo.mark_used(record.id).await.unwrap();
    // Re-marking used is idempotent.
    repo.mark_used(record.id).await.unwrap();

    let latest = repo
        .latest("a@x.test", OtpPurpose::Login)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.status, OtpStatus::Used);
}

#[tokio::test]
async fn terminal_records_never_revert() {
    let repo = setup().await;

    let record = repo
        .issue(issue_input("a@x.test", "314159", OtpPurpose::Login))
        .await
        .unwrap();
    repo.mark_expired(record.id).await.unwrap();

    // Neither verification nor expiry re-marking touches it.
    assert!(repo.mark_verified(record.id).await.is_err());
    repo.mark_expired(record.id).await.unwrap();

    let latest = repo
        .latest("a@x.test", OtpPurpose::Login)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.status, OtpStatus::Expired);
}

#[tokio::test]
async fn sweep_removes_only_records_past_grace() {
    let repo = setup().await;

    // One record long past expiry, one fresh.
    repo.issue(IssueOtp {
        email: "old@x.test".into(),
        code: "111111".into(),
        purpose: OtpPurpose::Login,
        expires_at: Utc::now() - Duration::seconds(3600),
        client_ip: None,
        user_agent: None,
    })
    .await
    .unwrap();
    repo.issue(issue_input("new@x.test", "222222", OtpPurpose::Login))
        .await
        .unwrap();

    let removed = repo.sweep(300).await.unwrap();
    assert_eq!(removed, 1);

    assert!(
        repo.latest("old@x.test", OtpPurpose::Login)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.latest("new@x.test", OtpPurpose::Login)
            .await
            .unwrap()
            .is_some()
    );
}
