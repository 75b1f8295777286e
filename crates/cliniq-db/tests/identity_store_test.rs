//! Integration tests for the identity store using in-memory SurrealDB.

use cliniq_core::error::CliniqError;
use cliniq_core::models::clinic::CreateClinic;
use cliniq_core::models::role::StaffRole;
use cliniq_core::models::staff::{CreateStaff, Shift, StaffDetail};
use cliniq_core::repository::{ClinicRepository, Pagination, StaffRepository};
use cliniq_db::repository::{SurrealClinicRepository, SurrealStaffRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();
    db
}

fn doctor_input(clinic_id: Uuid, email: &str, uhid: &str) -> CreateStaff {
    CreateStaff {
        clinic_id,
        full_name: "Alice Doe".into(),
        uhid: uhid.into(),
        email: email.into(),
        credential_hash: "$argon2id$stub".into(),
        profile_image: None,
        detail: StaffDetail::Doctor {
            specialty: "cardiology".into(),
        },
    }
}

#[tokio::test]
async fn create_and_get_clinic() {
    let db = setup().await;
    let repo = SurrealClinicRepository::new(db);

    let clinic = repo
        .create(CreateClinic {
            name: "Sunrise Clinic".into(),
            email: "Admin@Sunrise.Test".into(),
            credential_hash: "$argon2id$stub".into(),
            phone: Some("555-0100".into()),
            address: None,
        })
        .await
        .unwrap();

    // Email is lowercased on the way in.
    assert_eq!(clinic.email, "admin@sunrise.test");
    assert!(clinic.active);

    let fetched = repo.get_by_id(clinic.id).await.unwrap();
    assert_eq!(fetched.id, clinic.id);
    assert_eq!(fetched.name, "Sunrise Clinic");

    // Lookup is case-insensitive because both sides are lowercased.
    let by_email = repo.get_by_email("ADMIN@sunrise.test").await.unwrap();
    assert_eq!(by_email.id, clinic.id);
}

#[tokio::test]
async fn duplicate_clinic_email_conflicts() {
    let db = setup().await;
    let repo = SurrealClinicRepository::new(db);

    repo.create(CreateClinic {
        name: "First".into(),
        email: "same@clinic.test".into(),
        credential_hash: "h".into(),
        phone: None,
        address: None,
    })
    .await
    .unwrap();

    let result = repo
        .create(CreateClinic {
            name: "Second".into(),
            email: "SAME@clinic.test".into(),
            credential_hash: "h".into(),
            phone: None,
            address: None,
        })
        .await;

    assert!(matches!(result, Err(CliniqError::AlreadyExists { .. })));
}

#[tokio::test]
async fn clinic_deactivation_is_soft() {
    let db = setup().await;
    let repo = SurrealClinicRepository::new(db);

    let clinic = repo
        .create(CreateClinic {
            name: "C".into(),
            email: "c@clinic.test".into(),
            credential_hash: "h".into(),
            phone: None,
            address: None,
        })
        .await
        .unwrap();

    let off = repo.set_active(clinic.id, false).await.unwrap();
    assert!(!off.active);

    // Still present in the store.
    assert!(repo.get_by_id(clinic.id).await.is_ok());
}

#[tokio::test]
async fn create_staff_normalizes_email_and_uhid() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);
    let clinic_id = Uuid::new_v4();

    let staff = repo
        .create(doctor_input(clinic_id, "Alice@Clinic.Test", "doc001"))
        .await
        .unwrap();

    assert_eq!(staff.email, "alice@clinic.test");
    assert_eq!(staff.uhid, "DOC001");
    assert_eq!(staff.role, StaffRole::Doctor);
    assert_eq!(staff.clinic_id, clinic_id);

    let by_uhid = repo.get_by_uhid(StaffRole::Doctor, "doc001").await.unwrap();
    assert_eq!(by_uhid.id, staff.id);
}

#[tokio::test]
async fn nurse_detail_roundtrips() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(CreateStaff {
            clinic_id: Uuid::new_v4(),
            full_name: "Nina Ward".into(),
            uhid: "NUR001".into(),
            email: "nina@clinic.test".into(),
            credential_hash: "h".into(),
            profile_image: None,
            detail: StaffDetail::Nurse {
                departments: vec!["icu".into(), "er".into()],
                shift: Shift::Night,
                head: true,
            },
        })
        .await
        .unwrap();

    match &staff.detail {
        StaffDetail::Nurse {
            departments,
            shift,
            head,
        } => {
            assert_eq!(departments, &vec!["icu".to_string(), "er".to_string()]);
            assert_eq!(*shift, Shift::Night);
            assert!(*head);
        }
        other => panic!("expected nurse detail, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_uhid_conflicts_within_role() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);
    let clinic_id = Uuid::new_v4();

    repo.create(doctor_input(clinic_id, "a@clinic.test", "DOC001"))
        .await
        .unwrap();

    let result = repo
        .create(doctor_input(clinic_id, "b@clinic.test", "doc001"))
        .await;

    assert!(matches!(result, Err(CliniqError::AlreadyExists { .. })));
}

#[tokio::test]
async fn duplicate_email_conflicts_within_role() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);
    let clinic_id = Uuid::new_v4();

    repo.create(doctor_input(clinic_id, "dup@clinic.test", "DOC001"))
        .await
        .unwrap();

    let result = repo
        .create(doctor_input(clinic_id, "dup@clinic.test", "DOC002"))
        .await;

    assert!(matches!(result, Err(CliniqError::AlreadyExists { .. })));
}

#[tokio::test]
async fn update_credential_replaces_the_hash() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(doctor_input(Uuid::new_v4(), "rehash@clinic.test", "DOC009"))
        .await
        .unwrap();

    repo.update_credential(StaffRole::Doctor, staff.id, "$argon2id$new".into())
        .await
        .unwrap();

    let fetched = repo.get_by_id(StaffRole::Doctor, staff.id).await.unwrap();
    assert_eq!(fetched.credential_hash, "$argon2id$new");
}

#[tokio::test]
async fn staff_listing_is_clinic_scoped() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);
    let clinic_a = Uuid::new_v4();
    let clinic_b = Uuid::new_v4();

    for i in 0..3 {
        repo.create(doctor_input(
            clinic_a,
            &format!("a{i}@clinic.test"),
            &format!("DOCA{i}"),
        ))
        .await
        .unwrap();
    }
    repo.create(doctor_input(clinic_b, "b0@clinic.test", "DOCB0"))
        .await
        .unwrap();

    let page_a = repo
        .list(clinic_a, StaffRole::Doctor, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page_a.total, 3);
    assert!(page_a.items.iter().all(|s| s.clinic_id == clinic_a));

    let page_b = repo
        .list(clinic_b, StaffRole::Doctor, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page_b.total, 1);
}

#[tokio::test]
async fn deactivated_staff_remain_readable() {
    let db = setup().await;
    let repo = SurrealStaffRepository::new(db);

    let staff = repo
        .create(doctor_input(Uuid::new_v4(), "off@clinic.test", "DOC100"))
        .await
        .unwrap();

    let off = repo
        .set_active(StaffRole::Doctor, staff.id, false)
        .await
        .unwrap();
    assert!(!off.active);

    let fetched = repo.get_by_id(StaffRole::Doctor, staff.id).await.unwrap();
    assert!(!fetched.active);
}
