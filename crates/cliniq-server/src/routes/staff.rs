//! `/staff` handlers — staff management for clinic administrators.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use cliniq_access::Verb;
use cliniq_auth::gateway::CreateStaffInput;
use cliniq_auth::mailer::OtpMailer;
use cliniq_core::error::CliniqError;
use cliniq_core::models::role::StaffRole;
use cliniq_core::models::staff::{Shift, Staff, StaffDetail};
use cliniq_core::repository::{Pagination, StaffRepository};
use cliniq_core::scope::ResourceClass;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthClaims;
use crate::routes::authorize;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub role: String,
    pub full_name: String,
    pub uhid: String,
    pub email: String,
    pub password: String,
    pub profile_image: Option<String>,
    // Role-specific attributes; which ones are required depends on
    // `role` and is validated below.
    pub specialty: Option<String>,
    pub departments: Option<Vec<String>>,
    pub shift: Option<String>,
    pub head: Option<bool>,
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StaffQuery {
    pub role: String,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffView {
    pub id: String,
    pub clinic_id: String,
    pub full_name: String,
    pub uhid: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

impl From<Staff> for StaffView {
    fn from(s: Staff) -> Self {
        let role = s.login_role().as_str().to_string();
        let mut view = StaffView {
            id: s.id.to_string(),
            clinic_id: s.clinic_id.to_string(),
            full_name: s.full_name,
            uhid: s.uhid,
            role,
            email: s.email,
            active: s.active,
            specialty: None,
            departments: None,
            shift: None,
            head: None,
            specialization: None,
        };
        match s.detail {
            StaffDetail::Doctor { specialty } => view.specialty = Some(specialty),
            StaffDetail::Nurse {
                departments,
                shift,
                head,
            } => {
                view.departments = Some(departments);
                view.shift = Some(shift.as_str().to_string());
                view.head = Some(head);
            }
            StaffDetail::Pharmacist { specialization } => {
                view.specialization = Some(specialization)
            }
        }
        view
    }
}

fn validation(message: impl Into<String>) -> ApiError {
    ApiError(CliniqError::Validation {
        message: message.into(),
    })
}

fn detail_from_request(body: &CreateStaffRequest) -> Result<StaffDetail, ApiError> {
    match body.role.as_str() {
        "doctor" => Ok(StaffDetail::Doctor {
            specialty: body
                .specialty
                .clone()
                .ok_or_else(|| validation("doctors require a specialty"))?,
        }),
        "nurse" => {
            let shift = body
                .shift
                .as_deref()
                .ok_or_else(|| validation("nurses require a shift"))?;
            Ok(StaffDetail::Nurse {
                departments: body.departments.clone().unwrap_or_default(),
                shift: Shift::parse(shift)
                    .ok_or_else(|| validation(format!("unknown shift: {shift}")))?,
                head: body.head.unwrap_or(false),
            })
        }
        "pharmacist" => Ok(StaffDetail::Pharmacist {
            specialization: body
                .specialization
                .clone()
                .ok_or_else(|| validation("pharmacists require a specialization"))?,
        }),
        other => Err(validation(format!("unknown staff role: {other}"))),
    }
}

pub async fn create<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Json(body): Json<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<StaffView>)> {
    let grant = authorize(&state, &claims, Verb::Create, ResourceClass::Staff).await?;
    let detail = detail_from_request(&body)?;

    let staff = state
        .gateway
        .create_staff(
            grant.clinic_id(),
            CreateStaffInput {
                full_name: body.full_name,
                uhid: body.uhid,
                email: body.email,
                password: body.password,
                profile_image: body.profile_image,
                detail,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(staff.into())))
}

pub async fn list<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Query(query): Query<StaffQuery>,
) -> ApiResult<Json<Value>> {
    let grant = authorize(&state, &claims, Verb::Read, ResourceClass::Staff).await?;

    let role = StaffRole::parse(&query.role)
        .ok_or_else(|| validation(format!("unknown staff role: {}", query.role)))?;
    let default = Pagination::default();
    let pagination = Pagination {
        offset: query.offset.unwrap_or(default.offset),
        limit: query.limit.unwrap_or(default.limit),
    };

    let page = state
        .staff
        .list(grant.clinic_id(), role, pagination)
        .await?;

    let items: Vec<StaffView> = page.items.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "items": items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}
