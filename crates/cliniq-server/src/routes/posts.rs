//! `/posts` handlers — the resource-router surface for the posts
//! class. Every handler goes through the access guard; the specs it
//! yields are passed to storage untouched.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use cliniq_access::Verb;
use cliniq_auth::mailer::OtpMailer;
use cliniq_core::models::post::{CreatePost, Post, UpdatePost};
use cliniq_core::repository::{Pagination, PostRepository};
use cliniq_core::scope::ResourceClass;

use crate::error::ApiResult;
use crate::extract::AuthClaims;
use crate::routes::authorize;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    /// Accepted and ignored: the guard's clinic id is the one stored.
    pub clinic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            offset: self.offset.unwrap_or(default.offset),
            limit: self.limit.unwrap_or(default.limit),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub clinic_id: String,
    pub author_id: String,
    pub author_role: String,
    pub title: String,
    pub body: String,
}

impl From<Post> for PostView {
    fn from(p: Post) -> Self {
        PostView {
            id: p.id.to_string(),
            clinic_id: p.clinic_id.to_string(),
            author_id: p.author_id.to_string(),
            author_role: p.author_role.as_str().to_string(),
            title: p.title,
            body: p.body,
        }
    }
}

pub async fn create<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Json(body): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    let grant = authorize(&state, &claims, Verb::Create, ResourceClass::Posts).await?;

    let post = state
        .posts
        .create(
            &grant.write_spec(),
            grant.principal_id(),
            grant.role(),
            CreatePost {
                title: body.title,
                body: body.body,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

pub async fn get_one<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PostView>> {
    let grant = authorize(&state, &claims, Verb::Read, ResourceClass::Posts).await?;
    let post = state.posts.get(&grant.query_spec(), id).await?;
    Ok(Json(post.into()))
}

pub async fn list<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let grant = authorize(&state, &claims, Verb::Read, ResourceClass::Posts).await?;
    let page = state
        .posts
        .list(&grant.query_spec(), query.pagination())
        .await?;

    let items: Vec<PostView> = page.items.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "items": items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

pub async fn update<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> ApiResult<Json<PostView>> {
    let grant = authorize(&state, &claims, Verb::Update, ResourceClass::Posts).await?;
    let post = state
        .posts
        .update(
            &grant.query_spec(),
            id,
            UpdatePost {
                title: body.title,
                body: body.body,
            },
        )
        .await?;
    Ok(Json(post.into()))
}

pub async fn remove<M: OtpMailer>(
    State(state): State<AppState<M>>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let grant = authorize(&state, &claims, Verb::Delete, ResourceClass::Posts).await?;
    state.posts.delete(&grant.query_spec(), id).await?;
    Ok(Json(json!({ "ok": true })))
}
