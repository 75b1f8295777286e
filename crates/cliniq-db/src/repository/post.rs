//! SurrealDB implementation of [`PostRepository`].
//!
//! Every read calls [`QuerySpec::clinic_id`] before building a query;
//! a spec with an empty clinic slot never reaches the database. The
//! owner predicate, when present, is ANDed onto the clinic predicate.
//! On writes the stored clinic id comes from the [`WriteSpec`], so a
//! client-supplied value can never land in the row.

use chrono::{DateTime, Utc};
use cliniq_core::error::CliniqResult;
use cliniq_core::models::post::{CreatePost, Post, UpdatePost};
use cliniq_core::models::role::Role;
use cliniq_core::repository::{PaginatedResult, Pagination, PostRepository};
use cliniq_core::scope::{QuerySpec, WriteSpec};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PostRow {
    record_id: String,
    clinic_id: String,
    author_id: String,
    author_role: String,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn try_into_post(self) -> Result<Post, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid post UUID: {e}")))?;
        let clinic_id = Uuid::parse_str(&self.clinic_id)
            .map_err(|e| DbError::Decode(format!("invalid clinic UUID: {e}")))?;
        let author_id = Uuid::parse_str(&self.author_id)
            .map_err(|e| DbError::Decode(format!("invalid author UUID: {e}")))?;
        let author_role = Role::parse(&self.author_role)
            .ok_or_else(|| DbError::Decode(format!("unknown role: {}", self.author_role)))?;
        Ok(Post {
            id,
            clinic_id,
            author_id,
            author_role,
            title: self.title,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the posts resource store.
#[derive(Clone)]
pub struct SurrealPostRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPostRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, clinic_id: Uuid, id: Uuid) -> CliniqResult<Post> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('post', $id) \
                 WHERE clinic_id = $clinic_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("clinic_id", clinic_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.try_into_post()?)
    }
}

impl<C: Connection> PostRepository for SurrealPostRepository<C> {
    async fn create(
        &self,
        spec: &WriteSpec,
        author_id: Uuid,
        author_role: Role,
        input: CreatePost,
    ) -> CliniqResult<Post> {
        let id = Uuid::new_v4();
        let clinic_id = spec.clinic_id();

        self.db
            .query(
                "CREATE type::record('post', $id) SET \
                 clinic_id = $clinic_id, \
                 author_id = $author_id, \
                 author_role = $author_role, \
                 title = $title, body = $body \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("clinic_id", clinic_id.to_string()))
            .bind(("author_id", author_id.to_string()))
            .bind(("author_role", author_role.as_str().to_string()))
            .bind(("title", input.title))
            .bind(("body", input.body))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        self.fetch(clinic_id, id).await
    }

    async fn get(&self, spec: &QuerySpec, id: Uuid) -> CliniqResult<Post> {
        let clinic_id = spec.clinic_id()?;
        let post = self.fetch(clinic_id, id).await?;

        if let Some(owner) = spec.owner_doctor() {
            if post.author_id != owner {
                // Hidden, not forbidden: same answer as a missing row.
                return Err(DbError::NotFound {
                    entity: "post".into(),
                    id: id.to_string(),
                }
                .into());
            }
        }

        Ok(post)
    }

    async fn list(
        &self,
        spec: &QuerySpec,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Post>> {
        let clinic_id = spec.clinic_id()?.to_string();
        let owner = spec.owner_doctor().map(|o| o.to_string());

        let (count_query, list_query) = if owner.is_some() {
            (
                "SELECT count() AS total FROM post \
                 WHERE clinic_id = $clinic_id AND author_id = $owner \
                 GROUP ALL",
                "SELECT meta::id(id) AS record_id, * FROM post \
                 WHERE clinic_id = $clinic_id AND author_id = $owner \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
        } else {
            (
                "SELECT count() AS total FROM post \
                 WHERE clinic_id = $clinic_id GROUP ALL",
                "SELECT meta::id(id) AS record_id, * FROM post \
                 WHERE clinic_id = $clinic_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
        };

        let mut count_result = self
            .db
            .query(count_query)
            .bind(("clinic_id", clinic_id.clone()))
            .bind(("owner", owner.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(list_query)
            .bind(("clinic_id", clinic_id))
            .bind(("owner", owner))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(PostRow::try_into_post)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update(&self, spec: &QuerySpec, id: Uuid, input: UpdatePost) -> CliniqResult<Post> {
        // Visibility (clinic + owner predicates) is checked first; the
        // UPDATE then re-applies the clinic predicate itself.
        let existing = self.get(spec, id).await?;

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.body.is_some() {
            sets.push("body = $body");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('post', $id) SET {} \
             WHERE clinic_id = $clinic_id RETURN NONE",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("clinic_id", existing.clinic_id.to_string()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(body) = input.body {
            builder = builder.bind(("body", body));
        }

        builder.await.map_err(DbError::from)?;

        self.get(spec, id).await
    }

    async fn delete(&self, spec: &QuerySpec, id: Uuid) -> CliniqResult<()> {
        // Resolve visibility first so a cross-tenant delete reports
        // NotFound rather than silently matching nothing.
        let existing = self.get(spec, id).await?;

        self.db
            .query(
                "DELETE type::record('post', $id) \
                 WHERE clinic_id = $clinic_id",
            )
            .bind(("id", id.to_string()))
            .bind(("clinic_id", existing.clinic_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
