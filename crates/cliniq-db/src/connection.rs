//! SurrealDB connection management.
//!
//! Production deployments connect over WebSocket; tests pass a
//! `mem://` URL and get the embedded engine. The `Any` engine keeps the
//! rest of the crate generic over both.

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Endpoint URL, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials; ignored for the embedded engine.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "cliniq".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Open a connection, authenticate when the engine requires it, and
/// select the configured namespace and database.
pub async fn connect(config: &DbConfig) -> Result<Surreal<Any>, DbError> {
    info!(
        url = %config.url,
        namespace = %config.namespace,
        database = %config.database,
        "Connecting to SurrealDB"
    );

    let db = surrealdb::engine::any::connect(&config.url).await?;

    if !config.url.starts_with("mem:") {
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
    }

    db.use_ns(&config.namespace)
        .use_db(&config.database)
        .await?;

    info!("Connected to SurrealDB");

    Ok(db)
}
