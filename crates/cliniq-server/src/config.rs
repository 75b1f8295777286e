//! Environment configuration.
//!
//! Read once at startup; a missing required variable aborts the process
//! with a non-zero exit through `anyhow` in `main`.

use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

use cliniq_auth::AuthConfig;
use cliniq_db::DbConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub auth: AuthConfig,
    pub mail_from: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let database = DbConfig {
            url: env::var("SURREALDB_URL").context("SURREALDB_URL must be set")?,
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "cliniq".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "main".to_string()),
            username: env::var("SURREALDB_USERNAME").unwrap_or_else(|_| "root".to_string()),
            password: env::var("SURREALDB_PASSWORD").unwrap_or_else(|_| "root".to_string()),
        };

        // The signing key is the one secret the service cannot start
        // without; length is enforced by the token service.
        let signing_key = env::var("TOKEN_SIGNING_KEY")
            .context("TOKEN_SIGNING_KEY must be set")?
            .into_bytes();

        let auth = AuthConfig {
            signing_key,
            token_ttl_secs: env_u64("TOKEN_TTL_SECS", 3600)?,
            refresh_window_secs: env_u64("TOKEN_REFRESH_WINDOW_SECS", 900)?,
            otp_ttl_secs: env_u64("OTP_TTL_SECS", 300)?,
            dev_login_enabled: env_flag("DEV_LOGIN_ENABLED"),
            ..Default::default()
        };

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@cliniq.local".to_string());

        Ok(Config {
            server: ServerConfig { host, port },
            database,
            auth,
            mail_from,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(val) => val.parse().with_context(|| format!("Failed to parse {key}")),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str) -> bool {
    matches!(
        env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
