use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cliniq_auth::mailer::TracingMailer;
use cliniq_server::{Config, build_state, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cliniq=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let config = Config::from_env()?;

    let db = cliniq_db::connect(&config.database)
        .await
        .context("Failed to connect to SurrealDB")?;
    cliniq_db::run_migrations(&db)
        .await
        .context("Failed to run migrations")?;

    let mailer = TracingMailer {
        from: config.mail_from.clone(),
    };
    let state = build_state(db, mailer, config.auth.clone())
        .context("Failed to build application state")?;

    // Background sweep: stale OTP records, closed rate-limit windows,
    // and naturally expired denylist entries.
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match sweeper.gateway.otp().sweep().await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "swept stale OTP records"),
                Err(e) => tracing::warn!(error = %e, "OTP sweep failed"),
            }
            sweeper.gateway.tokens().prune_revoked();
            sweeper.gateway.limiter().prune();
        }
    });

    let app = router(state);
    let addr = config.server_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!(%addr, "cliniq-server listening");

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
