use anyhow::Context;

mod app;
mod auth;
mod config;
mod dashboard;
mod detection;
mod error;
mod extract;
mod ledger;
mod middleware;
mod promotions;
mod state;
mod store;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "canpoints=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; admin routes are unauthenticated");
    }

    let (app_state, pg) = AppState::init(config).await?;

    sqlx::migrate!("./migrations")
        .run(pg.pool())
        .await
        .context("run migrations")?;

    tracing::info!(
        detector = app_state.detector.name(),
        points_per_can = app_state.config.points_per_can,
        "state initialized"
    );

    app::serve(app::build_app(app_state)).await
}
