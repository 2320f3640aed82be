//! hall-server entry point

use anyhow::Context;
use hall_server::api;
use hall_server::auth::StaticTokenVerifier;
use hall_server::core::{AppState, Config};
use hall_server::notify::LogNotifier;
use hall_server::store::HallStore;
use hall_server::utils::logger;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;
    logger::init_logger_with_file(Some(&config.log_level), Some(&config.work_dir));

    info!(
        environment = %config.environment,
        port = config.http_port,
        "Starting hall-server"
    );

    let store = HallStore::open(config.db_path()).context("Failed to open database")?;

    let verifier = Arc::new(StaticTokenVerifier::from_pairs(&config.auth_tokens));
    let state = AppState::new(store, verifier, Arc::new(LogNotifier));

    // First-deployment bootstrap: grant ADMIN so further grants can be
    // made through the API
    if let Some(uid) = &config.bootstrap_admin_uid {
        state
            .gate
            .grant(uid, "ADMIN", None)
            .context("Bootstrap admin grant failed")?;
    }

    let router = api::router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr = %addr, "Listening");
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
