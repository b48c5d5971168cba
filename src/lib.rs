pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use tokio::sync::watch;

use crate::core::{config::Settings, policy_cache::PolicyCache, state::AppState, telemetry};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let policy_cache =
        PolicyCache::new(Duration::from_secs(settings.engine().policy_cache_ttl_seconds));
    let state = AppState::new(settings, db_pool, policy_cache);

    if let Err(err) = core::bootstrap::ensure_defaults(&state).await {
        tracing::error!(error = %err, "Failed to bootstrap permission catalog and first admin");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(tasks::scheduler::run(state.clone(), shutdown_rx));

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "ExamGate API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }
    if let Err(err) = sweeper.await {
        tracing::error!(error = %err, "Attempt sweeper join failed");
    }

    result?;

    Ok(())
}
