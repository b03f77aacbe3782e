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

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::tasks::grading::GradingPipeline;

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; grading events will not be published");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let grading = GradingPipeline::from_settings(&settings, db_pool.clone(), redis.clone())?;
    let state = AppState::new(settings, db_pool, redis.clone(), grading.clone());

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        max_concurrency = state.settings().grading().max_concurrency,
        "Worksheet grading API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    let in_flight = grading.supervisor().in_flight();
    if in_flight > 0 {
        tracing::info!(in_flight, "Waiting for grading workers to finish");
    }
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, grading.supervisor().drain()).await.is_err() {
        tracing::warn!(
            timeout_seconds = WORKER_DRAIN_TIMEOUT.as_secs(),
            "Grading workers still running at shutdown; abandoning them"
        );
    }

    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}
