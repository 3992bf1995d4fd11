//! Dream journal service — binary entrypoint.
//! Boots the Axum HTTP server, wiring the LLM client, routes and metrics.

use dream_journal_analyzer::{
    ai_bootstrap::AiRuntime, api, debug::dev_logging_enabled, metrics::Metrics,
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - DREAM_DEV_LOG=1
fn enable_dev_tracing() {
    if !dev_logging_enabled() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("emotion=info,dream_journal_analyzer=info,warn"));

    // Shuttle may already have installed a subscriber; ignore that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let ai = AiRuntime::load_default()?;
    let metrics = Metrics::init(ai.cfg.daily_limit)?;

    if std::env::var("AI_QUICK_PROBE").is_ok_and(|v| v == "1") {
        ai.quick_probe().await;
    }

    let state = api::AppState::new(ai.client.clone());
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
