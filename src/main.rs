use anyhow::Context;
use platemate::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("platemate=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env().context("failed to load configuration")?;
    info!(
        bind = %settings.bind,
        assets = %settings.assets.assets_dir.display(),
        "Starting PlateMate"
    );

    let banner = settings.assets.banner_path();
    if !banner.is_file() {
        warn!(path = %banner.display(), "Banner image not found");
    }

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);
    let state = AppState::new(orchestrator, settings.assets.clone(), settings.session_idle);
    platemate::web::sessions::spawn_sweeper(state.sessions.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!("Listening on http://{}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
