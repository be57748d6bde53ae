use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blend_api::{
    api::{create_router, AppState},
    config::Config,
    models::Method,
    services::{
        sources::{CandidateSource, HttpSource, SnapshotSource},
        RecommendationEngine,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "blend_api=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let timeout = Duration::from_millis(config.upstream_timeout_ms);

    let affinity = build_source(
        Method::Affinity,
        config.affinity_url.as_deref(),
        &config.affinity_snapshot_path,
        timeout,
    )
    .await?;
    let content = build_source(
        Method::Content,
        config.content_url.as_deref(),
        &config.content_snapshot_path,
        timeout,
    )
    .await?;

    let engine = RecommendationEngine::new(affinity, content, config.counter_pool_size);
    let addr = config.addr();
    let app = create_router(AppState::new(engine, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Remote scorer when a URL is configured, local snapshot otherwise
async fn build_source(
    method: Method,
    url: Option<&str>,
    snapshot_path: &str,
    timeout: Duration,
) -> anyhow::Result<Arc<dyn CandidateSource>> {
    if let Some(url) = url {
        let source = HttpSource::new(url, method, timeout)?;
        tracing::info!(source = source.name(), %url, "Using remote scorer");
        return Ok(Arc::new(source));
    }

    let source = SnapshotSource::new(method, snapshot_path);
    // A missing snapshot is not fatal; the source serves empty lists until a reload succeeds
    if let Err(e) = source.reload().await {
        tracing::warn!(source = source.name(), error = %e, "Starting without model snapshot");
    }
    Ok(Arc::new(source))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
