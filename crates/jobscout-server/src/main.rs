use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscout_client::{ReqwestFetcher, ScraperExtractor};
use jobscout_core::cache::MokaCacheStore;
use jobscout_core::config::ScrapeConfig;
use jobscout_core::scrape::ScrapeService;
use jobscout_server::routes;
use jobscout_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .init();

    let port = std::env::var("JOBSCOUT_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let config = ScrapeConfig::from_env()?;
    let state = Arc::new(build_state(config).await?);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wire the orchestrator with the fetch backend named by `JOBSCOUT_FETCHER`.
async fn build_state(config: ScrapeConfig) -> anyhow::Result<AppState> {
    let cache = MokaCacheStore::new(config.cache_capacity);
    let extractor = ScraperExtractor::new();
    let backend = std::env::var("JOBSCOUT_FETCHER").unwrap_or_else(|_| "http".to_string());

    tracing::info!(
        fetcher = %backend,
        concurrency = config.concurrency,
        max_cards = config.max_cards,
        proxy = config.proxy.is_some(),
        "Configuring search service"
    );

    match backend.as_str() {
        "http" => {
            let fetcher = ReqwestFetcher::new(config.proxy.as_ref())?;
            Ok(AppState::new(ScrapeService::new(fetcher, extractor, cache, config)))
        }
        #[cfg(feature = "browser")]
        "browser" => {
            let fetcher = jobscout_client::BrowserFetcher::launch(config.proxy.as_ref()).await?;
            Ok(AppState::new(ScrapeService::new(fetcher, extractor, cache, config)))
        }
        #[cfg(not(feature = "browser"))]
        "browser" => anyhow::bail!("JOBSCOUT_FETCHER=browser requires the `browser` feature"),
        other => anyhow::bail!("Unknown JOBSCOUT_FETCHER '{other}' (expected http or browser)"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
