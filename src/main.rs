use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use rentdesk::api::http::HttpTransport;
use rentdesk::api::RentalApi;
use rentdesk::config::AppConfig;
use rentdesk::handlers;
use rentdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let transport = HttpTransport::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.api_timeout_secs),
    )?;
    tracing::info!(
        "using rental API at {} (page size {}, hide disabled places: {})",
        config.api_base_url,
        config.page_size,
        config.hide_disabled_places
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        RentalApi::new(Box::new(transport)),
    ));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
