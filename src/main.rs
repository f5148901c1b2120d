use portfolio_analytics::analytics::AnalyticsService;
use portfolio_analytics::config::{self, AppConfig};
use portfolio_analytics::handlers;
use portfolio_analytics::storage::create_store;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_analytics=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let app_config = match config::load_config_with_fallback() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{} Using default configuration.", e);
            AppConfig::default()
        }
    };

    let store = create_store(&app_config.storage)?;
    let service = Arc::new(AnalyticsService::with_system_clock(
        store,
        app_config.analytics.clone(),
    ));

    let app = handlers::router(service);

    let addr = app_config.bind_address();
    tracing::info!("Starting portfolio analytics on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
