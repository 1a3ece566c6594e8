use anyhow::Result;
use payment_relay::{
    config::Config,
    create_router,
    handlers::{AppState, HealthState},
    middleware::with_rate_limit,
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting payment relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);
    tracing::info!("Gateway: {}", config.gateway_url);

    let state = AppState::from_config(&config)?;
    let health = HealthState::new(config.environment.clone());

    let app = create_router(state, health, config.api_credentials.clone());
    let app = with_rate_limit(app, &config.rate_limit)?;

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Payment form: POST http://{}/payment_form", addr);
    if let Some(checkout) = &config.checkout_url {
        tracing::info!("Payment URL: POST http://{}/payment_url -> {}", addr, checkout);
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down gracefully...");
}
