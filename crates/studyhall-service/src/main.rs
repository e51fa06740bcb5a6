//! StudyHall Service - HTTP and WebSocket API for credits, video sessions and signaling
//!
//! This is the main entry point for the studyhall service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyhall_service::{create_router, AppState, ServiceConfig};
use studyhall_store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studyhall=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StudyHall Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        starting_credits = %config.starting_credits,
        video_session_cost = %config.video_session_cost,
        stripe_configured = %config.stripe_api_key.is_some(),
        "Service configuration loaded"
    );

    // The reference store is memory-resident
    let store = Arc::new(MemoryStore::new(config.starting_credits));

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
