mod config;
mod error;
mod gate;
mod handlers;
mod models;
mod storage;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use config::Config;
use gate::UploadGate;
use handlers::AppState;
use std::net::SocketAddr;
use storage::create_storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Extra room for multipart framing on top of the payload cap.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload_gateway=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting upload gateway");
    tracing::info!("Storage type: {:?}", config.storage_type);
    tracing::info!("Target bucket: {}", config.bucket);

    // Initialize storage and refuse to start if it is unreachable
    let storage = create_storage(&config).await?;
    storage
        .verify_connectivity()
        .await
        .map_err(|e| anyhow::anyhow!("Storage connectivity check failed: {:#}", e))?;
    tracing::info!("Storage connectivity verified");

    // Build application state
    let state = AppState {
        gate: UploadGate::new(storage, &config),
    };

    // Build our application with routes
    let app = Router::new()
        .route("/api/upload", post(handlers::upload_file))
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes as usize + BODY_LIMIT_SLACK,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
