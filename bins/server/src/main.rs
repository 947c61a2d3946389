//! Ferrobank API Server
//!
//! Main entry point for the Ferrobank backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ferrobank_api::{AppState, create_router};
use ferrobank_core::token::{JwtMaker, LocalMaker, TokenMaker};
use ferrobank_db::connect;
use ferrobank_shared::{AppConfig, TokenVariant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ferrobank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    // Construct the configured token maker. A key shorter than 32 bytes is
    // fatal here, before any token can ever be issued.
    let key = config.auth.symmetric_key.as_bytes();
    let token_maker: Arc<dyn TokenMaker> = match config.auth.token_variant {
        TokenVariant::Jwt => Arc::new(JwtMaker::new(key)?),
        TokenVariant::Local => Arc::new(LocalMaker::new(key)?),
    };
    info!(variant = ?config.auth.token_variant, "Token maker configured");

    #[allow(clippy::cast_possible_wrap)]
    let token_duration = chrono::Duration::seconds(config.auth.access_token_expiry_secs as i64);

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        token_maker,
        token_duration,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
