//! antiphish service entry point.
//!
//! Wires configuration, storage, the scoring engine, and the HTTP API
//! together, and runs the periodic session-cleanup task.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use antiphish::config::AppConfig;
use antiphish::database::Database;
use antiphish::error::Result;
use antiphish::session::SessionManager;
use antiphish::web;

/// Spawn background tasks for periodic operations.
fn spawn_background_tasks(session_manager: Arc<SessionManager>) {
    // Session cleanup task (runs every hour)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match session_manager.cleanup_expired().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count = count, "Cleaned up expired sessions");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to cleanup sessions");
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing with configurable log levels
    // Supports RUST_LOG environment variable with levels: trace, debug, info, warn, error
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        built_at = option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        "antiphish starting..."
    );

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");

    let db = Arc::new(Database::new(&config.database_path).await?);
    tracing::info!(path = %config.database_path, "Database initialized");

    let state = web::build_state(db, &config)?;
    tracing::info!(
        aggregation = ?config.detection.url_aggregation,
        keywords = config.detection.vietnamese_keywords.len()
            + config.detection.english_keywords.len(),
        "Scoring engine initialized"
    );

    spawn_background_tasks(state.sessions.clone());

    let app = web::build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        antiphish::error::AntiphishError::Io(format!("Failed to bind {}: {}", addr, e))
    })?;

    tracing::info!(addr = %addr, "HTTP server listening");
    axum::serve(listener, app).await.map_err(|e| {
        antiphish::error::AntiphishError::Io(format!("HTTP server failed: {}", e))
    })?;

    Ok(())
}
