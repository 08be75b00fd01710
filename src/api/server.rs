//! Rowcast API server implementation
//!
//! HTTP REST server using Axum. Receives spreadsheet uploads, serves the
//! imported rows and the current selection to overlay clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::excel::MAX_UPLOAD_SIZE;
use crate::store::RowStore;

use super::handlers;

/// Headroom for multipart boundaries and form fields on top of the file cap.
const UPLOAD_ENVELOPE_SLACK: usize = 64 * 1024;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Restrict CORS to one origin; `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: None,
        }
    }
}

/// Shared application state, injected into every handler.
///
/// The row store lives here rather than in a process-wide global so tests can
/// run against a fresh instance.
pub struct AppState {
    pub version: String,
    pub store: RowStore,
    pub started_at: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: RowStore::new(),
            started_at: Instant::now(),
        }
    }
}

/// Build the application router.
///
/// Separated from [`run_api_server`] so tests can drive the full HTTP surface
/// in-process without binding a socket.
pub fn build_router(state: Arc<AppState>, config: &ApiConfig) -> anyhow::Result<Router> {
    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let router = Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Core API endpoints
        .route("/api/v1/elements", get(handlers::elements))
        .route("/api/v1/upload", post(handlers::upload))
        .route("/api/v1/element/select/:id", put(handlers::select_element))
        .route("/api/v1/element/selected", get(handlers::selected_element))
        .route("/api/v1/status", get(handlers::status))
        .route("/api/v1/reset", delete(handlers::reset))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + UPLOAD_ENVELOPE_SLACK))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rowcast=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new());
    let app = build_router(state, &config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Rowcast server starting on http://{}", addr);
    info!("   Upload: POST /api/v1/upload (multipart field 'excel')");
    info!("   Overlay feed: GET /api/v1/element/selected");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Rowcast server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn test_config_custom_values() {
        let config = ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origin: Some("http://localhost:4200".to_string()),
        };
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:4200"));
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
            cors_origin: None,
        };
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_app_state_starts_empty() {
        let state = AppState::new();
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert!(state.store.list().is_empty());
    }

    #[test]
    fn test_app_state_in_arc() {
        let state = Arc::new(AppState::new());
        let state_clone = Arc::clone(&state);
        assert_eq!(state.version, state_clone.version);
        assert_eq!(Arc::strong_count(&state), 2);
    }

    #[test]
    fn test_build_router_accepts_cors_origin() {
        let config = ApiConfig {
            cors_origin: Some("http://localhost:4200".to_string()),
            ..ApiConfig::default()
        };
        assert!(build_router(Arc::new(AppState::new()), &config).is_ok());
    }

    #[test]
    fn test_build_router_rejects_bad_cors_origin() {
        let config = ApiConfig {
            cors_origin: Some("not a header\nvalue".to_string()),
            ..ApiConfig::default()
        };
        assert!(build_router(Arc::new(AppState::new()), &config).is_err());
    }
}
