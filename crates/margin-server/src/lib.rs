//! Margin Lens Web Server
//!
//! Axum-based JSON API that serves composed margin views to a front end.
//!
//! - Read-only: every endpoint is a GET over the configured dataset source
//! - Restrictive CORS policy unless origins are configured
//! - Sanitized error responses (internal details are logged, not returned)

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use margin_core::{DatasetSource, InsightEngine, MarginConfig};

mod handlers;

/// Comma-separated list of origins allowed to call the API
pub const ALLOWED_ORIGINS_ENV: &str = "MARGIN_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(ALLOWED_ORIGINS_ENV)
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed_origins }
    }
}

/// Shared application state
pub struct AppState {
    pub source: Arc<dyn DatasetSource>,
    /// View defaults and export settings
    pub config: MarginConfig,
    pub engine: InsightEngine,
}

/// Create the application router
pub fn create_router(
    source: Arc<dyn DatasetSource>,
    config: MarginConfig,
    server_config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        source,
        config,
        engine: InsightEngine::new(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/bands", get(handlers::list_bands))
        // Margin analysis for one period
        .route("/margin/:year/:month/view", get(handlers::get_view))
        .route(
            "/margin/:year/:month/categories",
            get(handlers::list_categories),
        )
        .route("/margin/:year/:month/export", get(handlers::export_period));

    // Build CORS layer
    let cors = if server_config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = server_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server over the configured dataset source
pub async fn serve(config: &MarginConfig, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(config, host, port, ServerConfig::from_env()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    config: &MarginConfig,
    host: &str,
    port: u16,
    server_config: ServerConfig,
) -> anyhow::Result<()> {
    let source: Arc<dyn DatasetSource> = Arc::from(config.open_source()?);
    info!(source = %source.name(), "Serving margin data");

    let app = create_router(source, config.clone(), server_config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Caller mistakes keep their message; everything else is sanitized
        match err.downcast_ref::<margin_core::Error>() {
            Some(
                core @ (margin_core::Error::InvalidPeriod(_)
                | margin_core::Error::InvalidParameter(_)),
            ) => Self::bad_request(&core.to_string()),
            Some(core @ margin_core::Error::NotFound(_)) => Self::not_found(&core.to_string()),
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err),
            },
        }
    }
}
