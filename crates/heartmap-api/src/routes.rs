//! Router setup with all API routes and middleware.
//!
//! The map endpoints are mounted at the root and again under the
//! `/api/v1/map` prefix the front-end uses.

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use heartmap_core::error::HeartMapError;

use crate::handlers;
use crate::state::AppState;

/// Path prefix the map front-end builds its requests on.
pub const MAP_API_PREFIX: &str = "/api/v1/map";

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .api
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Both slash forms are accepted; the front-end requests the trailing one.
    let map_routes: Router<AppState> = Router::new()
        .route("/map-data", get(handlers::map_data))
        .route("/map-data/", get(handlers::map_data))
        .route("/options", get(handlers::options))
        .route("/options/", get(handlers::options));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(map_routes.clone())
        .nest(MAP_API_PREFIX, map_routes)
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Runs until Ctrl-C is received.
pub async fn start_server(state: AppState) -> Result<(), HeartMapError> {
    let addr = format!("{}:{}", state.config.api.host, state.config.api.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeartMapError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HeartMapError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
