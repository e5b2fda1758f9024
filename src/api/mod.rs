//! REST API server module
//!
//! Provides the HTTP surface for submitting download tasks and polling
//! their state, backed by a [`DownloadManager`].

use crate::{Config, DownloadManager, Result};
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `GET /get-tasks` - List running and finished tasks
/// - `GET /get-tasks/running` - List running tasks only
/// - `GET /get-tasks/finished` - List finished tasks only
/// - `GET /get-tasks/:id` - Get a single task by id
/// - `POST /add-task` - Submit a URL for download
/// - `GET /remove-finished` - Clear all finished tasks
/// - `GET /remove-finished/failed` - Clear unsuccessful finished tasks
/// - `GET /remove-finished/:id` - Remove one finished task by id
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
///
/// Every response carries permissive CORS headers, and `OPTIONS` on any
/// path answers 200 with no body. Anything outside the table above —
/// unknown paths and wrong methods on known paths alike — answers 404
/// `Not Found`; a panicking handler answers 500 with the panic message.
pub fn create_router(manager: Arc<DownloadManager>, config: Arc<Config>) -> Router {
    let state = AppState { manager, config };

    // A wrong method on a known path is just another unmatched route: the
    // per-route fallback answers it 404 "Not Found" instead of axum's 405.
    let router = Router::new()
        // Tasks
        .route(
            "/get-tasks",
            get(routes::list_tasks)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/get-tasks/running",
            get(routes::list_running)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/get-tasks/finished",
            get(routes::list_finished)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/get-tasks/:id",
            get(routes::get_task)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/add-task",
            post(routes::submit_task)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/remove-finished",
            get(routes::clear_finished)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/remove-finished/failed",
            get(routes::clear_failed)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/remove-finished/:id",
            get(routes::remove_finished_by_id)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        // System
        .route(
            "/health",
            get(routes::health_check)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/openapi.json",
            get(routes::openapi_spec)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        .route(
            "/events",
            get(routes::event_stream)
                .options(routes::preflight)
                .fallback(routes::not_found),
        )
        // Unmatched paths: 200 for bare OPTIONS, 404 "Not Found" otherwise
        .fallback(routes::not_found);

    // Add state to all routes
    let router = router.with_state(state);

    // Middleware layer ordering: in Axum's onion model, the LAST layer applied
    // is the OUTERMOST (runs first on requests). We want:
    //   Request → CORS → Trace → CatchPanic → Handler
    // so CORS headers are attached even to panic responses.
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

/// Build the permissive CORS layer applied to every response
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Convert a handler panic into a 500 response carrying the panic message
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(error = %detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Server Error: {detail}"),
    )
        .into_response()
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves
/// the API router until the manager's shutdown token is cancelled.
///
/// # Arguments
///
/// * `manager` - Arc-wrapped DownloadManager instance to handle API requests
/// * `config` - Arc-wrapped Config containing the bind address
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vod_dl::{Config, DownloadManager};
///
/// # async fn example(resolver: Arc<dyn vod_dl::UrlResolver>, fetcher: Arc<dyn vod_dl::MediaFetcher>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let manager = Arc::new(
///     DownloadManager::new((*config).clone(), resolver, fetcher).await?,
/// );
///
/// // Serve until the manager shuts down
/// vod_dl::api::start_api_server(manager, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(manager: Arc<DownloadManager>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let shutdown_token = manager.shutdown_token();

    // Create the router with all routes
    let app = create_router(manager, config);

    // Bind TCP listener to the configured address
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await
        .map_err(|e| crate::error::Error::ApiServer(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
