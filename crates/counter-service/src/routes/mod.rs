//! HTTP routes for the counter service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{CounterService, RoomDirectory, RoomFactory, TokenIssuer};
use axum::{
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Upstream room directory.
    pub directory: Arc<dyn RoomDirectory>,

    /// Counter protocol over `directory`.
    pub counter: Arc<CounterService>,

    /// Join token signing.
    pub tokens: TokenIssuer,

    /// Room and guest name generation.
    pub rooms: Arc<RoomFactory>,
}

impl AppState {
    pub fn new(config: Config, directory: Arc<dyn RoomDirectory>) -> Self {
        let counter = CounterService::new(
            Arc::clone(&directory),
            Duration::from_millis(config.lock_wait_timeout_ms),
        );
        let tokens = TokenIssuer::from_config(&config);

        Self {
            config,
            directory,
            counter: Arc::new(counter),
            tokens,
            rooms: Arc::new(RoomFactory::new()),
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `GET /` - Greeting
/// - `POST /create-room` - Create a room and issue a join token
/// - `POST /counter-increment` - Increment a room's counter
/// - `GET /metrics` - Prometheus metrics
/// - Permissive CORS, request tracing, 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/create-room", post(handlers::create_room))
        .route("/counter-increment", post(handlers::counter_increment))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Layer order (outermost last):
    // 1. TraceLayer - Log request details
    // 2. TimeoutLayer - Bound total request time
    // 3. CorsLayer - Answer preflights, decorate responses
    // 4. HTTP metrics - Record every response, including 404/405 and preflights
    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}
