// ABOUTME: HTTP surface for the video feed: router construction and handler state.
// ABOUTME: The binary in main.rs wires configuration, logging, and the listener.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, SourceConfig};
pub use error::AppError;
pub use state::AppState;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/feed", get(routes::get_feed).post(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
