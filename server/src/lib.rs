//! HTTP API for issuing and redeeming keyledger license keys.

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use keyledger_license::KeyRegistry;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use api::{
    ErrorResponse, GenerateKeyRequest, GenerateKeyResponse, HealthResponse, UseKeyRequest,
    UseKeyResponse,
};
pub use config::ServerConfig;
pub use error::ApiError;

/// Build the HTTP API router around the given registry.
pub fn build_router(registry: Arc<KeyRegistry>) -> Router {
    Router::new()
        .route("/api/generate-key", post(api::generate_key))
        .route("/api/use-key", post(api::use_key))
        .route("/health", get(api::health))
        .with_state(registry)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
