#![forbid(unsafe_code)]

//! HTTP inflate fallback for linkpad share tokens.
//!
//! # Role in linkpad
//! Some embedding hosts cannot decompress gzip in the page. They call this
//! service with the original token (see `linkpad_transfer::HttpFallback`)
//! and receive the raw state buffer, which they decode locally.
//!
//! # Routes
//! - `GET /api/decompress?data=<token>`: 200 with bytes, 400 for a bad or
//!   missing token, 500 when the payload will not inflate.
//! - `GET /health`: liveness.

pub mod config;
pub mod decompress;
pub mod error;

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;

/// Path of the inflate endpoint.
pub const DECOMPRESS_PATH: &str = "/api/decompress";

/// Application router with tracing and CORS layers.
pub fn build_router(config: ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route(DECOMPRESS_PATH, get(decompress::decompress))
        .route("/health", get(decompress::health))
        .with_state(Arc::new(config))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
