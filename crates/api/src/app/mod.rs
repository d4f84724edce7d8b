//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: builds the `SyncService` from process configuration
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockbridge_infra::SyncService;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router around an already-wired service.
pub fn build_app(services: Arc<SyncService>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
