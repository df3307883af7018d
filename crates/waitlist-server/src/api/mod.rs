//! HTTP API for the waitlist.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::waitlist::WaitlistService;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: WaitlistService,
}

impl AppState {
    pub fn new(service: WaitlistService) -> Self {
        Self { service }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/waitlist", post(handlers::join_json))
        .route("/v1/waitlist/form", post(handlers::join_form))
        .route("/v1/waitlist/recent", get(handlers::recent))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::new().level(Level::WARN)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
