pub mod datasets;
pub mod events;
pub mod health;
pub mod seeds;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::SizeAbove;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the service router. Every request is traced; responses above
/// the configured size are gzip-compressed.
pub fn build_router(state: AppState) -> Router {
    let compression =
        CompressionLayer::new().compress_when(SizeAbove::new(state.config.gzip_min_size));
    Router::new()
        .route("/health", get(health::health))
        .route("/save_events/", post(events::save_events))
        .route("/get_events/", get(events::get_events))
        .route("/reset_events/", delete(events::reset_events))
        .route("/datasets/generate", post(datasets::generate))
        .route("/datasets/generate-smart", post(datasets::generate_smart))
        .route("/datasets/load", get(datasets::load))
        .route("/datasets/pools", get(datasets::pools))
        .route(
            "/seeds/resolve",
            get(seeds::resolve_query).post(seeds::resolve_body),
        )
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
