use axum::{Router, http::Request, routing::get};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::AppState;

pub mod columns;
pub mod health;
pub mod images;
pub mod tasks;
pub mod types;

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let api = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(columns::router())
        .merge(tasks::router(&state));

    Router::<AppState>::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .with_state(state)
}
