//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use bandstand_app::ports::Repositories;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API and the WebSocket endpoint under `/api` next to an
/// unauthenticated `/health` check. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<P: Repositories>(state: AppState<P>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
