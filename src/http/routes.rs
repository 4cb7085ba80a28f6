//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler));

    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    if !state.config.client_origins.is_empty() {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origins
            .iter()
            .filter_map(|s| s.parse::<header::HeaderValue>().ok())
            .collect();

        router = router.layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::OPTIONS]),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_games: usize,
    connected_players: usize,
    queue_size: usize,
}

async fn health_handler(State(state): State<AppState>) -> Response {
    match state.lobby.stats().await {
        Some(stats) => Json(HealthResponse {
            status: "ok",
            uptime_secs: uptime_secs(),
            active_games: stats.active_games,
            connected_players: stats.connected_players,
            queue_size: stats.queue_size,
        })
        .into_response(),
        None => {
            warn!("Health check: lobby task unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "lobby unavailable").into_response()
        }
    }
}
