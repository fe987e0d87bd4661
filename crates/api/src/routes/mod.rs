pub mod health;
pub mod readings;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                 WebSocket observer stream
///
/// /predict            ingest one reading (POST)
/// /status             pipeline and broker status
/// /history            recent persisted readings
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(readings::router())
}
