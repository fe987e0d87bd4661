use axum::routing::{get, post};
use axum::Router;

use crate::handlers::readings;
use crate::state::AppState;

/// Routes mounted at `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(readings::predict))
        .route("/status", get(readings::status))
        .route("/history", get(readings::history))
}
