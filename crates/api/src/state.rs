use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hydrowatch_events::BroadcastHub;
use hydrowatch_pipeline::ReadingPipeline;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` when `DATABASE_URL` is unset.
    pub pool: Option<hydrowatch_db::DbPool>,
    /// The reading pipeline shared with the MQTT listener.
    pub pipeline: Arc<ReadingPipeline>,
    /// Whether the MQTT broker session is up.
    pub mqtt_connected: Arc<AtomicBool>,
}

impl AppState {
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        self.pipeline.hub()
    }
}
