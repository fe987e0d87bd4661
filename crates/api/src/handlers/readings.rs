//! Handlers for reading ingestion, pipeline status, and history.

use std::sync::atomic::Ordering;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use hydrowatch_core::result::EnrichedResult;
use hydrowatch_db::models::reading::ReadingRow;
use hydrowatch_db::repositories::ReadingRepo;
use hydrowatch_pipeline::PipelineStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Source tag for readings submitted over HTTP.
pub const API_SOURCE: &str = "API";

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// POST /api/v1/predict -- run one reading through the pipeline.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<EnrichedResult>>> {
    let Json(body) = body?;
    let Value::Object(payload) = body else {
        return Err(AppError::BadRequest(
            "reading must be a JSON object".to_string(),
        ));
    };
    let result = state.pipeline.process(&payload, API_SOURCE).await?;
    Ok(Json(DataResponse { data: result }))
}

/// Pipeline status plus transport-level health.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub pipeline: PipelineStatus,
    pub mqtt_connected: bool,
    pub database_enabled: bool,
    pub observers: usize,
}

/// GET /api/v1/status
pub async fn status(State(state): State<AppState>) -> Json<DataResponse<StatusResponse>> {
    Json(DataResponse {
        data: StatusResponse {
            pipeline: state.pipeline.status(),
            mqtt_connected: state.mqtt_connected.load(Ordering::SeqCst),
            database_enabled: state.pool.is_some(),
            observers: state.hub().observer_count(),
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/history?limit=N -- most recent readings, oldest first.
pub async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<ReadingRow>>>> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }

    let Some(pool) = &state.pool else {
        return Ok(Json(DataResponse { data: Vec::new() }));
    };
    let rows = ReadingRepo::list_recent(pool, limit).await?;
    Ok(Json(DataResponse { data: rows }))
}
