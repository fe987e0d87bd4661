//! Repository for the `readings` table.

use sqlx::PgPool;
use hydrowatch_core::types::DbId;

use crate::models::reading::{CreateReading, ReadingRow};

/// Column list for `readings` queries.
const READING_COLUMNS: &str = "id, reading_timestamp, ph, sulphate, hardness, conductivity, \
     tds, turbidity, prediction, confidence, source, consecutive_count, alert_sent, created_at";

/// Provides read/write operations for processed readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Insert a processed reading, returning the generated ID.
    pub async fn insert(pool: &PgPool, input: &CreateReading) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO readings \
                (reading_timestamp, ph, sulphate, hardness, conductivity, tds, turbidity, \
                 prediction, confidence, source, consecutive_count, alert_sent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING id",
        )
        .bind(&input.reading_timestamp)
        .bind(input.ph)
        .bind(input.sulphate)
        .bind(input.hardness)
        .bind(input.conductivity)
        .bind(input.tds)
        .bind(input.turbidity)
        .bind(input.prediction)
        .bind(input.confidence)
        .bind(&input.source)
        .bind(input.consecutive_count)
        .bind(input.alert_sent)
        .fetch_one(pool)
        .await
    }

    /// The `limit` most recent readings, returned oldest-first for charting.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ReadingRow>, sqlx::Error> {
        let query = format!("SELECT {READING_COLUMNS} FROM readings ORDER BY id DESC LIMIT $1");
        let mut rows = sqlx::query_as::<_, ReadingRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        rows.reverse();
        Ok(rows)
    }
}
