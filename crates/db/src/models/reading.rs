//! Persisted reading models.

use hydrowatch_core::result::EnrichedResult;
use hydrowatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `readings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReadingRow {
    pub id: DbId,
    #[serde(rename = "timestamp")]
    pub reading_timestamp: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Sulphate")]
    pub sulphate: f64,
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    #[serde(rename = "Conductivity")]
    pub conductivity: f64,
    #[serde(rename = "TDS")]
    pub tds: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
    /// `0` unsafe, `1` safe.
    pub prediction: i16,
    pub confidence: f64,
    pub source: String,
    pub consecutive_count: i32,
    pub alert_sent: bool,
    pub created_at: Timestamp,
}

/// Insert payload for a processed reading.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReading {
    pub reading_timestamp: String,
    pub ph: f64,
    pub sulphate: f64,
    pub hardness: f64,
    pub conductivity: f64,
    pub tds: f64,
    pub turbidity: f64,
    pub prediction: i16,
    pub confidence: f64,
    pub source: String,
    pub consecutive_count: i32,
    pub alert_sent: bool,
}

impl From<&EnrichedResult> for CreateReading {
    fn from(result: &EnrichedResult) -> Self {
        let reading = &result.reading;
        Self {
            reading_timestamp: reading.timestamp.clone(),
            ph: reading.ph,
            sulphate: reading.sulphate,
            hardness: reading.hardness,
            conductivity: reading.conductivity,
            tds: reading.tds,
            turbidity: reading.turbidity,
            prediction: result.classification.label.class(),
            confidence: result.classification.confidence,
            source: reading.source.clone(),
            consecutive_count: i32::try_from(result.consecutive_count).unwrap_or(i32::MAX),
            alert_sent: result.alert_sent,
        }
    }
}
