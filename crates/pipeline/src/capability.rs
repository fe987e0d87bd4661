//! Seams to the external collaborators the pipeline depends on.
//!
//! Each capability is optional at runtime; the pipeline holds them as
//! `Option<Arc<dyn Trait>>` and degrades when one is missing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use hydrowatch_core::result::EnrichedResult;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Raw model output: class index plus per-class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// `0` unsafe, `1` safe.
    pub label: i64,
    pub probabilities: Vec<f64>,
}

/// A water-quality model.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Predict from features ordered pH, Sulphate, Hardness, Conductivity,
    /// TDS, Turbidity.
    async fn predict(&self, features: [f64; 6]) -> Result<RawPrediction, CapabilityError>;
}

/// Outbound alert transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str, recipient: &str)
        -> Result<(), CapabilityError>;
}

/// Durable sink for processed readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn persist(&self, result: &EnrichedResult) -> Result<(), CapabilityError>;
}

/// Run a capability call, treating an elapsed `timeout` as failure.
pub async fn with_timeout<T, F>(
    capability: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| CapabilityError::Timeout {
            capability,
            timeout,
        })?
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn elapsed_call_becomes_timeout_error() {
        let result: Result<(), _> = with_timeout("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_matches!(
            result,
            Err(CapabilityError::Timeout {
                capability: "slow",
                ..
            })
        );
    }

    #[tokio::test]
    async fn inner_error_is_passed_through() {
        let result: Result<(), _> = with_timeout("broken", Duration::from_secs(1), async {
            Err(CapabilityError::failed("broken", "boom"))
        })
        .await;
        assert_matches!(result, Err(CapabilityError::Failed { message, .. }) if message == "boom");
    }

    #[test]
    fn raw_prediction_decodes_model_service_json() {
        let raw: RawPrediction =
            serde_json::from_str(r#"{"label": 1, "probabilities": [0.2, 0.8]}"#).unwrap();
        assert_eq!(raw.label, 1);
        assert_eq!(raw.probabilities, vec![0.2, 0.8]);
    }
}
