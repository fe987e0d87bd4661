//! Fail-safe wrapper around the optional [`Classifier`] capability.

use std::sync::Arc;
use std::time::Duration;

use hydrowatch_core::classification::{ClassificationResult, Label};
use hydrowatch_core::reading::Reading;

use crate::capability::{with_timeout, Classifier};
use crate::error::CapabilityError;

const CAPABILITY: &str = "classifier";

/// Turns model output into a [`ClassificationResult`].
///
/// Any failure (no model, timeout, transport error, malformed output)
/// yields [`ClassificationResult::FAIL_SAFE`].
#[derive(Clone)]
pub struct ClassifierAdapter {
    classifier: Option<Arc<dyn Classifier>>,
    timeout: Duration,
}

impl ClassifierAdapter {
    pub fn new(classifier: Option<Arc<dyn Classifier>>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn classify(&self, reading: &Reading) -> ClassificationResult {
        let Some(classifier) = &self.classifier else {
            tracing::debug!("Classifier not loaded, using fail-safe result");
            return ClassificationResult::FAIL_SAFE;
        };

        match self.try_classify(classifier.as_ref(), reading).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = %reading.source,
                    timestamp = %reading.timestamp,
                    "Classification failed, using fail-safe result"
                );
                ClassificationResult::FAIL_SAFE
            }
        }
    }

    async fn try_classify(
        &self,
        classifier: &dyn Classifier,
        reading: &Reading,
    ) -> Result<ClassificationResult, CapabilityError> {
        let prediction = classifier.predict(reading.features());
        let raw = with_timeout(CAPABILITY, self.timeout, prediction).await?;
        let label =
            Label::from_class(raw.label).map_err(|e| CapabilityError::malformed(CAPABILITY, e))?;
        ClassificationResult::from_probabilities(label, &raw.probabilities)
            .map_err(|e| CapabilityError::malformed(CAPABILITY, e))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Local;
    use hydrowatch_core::reading::ReadingDefaults;
    use serde_json::Map;

    use super::*;
    use crate::capability::RawPrediction;

    struct Fixed(Result<RawPrediction, &'static str>);

    #[async_trait]
    impl Classifier for Fixed {
        async fn predict(&self, _features: [f64; 6]) -> Result<RawPrediction, CapabilityError> {
            self.0
                .clone()
                .map_err(|msg| CapabilityError::failed("fixed", msg))
        }
    }

    struct Echo(std::sync::Mutex<Option<[f64; 6]>>);

    #[async_trait]
    impl Classifier for Echo {
        async fn predict(&self, features: [f64; 6]) -> Result<RawPrediction, CapabilityError> {
            *self.0.lock().unwrap() = Some(features);
            Ok(RawPrediction {
                label: 1,
                probabilities: vec![0.05, 0.95],
            })
        }
    }

    fn reading() -> Reading {
        Reading::from_payload(&Map::new(), "TEST", &ReadingDefaults::default(), Local::now())
            .unwrap()
    }

    fn adapter(classifier: impl Classifier + 'static) -> ClassifierAdapter {
        ClassifierAdapter::new(Some(Arc::new(classifier)), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn missing_classifier_is_fail_safe() {
        let adapter = ClassifierAdapter::new(None, Duration::from_secs(1));
        assert!(!adapter.is_loaded());
        assert_eq!(adapter.classify(&reading()).await, ClassificationResult::FAIL_SAFE);
    }

    #[tokio::test]
    async fn features_are_passed_in_fixed_order() {
        let echo = Arc::new(Echo(std::sync::Mutex::new(None)));
        let adapter = ClassifierAdapter::new(Some(echo.clone()), Duration::from_secs(1));

        let result = adapter.classify(&reading()).await;

        assert_eq!(result.label, Label::Safe);
        assert_eq!(result.confidence, 95.0);
        assert_eq!(
            *echo.0.lock().unwrap(),
            Some([7.0, 250.0, 165.0, 500.0, 600.0, 3.0])
        );
    }

    #[tokio::test]
    async fn capability_error_is_fail_safe() {
        let adapter = adapter(Fixed(Err("model crashed")));
        assert_eq!(adapter.classify(&reading()).await, ClassificationResult::FAIL_SAFE);
    }

    #[tokio::test]
    async fn unknown_label_is_fail_safe() {
        let adapter = adapter(Fixed(Ok(RawPrediction {
            label: 3,
            probabilities: vec![0.5, 0.5],
        })));
        assert_eq!(adapter.classify(&reading()).await, ClassificationResult::FAIL_SAFE);
    }

    #[tokio::test]
    async fn empty_probabilities_are_fail_safe() {
        let adapter = adapter(Fixed(Ok(RawPrediction {
            label: 1,
            probabilities: vec![],
        })));
        assert_eq!(adapter.classify(&reading()).await, ClassificationResult::FAIL_SAFE);
    }
}
